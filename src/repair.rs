//! Identifier collision repair for a persisted sheet collection.
//!
//! Older snapshots could hold the same id twice (two sheets, two columns, or a
//! row in one sheet sharing an id with a column in another). Every id in the
//! collection shares a single namespace. When anything collides, every id in
//! every sheet is regenerated and cell keys are remapped through each sheet's
//! old → new column map.

use std::collections::HashSet;

use log::{info, warn};

use crate::model::Sheet;

fn all_ids(sheet: &Sheet) -> impl Iterator<Item = &str> {
    std::iter::once(sheet.id())
        .chain(sheet.columns().iter().map(|c| c.id()))
        .chain(sheet.rows().iter().map(|r| r.id()))
}

/// Number of ids that repeat an id seen earlier in the collection.
pub fn count_collisions(sheets: &[Sheet]) -> usize {
    let mut seen = HashSet::new();
    sheets
        .iter()
        .flat_map(all_ids)
        .filter(|id| !seen.insert(*id))
        .count()
}

/// Returns the input unchanged when every id is unique. Otherwise each sheet is
/// reissued with fresh ids and a later `updated_at`. Running it twice is the
/// same as running it once.
pub fn repair_collisions(sheets: Vec<Sheet>) -> Vec<Sheet> {
    let collisions = count_collisions(&sheets);
    if collisions == 0 {
        return sheets;
    }
    warn!(
        "Found {} duplicate id(s) across {} sheet(s); regenerating all ids",
        collisions,
        sheets.len()
    );
    let repaired = sheets
        .iter()
        .map(|sheet| sheet.reissued().touched(sheet.updated_at()))
        .collect::<Vec<_>>();
    info!("Repaired {} sheet(s)", repaired.len());
    repaired
}
