//! Persistence port for the sheet collection.
//!
//! The whole collection is stored as one JSON snapshot under a single key.
//! Loading never fails: a missing, empty, or unreadable snapshot is an empty
//! collection, and a sheet that does not decode is skipped on its own. Every
//! load runs the id collision repair and re-normalizes each sheet.

use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use log::{debug, warn};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::{model::Sheet, repair::repair_collisions};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key-value backend holding the raw snapshot text.
pub trait SnapshotStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>, StoreError>;
    fn write(&self, snapshot: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new(snapshot: Option<String>) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> Option<String> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.snapshot())
    }

    fn write(&self, snapshot: &str) -> Result<(), StoreError> {
        *self
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot.to_string());
        Ok(())
    }
}

/// A JSON file on disk. A missing file reads as an empty store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, snapshot: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, snapshot)?;
        Ok(())
    }
}

pub fn load_sheets(store: &dyn SnapshotStore) -> Vec<Sheet> {
    let text = match store.read() {
        Ok(Some(text)) if !text.trim().is_empty() => text,
        Ok(_) => {
            debug!("Snapshot is empty");
            return Vec::new();
        }
        Err(err) => {
            warn!("Could not read snapshot: {err}");
            return Vec::new();
        }
    };
    let entries = match serde_json::from_str::<Vec<JsonValue>>(&text) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Snapshot is not a JSON array of sheets: {err}");
            return Vec::new();
        }
    };

    let total = entries.len();
    let decoded = entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| match serde_json::from_value::<Sheet>(entry) {
            Ok(sheet) => Some(sheet),
            Err(err) => {
                warn!("Skipping sheet #{} in snapshot: {err}", idx + 1);
                None
            }
        })
        .collect::<Vec<_>>();

    let sheets = repair_collisions(decoded)
        .into_iter()
        .filter_map(Sheet::normalized)
        .collect::<Vec<_>>();
    debug!("Loaded {} of {} sheet(s)", sheets.len(), total);
    sheets
}

pub fn save_sheets(store: &dyn SnapshotStore, sheets: &[Sheet]) -> Result<(), StoreError> {
    let snapshot = serde_json::to_string_pretty(sheets)?;
    store.write(&snapshot)
}

/// Replaces the sheet with the same id, or appends it.
pub fn upsert_sheet(sheets: &[Sheet], sheet: Sheet) -> Vec<Sheet> {
    let mut next = sheets.to_vec();
    match next.iter_mut().find(|s| s.id() == sheet.id()) {
        Some(slot) => *slot = sheet,
        None => next.push(sheet),
    }
    next
}

pub fn remove_sheet(sheets: &[Sheet], sheet_id: &str) -> Vec<Sheet> {
    sheets
        .iter()
        .filter(|s| s.id() != sheet_id)
        .cloned()
        .collect()
}

/// Looks a sheet up by id first, then by case-insensitive name.
pub fn find_sheet<'a>(sheets: &'a [Sheet], key: &str) -> Option<&'a Sheet> {
    let key = key.trim();
    sheets.iter().find(|s| s.id() == key).or_else(|| {
        let lowered = key.to_lowercase();
        sheets.iter().find(|s| s.name().to_lowercase() == lowered)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::CellValue,
        model::{Column, SheetColor},
    };

    fn sheet(name: &str) -> Sheet {
        Sheet::new(name, SheetColor::Teal, vec![Column::text("Ad")])
            .unwrap()
            .add_row()
    }

    #[test]
    fn missing_and_malformed_snapshots_load_as_empty() {
        assert!(load_sheets(&MemoryStore::default()).is_empty());
        assert!(load_sheets(&MemoryStore::new(Some("  ".into()))).is_empty());
        assert!(load_sheets(&MemoryStore::new(Some("{nope".into()))).is_empty());
        assert!(load_sheets(&MemoryStore::new(Some("{\"a\":1}".into()))).is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemoryStore::default();
        let sheets = vec![sheet("A"), sheet("B")];
        save_sheets(&store, &sheets).unwrap();
        assert_eq!(load_sheets(&store), sheets);
    }

    #[test]
    fn one_bad_sheet_does_not_hide_the_others() {
        let good = serde_json::to_value(sheet("A")).unwrap();
        let snapshot = serde_json::json!([good, {"id": 3}]).to_string();
        let loaded = load_sheets(&MemoryStore::new(Some(snapshot)));
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name(), "A");
    }

    #[test]
    fn sheets_without_columns_are_dropped() {
        let mut value = serde_json::to_value(sheet("A")).unwrap();
        value["columns"] = serde_json::json!([]);
        let snapshot = serde_json::json!([value]).to_string();
        assert!(load_sheets(&MemoryStore::new(Some(snapshot))).is_empty());
    }

    #[test]
    fn stored_values_outside_select_options_survive_loading() {
        let sheet = Sheet::new(
            "Durumlar",
            SheetColor::Teal,
            vec![Column::select("Durum", &["A", "B"]), Column::number("Adet")],
        )
        .unwrap()
        .add_row();
        let mut value = serde_json::to_value(&sheet).unwrap();
        let durum = sheet.columns()[0].id().to_string();
        let adet = sheet.columns()[1].id().to_string();
        value["rows"][0]["cells"][&durum] = "Eski".into();
        value["rows"][0]["cells"][&adet] = "12,5".into();
        let snapshot = serde_json::json!([value]).to_string();

        let loaded = load_sheets(&MemoryStore::new(Some(snapshot)));
        let row = &loaded[0].rows()[0];
        assert_eq!(row.cell(&durum), Some(&CellValue::text("Eski")));
        assert_eq!(row.cell(&adet), Some(&CellValue::Number(12.5)));

        let row_id = row.id().to_string();
        assert_eq!(loaded[0].set_cell(&row_id, &durum, "Yeni"), loaded[0]);
    }

    #[test]
    fn file_store_treats_missing_file_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("sheets.json"));
        assert_eq!(store.read().unwrap(), None);
        save_sheets(&store, &[sheet("A")]).unwrap();
        assert_eq!(load_sheets(&store).len(), 1);
    }

    #[test]
    fn collection_helpers_work_by_id_and_name() {
        let a = sheet("Alpha");
        let b = sheet("Beta");
        let sheets = vec![a.clone(), b.clone()];
        assert_eq!(find_sheet(&sheets, "beta").map(Sheet::id), Some(b.id()));
        assert_eq!(find_sheet(&sheets, a.id()).map(Sheet::name), Some("Alpha"));

        let renamed = a.rename("Alfa");
        let updated = upsert_sheet(&sheets, renamed);
        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0].name(), "Alfa");

        let removed = remove_sheet(&updated, b.id());
        assert_eq!(removed.len(), 1);
    }
}
