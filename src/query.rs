//! Search, select filters, and sorting over a sheet's rows.
//!
//! [`apply_query`] never touches the sheet; it returns borrowed rows in view
//! order. Stages run in a fixed order: free-text search, then exact select
//! filters, then the optional single-column sort.

use std::{cmp::Ordering, collections::BTreeMap, fmt, str::FromStr};

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::{
    data::CellValue,
    model::{Column, Row, Sheet},
};

const TURKISH_ALPHABET: &str = "abcçdefgğhıijklmnoöpqrsştuüvwxyz";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn is_ascending(self) -> bool {
        matches!(self, SortDirection::Asc)
    }

    pub fn reversed(self) -> SortDirection {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(anyhow!("Unknown sort direction '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column_id: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(column_id: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column_id: column_id.into(),
            direction,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub search: String,
    /// Column id → required value. `None` or an empty value disables the filter.
    pub filters: BTreeMap<String, Option<String>>,
    pub sort: Option<SortKey>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    pub fn filter(mut self, column_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(column_id.into(), Some(value.into()));
        self
    }

    pub fn sort_by(mut self, column_id: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(SortKey::new(column_id, direction));
        self
    }

    /// Header-click behaviour: the current sort column flips direction, any
    /// other column starts ascending.
    pub fn toggle_sort(&self, column_id: &str) -> Query {
        let sort = match &self.sort {
            Some(key) if key.column_id == column_id => {
                SortKey::new(column_id, key.direction.reversed())
            }
            _ => SortKey::new(column_id, SortDirection::Asc),
        };
        Query {
            sort: Some(sort),
            ..self.clone()
        }
    }

    /// True when the search or any select filter narrows the rows.
    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty() || self.active_filters().next().is_some()
    }

    fn active_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters.iter().filter_map(|(column_id, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (column_id.as_str(), v))
        })
    }
}

pub fn apply_query<'a>(sheet: &'a Sheet, query: &Query) -> Vec<&'a Row> {
    let mut rows = sheet.rows().iter().collect::<Vec<_>>();

    let needle = search_key(query.search.trim());
    if !needle.is_empty() {
        rows.retain(|row| {
            sheet
                .columns()
                .iter()
                .any(|column| search_key(&cell_text(row, column)).contains(&needle))
        });
    }

    for (column_id, required) in query.active_filters() {
        rows.retain(|row| stringified(row, sheet.column(column_id), column_id) == required);
    }

    if let Some(key) = &query.sort
        && let Some(column) = sheet.column(&key.column_id)
    {
        rows.sort_by(|a, b| {
            let ordering = compare_cells(&cell_or_default(a, column), &cell_or_default(b, column));
            if key.direction.is_ascending() {
                ordering
            } else {
                ordering.reverse()
            }
        });
    }

    rows
}

fn cell_or_default(row: &Row, column: &Column) -> CellValue {
    row.cell(column.id())
        .cloned()
        .unwrap_or_else(|| column.default_cell())
}

fn cell_text(row: &Row, column: &Column) -> String {
    cell_or_default(row, column).as_display()
}

fn stringified(row: &Row, column: Option<&Column>, column_id: &str) -> String {
    match column {
        Some(column) => cell_text(row, column),
        None => row
            .cell(column_id)
            .map(CellValue::as_display)
            .unwrap_or_default(),
    }
}

/// Numbers compare numerically; anything else compares as text under
/// [`collate`].
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.total_cmp(y),
        _ => collate(&a.as_display(), &b.as_display()),
    }
}

/// Turkish-aware string ordering: case-insensitive alphabet order first
/// (`c < ç < d`, `ı < i`), then lowercase before uppercase, then code points.
pub fn collate(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .map(primary_weight)
        .cmp(b.chars().map(primary_weight));
    primary
        .then_with(|| a.chars().map(is_upper).cmp(b.chars().map(is_upper)))
        .then_with(|| a.cmp(b))
}

fn is_upper(ch: char) -> bool {
    ch.is_uppercase()
}

fn fold_turkish(ch: char) -> char {
    match ch {
        'I' => 'ı',
        'İ' => 'i',
        other => other.to_lowercase().next().unwrap_or(other),
    }
}

/// Case-folded form for substring search. Dotted and dotless `i` in either
/// case all fold to `i`.
fn search_key(text: &str) -> String {
    text.chars()
        .map(|ch| match fold_turkish(ch) {
            'ı' => 'i',
            folded => folded,
        })
        .collect()
}

/// (class, weight): whitespace and punctuation, then digits, then letters in
/// Turkish alphabet order, then every other letter by code point.
fn primary_weight(ch: char) -> (u8, u32) {
    let folded = fold_turkish(ch);
    if let Some(position) = TURKISH_ALPHABET.chars().position(|c| c == folded) {
        return (2, position as u32);
    }
    if folded.is_ascii_digit() {
        return (1, folded as u32);
    }
    if folded.is_alphabetic() {
        return (3, folded as u32);
    }
    (0, folded as u32)
}
