//! Column type inference for imported CSV text.
//!
//! Each column is decided independently from its non-blank values:
//!
//! 1. every value numeric (comma decimals allowed) → `number`;
//! 2. every value date-shaped → `date`;
//! 3. few distinct values relative to the row count → `select`;
//! 4. otherwise `text`. A column with no values at all stays `text`.
//!
//! The `select` thresholds are carried in [`InferenceOptions`] so callers and
//! the config file can tune them.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    data::{looks_like_date, parse_number},
    model::ColumnType,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceOptions {
    /// Upper bound on distinct values for a `select` column.
    pub max_select_options: usize,
    /// Distinct values must stay below `row_count * select_ratio`.
    pub select_ratio: f64,
    /// Below this many rows the ratio test is skipped and only
    /// `max_select_options` applies.
    pub ratio_min_rows: usize,
    /// Whether the first column of a multi-column import may become `select`
    /// when the ratio test is skipped. With enough rows it is judged like any
    /// other column.
    pub label_column_select: bool,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            max_select_options: 6,
            select_ratio: 0.5,
            ratio_min_rows: 3,
            label_column_select: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InferredColumn {
    pub column_type: ColumnType,
    pub options: Option<Vec<String>>,
}

impl InferredColumn {
    fn plain(column_type: ColumnType) -> Self {
        Self {
            column_type,
            options: None,
        }
    }
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    non_blank: usize,
    possible_number: bool,
    possible_date: bool,
    distinct: Vec<String>,
    seen: HashSet<String>,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            non_blank: 0,
            possible_number: true,
            possible_date: true,
            distinct: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn update(&mut self, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return;
        }
        self.non_blank += 1;
        if self.possible_number && parse_number(trimmed).is_none() {
            self.possible_number = false;
        }
        if self.possible_date && !looks_like_date(trimmed) {
            self.possible_date = false;
        }
        if self.seen.insert(trimmed.to_string()) {
            self.distinct.push(trimmed.to_string());
        }
    }

    fn decide(
        self,
        row_count: usize,
        is_label_column: bool,
        options: &InferenceOptions,
    ) -> InferredColumn {
        if self.non_blank == 0 {
            return InferredColumn::plain(ColumnType::Text);
        }
        if self.possible_number {
            return InferredColumn::plain(ColumnType::Number);
        }
        if self.possible_date {
            return InferredColumn::plain(ColumnType::Date);
        }
        let distinct = self.distinct.len();
        let within_cap = distinct <= options.max_select_options;
        let small_sample = row_count < options.ratio_min_rows;
        let within_ratio =
            small_sample || (distinct as f64) < row_count as f64 * options.select_ratio;
        let label_allowed = !small_sample || options.label_column_select || !is_label_column;
        if within_cap && within_ratio && label_allowed {
            InferredColumn {
                column_type: ColumnType::Select,
                options: Some(self.distinct),
            }
        } else {
            InferredColumn::plain(ColumnType::Text)
        }
    }
}

/// Infers one [`InferredColumn`] per header from the raw data rows. Rows
/// shorter than the header count are treated as blank in the missing fields.
pub fn infer_column_types(
    column_count: usize,
    rows: &[Vec<String>],
    options: &InferenceOptions,
) -> Vec<InferredColumn> {
    let mut candidates = vec![TypeCandidate::new(); column_count];
    for row in rows {
        for (candidate, value) in candidates.iter_mut().zip(row.iter()) {
            candidate.update(value);
        }
    }
    candidates
        .into_iter()
        .enumerate()
        .map(|(idx, candidate)| {
            let is_label_column = idx == 0 && column_count > 1;
            let inferred = candidate.decide(rows.len(), is_label_column, options);
            debug!("Column {} inferred as {}", idx + 1, inferred.column_type);
            inferred
        })
        .collect()
}
