//! Column aggregates over a set of rows.
//!
//! Only cells that actually hold a number take part. A column with no numeric
//! cell aggregates to `0` for every function, so a footer never shows a gap.

use serde::Serialize;

use crate::model::{AggFunc, Row};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AggSummary {
    pub count: usize,
    pub sum: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl AggSummary {
    pub fn get(&self, func: AggFunc) -> f64 {
        match func {
            AggFunc::Sum => self.sum,
            AggFunc::Avg => self.avg,
            AggFunc::Min => self.min,
            AggFunc::Max => self.max,
        }
    }
}

#[derive(Debug, Default)]
struct ColumnAccumulator {
    count: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl ColumnAccumulator {
    fn add_value(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |current| current.min(value)));
        self.max = Some(self.max.map_or(value, |current| current.max(value)));
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    fn finish(self) -> AggSummary {
        AggSummary {
            count: self.count,
            sum: self.sum,
            avg: self.mean().unwrap_or(0.0),
            min: self.min.unwrap_or(0.0),
            max: self.max.unwrap_or(0.0),
        }
    }
}

pub fn summarize<'a, I>(rows: I, column_id: &str) -> AggSummary
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut acc = ColumnAccumulator::default();
    for row in rows {
        if let Some(value) = row.cell(column_id).and_then(|cell| cell.as_number()) {
            acc.add_value(value);
        }
    }
    acc.finish()
}

pub fn compute_agg<'a, I>(rows: I, column_id: &str, func: AggFunc) -> f64
where
    I: IntoIterator<Item = &'a Row>,
{
    summarize(rows, column_id).get(func)
}

/// Largest numeric value in the column, `0` when there is none. Used to scale
/// in-cell bars.
pub fn column_max<'a, I>(rows: I, column_id: &str) -> f64
where
    I: IntoIterator<Item = &'a Row>,
{
    summarize(rows, column_id).max
}

pub fn percent_of_total(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total * 100.0
    } else {
        0.0
    }
}

/// Each row's percentage of the column sum, in row order. Rows without a
/// numeric cell count as `0`.
pub fn percent_shares(rows: &[&Row], column_id: &str) -> Vec<f64> {
    let total = compute_agg(rows.iter().copied(), column_id, AggFunc::Sum);
    rows.iter()
        .map(|row| {
            let value = row
                .cell(column_id)
                .and_then(|cell| cell.as_number())
                .unwrap_or(0.0);
            percent_of_total(value, total)
        })
        .collect()
}

/// Turkish display form: `.` groups thousands, `,` separates decimals, at
/// most two fraction digits with trailing zeros dropped.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = format!("{:.2}", value.abs());
    let (integer, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let digits = integer.as_bytes();
    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, digit) in digits.iter().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*digit as char);
    }

    let is_zero = integer.bytes().all(|b| b == b'0') && fraction.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped},{fraction}")
    }
}
