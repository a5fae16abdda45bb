use std::{fmt, sync::OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A single cell. Number columns hold [`CellValue::Number`], every other
/// column type holds [`CellValue::Text`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::Number(_) => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }

    pub fn as_display(&self) -> String {
        match self {
            CellValue::Number(n) => format_plain_number(*n),
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// Shortest representation that parses back to the same `f64`, never in
/// exponent form. Negative zero prints as `0`.
pub fn format_plain_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

/// Parses a numeric token, accepting a comma as the decimal separator.
/// Blank, non-finite, and non-numeric input yield `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.replace(',', ".");
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn date_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"^\d{4}-\d{1,2}-\d{1,2}$",
            r"^\d{4}/\d{1,2}/\d{1,2}$",
            r"^\d{1,2}\.\d{1,2}\.\d{4}$",
            r"^\d{1,2}-\d{1,2}-\d{4}$",
            r"^\d{1,2}/\d{1,2}/\d{4}$",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

/// True for ISO-like (`YYYY-MM-DD`, `YYYY/MM/DD`) and European
/// (`DD.MM.YYYY`, `DD-MM-YYYY`, `DD/MM/YYYY`) date shapes.
pub fn looks_like_date(raw: &str) -> bool {
    let trimmed = raw.trim();
    !trimmed.is_empty() && date_patterns().iter().any(|re| re.is_match(trimmed))
}
