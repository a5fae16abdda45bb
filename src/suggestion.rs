//! Intake for externally generated schema suggestions.
//!
//! The suggestion arrives as JSON text, possibly wrapped in a Markdown code
//! fence: `{ "name": ..., "color": ..., "columns": [{ "name", "type", "options" }] }`.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::model::{Column, ColumnType, MAX_COLUMNS, Sheet, SheetColor};

pub const DEFAULT_SUGGESTION_NAME: &str = "AI Tablo";
const DEFAULT_SUGGESTION_COLOR: SheetColor = SheetColor::Blue;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSuggestion {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub columns: Vec<SuggestedColumn>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestedColumn {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

/// Parses suggestion text. Returns `None` for anything that is not a JSON
/// object of the expected shape.
pub fn parse_suggestion(text: &str) -> Option<SchemaSuggestion> {
    let body = strip_code_fence(text.trim());
    match serde_json::from_str::<SchemaSuggestion>(body) {
        Ok(suggestion) => Some(suggestion),
        Err(err) => {
            warn!("Schema suggestion is not valid JSON: {err}");
            None
        }
    }
}

/// Builds an empty sheet from a suggestion. Unknown column types become
/// `text`, and so does a `select` without usable options. Columns without a
/// name are skipped, then columns past the cap. `None` when no column is left.
pub fn sheet_from_suggestion(suggestion: &SchemaSuggestion) -> Option<Sheet> {
    let columns = suggestion
        .columns
        .iter()
        .filter(|column| !column.name.trim().is_empty())
        .take(MAX_COLUMNS)
        .map(|column| {
            let column_type = ColumnType::parse_lenient(&column.column_type);
            let options = (column_type == ColumnType::Select)
                .then(|| column.options.clone())
                .flatten();
            Column::new(&column.name, column_type, options)
        })
        .collect::<Vec<_>>();
    if columns.is_empty() {
        debug!("Schema suggestion has no usable columns");
        return None;
    }

    let name = suggestion
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_SUGGESTION_NAME);
    let color = match suggestion.color.as_deref() {
        Some(token) if !token.trim().is_empty() => SheetColor::parse(token).unwrap_or_default(),
        _ => DEFAULT_SUGGESTION_COLOR,
    };
    Sheet::new(name, color, columns)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
