//! CSV import and export for sheets.
//!
//! Import splits the text into records on newlines outside quotes, parses each
//! record per RFC 4180 with its delimiter (comma or semicolon) detected per
//! record, then infers the
//! column types via [`crate::schema`]. Export writes a UTF-8 BOM, quotes every
//! header and string cell, and leaves numbers bare.
//!
//! Numbers survive a round trip exactly. Their textual form may not: `12,5` in
//! the source comes back as `12.5`.

use std::cmp::Ordering;

use csv::{ReaderBuilder, StringRecord, Trim};
use itertools::Itertools;
use log::{debug, warn};

use crate::{
    data::{CellValue, format_plain_number, parse_number},
    model::{Column, ColumnType, MAX_COLUMNS, MAX_ROWS, Row, Sheet, SheetColor},
    schema::{InferenceOptions, infer_column_types},
};

pub const UTF8_BOM: &str = "\u{feff}";

const IMPORT_COLOR: SheetColor = SheetColor::Blue;
const FALLBACK_SHEET_NAME: &str = "CSV";
const TURKISH_LETTERS: &str = "çÇğĞıİöÖşŞüÜ";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCsv {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl ParsedCsv {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub fn parse_csv(text: &str) -> ParsedCsv {
    parse_csv_with(text, &InferenceOptions::default())
}

pub fn parse_csv_with(text: &str, options: &InferenceOptions) -> ParsedCsv {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let mut lines = split_records(text)
        .into_iter()
        .filter(|line| !line.trim().is_empty());
    let Some(header_line) = lines.next() else {
        return ParsedCsv::default();
    };

    let header_delimiter = detect_delimiter(header_line, b',');
    let headers = parse_line(header_line, header_delimiter);
    let raw_rows = lines
        .map(|line| parse_line(line, detect_delimiter(line, header_delimiter)))
        .collect::<Vec<_>>();
    debug!(
        "Parsed CSV header with {} field(s) and {} data line(s)",
        headers.len(),
        raw_rows.len()
    );

    let inferred = infer_column_types(headers.len(), &raw_rows, options);
    let columns = headers
        .iter()
        .zip(inferred)
        .enumerate()
        .map(|(idx, (header, inferred))| {
            let name = if header.is_empty() {
                format!("Kolon {}", idx + 1)
            } else {
                header.clone()
            };
            Column::new(&name, inferred.column_type, inferred.options)
        })
        .collect::<Vec<_>>();

    let rows = raw_rows
        .iter()
        .map(|raw| {
            Row::new(columns.iter().enumerate().map(|(idx, column)| {
                let value = raw.get(idx).map(String::as_str).unwrap_or("");
                (column.id().to_string(), typed_cell(column, value))
            }))
        })
        .collect();

    ParsedCsv { columns, rows }
}

/// Builds a sheet from CSV text. `None` when the text has no header line.
/// Columns and rows beyond the sheet caps are dropped.
pub fn import_csv(file_name: &str, text: &str, options: &InferenceOptions) -> Option<Sheet> {
    let parsed = parse_csv_with(text, options);
    if parsed.is_empty() {
        return None;
    }
    if parsed.columns.len() > MAX_COLUMNS || parsed.rows.len() > MAX_ROWS {
        warn!(
            "Import of '{}' exceeds the sheet caps ({} columns, {} rows); extra data is dropped",
            file_name,
            parsed.columns.len(),
            parsed.rows.len()
        );
    }
    Sheet::from_parts(
        &sheet_name_from_file(file_name),
        IMPORT_COLOR,
        parsed.columns,
        parsed.rows,
    )
}

pub fn export_csv(sheet: &Sheet) -> Vec<u8> {
    let header = sheet.columns().iter().map(|c| quote(c.name())).join(",");
    let mut lines = std::iter::once(header).chain(sheet.rows().iter().map(|row| {
        sheet
            .columns()
            .iter()
            .map(|column| match row.cell(column.id()) {
                Some(CellValue::Number(n)) => format_plain_number(*n),
                Some(CellValue::Text(s)) => quote(s),
                None if column.is_number() => "0".to_string(),
                None => quote(""),
            })
            .join(",")
    }));
    let mut out = String::from(UTF8_BOM);
    out.push_str(&lines.join("\n"));
    out.into_bytes()
}

/// File name for a downloaded sheet: anything other than Latin or Turkish
/// letters, digits, `_`, and `-` becomes `_`.
pub fn export_file_name(sheet: &Sheet) -> String {
    let stem = sheet
        .name()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || TURKISH_LETTERS.contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();
    format!("{stem}.csv")
}

fn sheet_name_from_file(file_name: &str) -> String {
    let trimmed = file_name.trim();
    let stem = match trimmed.len().checked_sub(4) {
        Some(split) if trimmed.is_char_boundary(split)
            && trimmed[split..].eq_ignore_ascii_case(".csv") =>
        {
            &trimmed[..split]
        }
        _ => trimmed,
    };
    if stem.trim().is_empty() {
        FALLBACK_SHEET_NAME.to_string()
    } else {
        stem.to_string()
    }
}

fn typed_cell(column: &Column, raw: &str) -> CellValue {
    match column.column_type() {
        ColumnType::Number => CellValue::Number(parse_number(raw).unwrap_or(0.0)),
        _ => CellValue::Text(raw.trim().to_string()),
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Splits on `\n` or `\r\n` outside quoted fields, so a quoted cell may span
/// several lines.
fn split_records(text: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\n' if !in_quotes => {
                let record = &text[start..idx];
                records.push(record.strip_suffix('\r').unwrap_or(record));
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < text.len() {
        let record = &text[start..];
        records.push(record.strip_suffix('\r').unwrap_or(record));
    }
    records
}

/// Picks whichever of `,` and `;` occurs more often outside quotes; a tie
/// keeps `fallback`.
fn detect_delimiter(line: &str, fallback: u8) -> u8 {
    let mut in_quotes = false;
    let (mut commas, mut semicolons) = (0usize, 0usize);
    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => commas += 1,
            ';' if !in_quotes => semicolons += 1,
            _ => {}
        }
    }
    match semicolons.cmp(&commas) {
        Ordering::Greater => b';',
        Ordering::Less => b',',
        Ordering::Equal => fallback,
    }
}

fn parse_line(line: &str, delimiter: u8) -> Vec<String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());
    let mut record = StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(str::to_string).collect(),
        Ok(false) => Vec::new(),
        Err(err) => {
            debug!("Skipping unreadable CSV line: {err}");
            Vec::new()
        }
    }
}
