//! Sheet, column, and row model.
//!
//! A [`Sheet`] is never edited in place by callers: every mutation method takes
//! `&self` and returns a new sheet with a strictly later `updated_at`. A refused
//! mutation (cap reached, unknown id, invalid value) returns an unchanged clone,
//! so comparing timestamps tells a caller whether anything happened.
//!
//! Invariants upheld by every constructor and mutation:
//!
//! - 1 to [`MAX_COLUMNS`] columns with unique ids, at most [`MAX_ROWS`] rows;
//! - a row's cell map only uses column ids of its own sheet;
//! - `options` is present exactly when the column type is `select`;
//! - a cell's kind matches its column type (numbers only in number columns).

use std::{collections::BTreeMap, collections::HashSet, fmt, str::FromStr};

use anyhow::anyhow;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    data::{CellValue, format_plain_number, parse_number},
    id::new_id,
};

pub const MAX_COLUMNS: usize = 20;
pub const MAX_ROWS: usize = 200;

const COPY_SUFFIX: &str = " (kopya)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Date,
    Select,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Select => "select",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["text", "number", "date", "select"]
    }

    /// Unknown type tags fall back to `text`.
    pub fn parse_lenient(value: &str) -> ColumnType {
        value.parse().unwrap_or(ColumnType::Text)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ColumnType::Text),
            "number" => Ok(ColumnType::Number),
            "date" => Ok(ColumnType::Date),
            "select" => Ok(ColumnType::Select),
            _ => Err(anyhow!(
                "Unknown column type '{value}'. Supported types: {}",
                ColumnType::variants().join(", ")
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    #[default]
    Sum,
    Avg,
    Min,
    Max,
}

impl AggFunc {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggFunc::Sum => "sum",
            AggFunc::Avg => "avg",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AggFunc::Sum => "Toplam",
            AggFunc::Avg => "Ortalama",
            AggFunc::Min => "En az",
            AggFunc::Max => "En cok",
        }
    }

    /// sum → avg → min → max → sum
    pub fn next(self) -> AggFunc {
        match self {
            AggFunc::Sum => AggFunc::Avg,
            AggFunc::Avg => AggFunc::Min,
            AggFunc::Min => AggFunc::Max,
            AggFunc::Max => AggFunc::Sum,
        }
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AggFunc {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AggFunc::Sum),
            "avg" => Ok(AggFunc::Avg),
            "min" => Ok(AggFunc::Min),
            "max" => Ok(AggFunc::Max),
            _ => Err(anyhow!(
                "Unknown aggregate function '{value}'. Supported: sum, avg, min, max"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SheetColor {
    #[default]
    Gray,
    Red,
    Pink,
    Grape,
    Violet,
    Indigo,
    Blue,
    Cyan,
    Teal,
    Green,
    Lime,
    Yellow,
    Orange,
}

impl SheetColor {
    pub const ALL: [SheetColor; 13] = [
        SheetColor::Gray,
        SheetColor::Red,
        SheetColor::Pink,
        SheetColor::Grape,
        SheetColor::Violet,
        SheetColor::Indigo,
        SheetColor::Blue,
        SheetColor::Cyan,
        SheetColor::Teal,
        SheetColor::Green,
        SheetColor::Lime,
        SheetColor::Yellow,
        SheetColor::Orange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SheetColor::Gray => "gray",
            SheetColor::Red => "red",
            SheetColor::Pink => "pink",
            SheetColor::Grape => "grape",
            SheetColor::Violet => "violet",
            SheetColor::Indigo => "indigo",
            SheetColor::Blue => "blue",
            SheetColor::Cyan => "cyan",
            SheetColor::Teal => "teal",
            SheetColor::Green => "green",
            SheetColor::Lime => "lime",
            SheetColor::Yellow => "yellow",
            SheetColor::Orange => "orange",
        }
    }

    pub fn parse(value: &str) -> Option<SheetColor> {
        let normalized = value.trim().to_ascii_lowercase();
        SheetColor::ALL
            .into_iter()
            .find(|color| color.as_str() == normalized)
    }
}

impl fmt::Display for SheetColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SheetColor {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SheetColor::parse(value).ok_or_else(|| anyhow!("Unknown sheet color '{value}'"))
    }
}

impl Serialize for SheetColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SheetColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // A cosmetic tag must never make a persisted sheet unreadable.
        let token = String::deserialize(deserializer)?;
        Ok(SheetColor::parse(&token).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    id: String,
    name: String,
    #[serde(rename = "type", default)]
    column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    agg_func: Option<AggFunc>,
}

impl Column {
    /// Builds a column with a fresh id. A `select` column without any usable
    /// option degrades to `text`; options given to other types are dropped.
    pub fn new(name: &str, column_type: ColumnType, options: Option<Vec<String>>) -> Column {
        Column {
            id: new_id(),
            name: name.trim().to_string(),
            column_type,
            options,
            agg_func: None,
        }
        .normalized()
    }

    pub fn text(name: &str) -> Column {
        Column::new(name, ColumnType::Text, None)
    }

    pub fn number(name: &str) -> Column {
        Column::new(name, ColumnType::Number, None)
    }

    pub fn select(name: &str, options: &[&str]) -> Column {
        Column::new(
            name,
            ColumnType::Select,
            Some(options.iter().map(|o| o.to_string()).collect()),
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_number(&self) -> bool {
        self.column_type == ColumnType::Number
    }

    pub fn options(&self) -> &[String] {
        self.options.as_deref().unwrap_or_default()
    }

    /// The aggregate function for number columns; `None` for other types.
    pub fn agg_func(&self) -> Option<AggFunc> {
        self.is_number().then(|| self.agg_func.unwrap_or_default())
    }

    pub fn default_cell(&self) -> CellValue {
        match self.column_type {
            ColumnType::Number => CellValue::Number(0.0),
            _ => CellValue::Text(String::new()),
        }
    }

    /// Converts `value` into the kind this column stores, or `None` when the
    /// value cannot live in this column.
    pub fn coerce(&self, value: &CellValue) -> Option<CellValue> {
        match (self.column_type, value) {
            (ColumnType::Number, CellValue::Number(n)) => {
                n.is_finite().then_some(CellValue::Number(*n))
            }
            (ColumnType::Number, CellValue::Text(s)) if s.trim().is_empty() => {
                Some(CellValue::Number(0.0))
            }
            (ColumnType::Number, CellValue::Text(s)) => parse_number(s).map(CellValue::Number),
            (ColumnType::Select, value) => {
                let text = value.as_display();
                (text.is_empty() || self.options().iter().any(|o| *o == text))
                    .then_some(CellValue::Text(text))
            }
            (ColumnType::Text | ColumnType::Date, CellValue::Number(n)) => {
                Some(CellValue::Text(format_plain_number(*n)))
            }
            (ColumnType::Text | ColumnType::Date, CellValue::Text(s)) => {
                Some(CellValue::Text(s.clone()))
            }
        }
    }

    pub(crate) fn with_id(&self, id: String) -> Column {
        Column {
            id,
            ..self.clone()
        }
    }

    pub(crate) fn normalized(mut self) -> Column {
        if self.column_type == ColumnType::Select {
            let mut seen = HashSet::new();
            let options = self
                .options
                .take()
                .unwrap_or_default()
                .into_iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty() && seen.insert(o.clone()))
                .collect::<Vec<_>>();
            if options.is_empty() {
                debug!(
                    "Column '{}' has no usable select options; using text",
                    self.name
                );
                self.column_type = ColumnType::Text;
            } else {
                self.options = Some(options);
            }
        } else {
            self.options = None;
        }
        match self.column_type {
            ColumnType::Number => {
                self.agg_func.get_or_insert(AggFunc::Sum);
            }
            _ => self.agg_func = None,
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    id: String,
    #[serde(default)]
    cells: BTreeMap<String, CellValue>,
}

impl Row {
    /// Builds a row with a fresh id. Keys are validated against the owning
    /// sheet when the row is placed into one.
    pub fn new<K, I>(cells: I) -> Row
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, CellValue)>,
    {
        Row {
            id: new_id(),
            cells: cells.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cell(&self, column_id: &str) -> Option<&CellValue> {
        self.cells.get(column_id)
    }

    pub fn cells(&self) -> &BTreeMap<String, CellValue> {
        &self.cells
    }

    pub(crate) fn with_id(&self, id: String) -> Row {
        Row {
            id,
            cells: self.cells.clone(),
        }
    }

    pub(crate) fn with_cells(&self, id: String, cells: BTreeMap<String, CellValue>) -> Row {
        Row { id, cells }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    id: String,
    name: String,
    #[serde(default)]
    color: SheetColor,
    #[serde(default)]
    columns: Vec<Column>,
    #[serde(default)]
    rows: Vec<Row>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Sheet {
    /// Creates an empty sheet. Returns `None` when no column is given; columns
    /// beyond [`MAX_COLUMNS`] are dropped.
    pub fn new(name: &str, color: SheetColor, columns: Vec<Column>) -> Option<Sheet> {
        Sheet::from_parts(name, color, columns, Vec::new())
    }

    /// Creates a sheet from untrusted parts, enforcing every invariant: caps,
    /// unique column ids, cell keys, and cell kinds.
    pub fn from_parts(
        name: &str,
        color: SheetColor,
        columns: Vec<Column>,
        rows: Vec<Row>,
    ) -> Option<Sheet> {
        let now = Utc::now();
        Sheet {
            id: new_id(),
            name: name.trim().to_string(),
            color,
            columns,
            rows,
            created_at: now,
            updated_at: now,
        }
        .normalized()
        .map(Sheet::with_valid_cells)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> SheetColor {
        self.color
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    /// Looks a column up by id first, then by case-insensitive name.
    pub fn find_column(&self, key: &str) -> Option<&Column> {
        self.column(key).or_else(|| {
            let lowered = key.trim().to_lowercase();
            self.columns
                .iter()
                .find(|c| c.name.to_lowercase() == lowered)
        })
    }

    pub fn row(&self, row_id: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == row_id)
    }

    pub fn has_number_columns(&self) -> bool {
        self.columns.iter().any(Column::is_number)
    }

    /// The cell for `column_id`, or the column's default when the row has no
    /// entry for it.
    pub fn cell_or_default(&self, row: &Row, column_id: &str) -> Option<CellValue> {
        let column = self.column(column_id)?;
        Some(
            row.cell(column_id)
                .cloned()
                .unwrap_or_else(|| column.default_cell()),
        )
    }

    pub fn rename(&self, name: &str) -> Sheet {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed == self.name {
            return self.refused("rename sheet to a blank or identical name");
        }
        self.updated(|sheet| sheet.name = trimmed.to_string())
    }

    pub fn with_color(&self, color: SheetColor) -> Sheet {
        self.updated(|sheet| sheet.color = color)
    }

    pub fn add_column(
        &self,
        name: &str,
        column_type: ColumnType,
        options: Option<Vec<String>>,
    ) -> Sheet {
        if self.columns.len() >= MAX_COLUMNS {
            return self.refused("add a column beyond the column cap");
        }
        if name.trim().is_empty() {
            return self.refused("add a column without a name");
        }
        let column = Column::new(name, column_type, options);
        let default = column.default_cell();
        self.updated(|sheet| {
            for row in &mut sheet.rows {
                row.cells.insert(column.id.clone(), default.clone());
            }
            sheet.columns.push(column);
        })
    }

    pub fn remove_column(&self, column_id: &str) -> Sheet {
        if self.columns.len() <= 1 {
            return self.refused("remove the last column");
        }
        if self.column(column_id).is_none() {
            return self.refused("remove an unknown column");
        }
        self.updated(|sheet| {
            sheet.columns.retain(|c| c.id != column_id);
            for row in &mut sheet.rows {
                row.cells.remove(column_id);
            }
        })
    }

    pub fn rename_column(&self, column_id: &str, name: &str) -> Sheet {
        let trimmed = name.trim();
        match self.column(column_id) {
            Some(column) if !trimmed.is_empty() && column.name != trimmed => {
                self.update_column(column_id, |c| c.name = trimmed.to_string())
            }
            _ => self.refused("rename a column"),
        }
    }

    pub fn set_agg_func(&self, column_id: &str, func: AggFunc) -> Sheet {
        match self.column(column_id) {
            Some(column) if column.is_number() => {
                self.update_column(column_id, |c| c.agg_func = Some(func))
            }
            _ => self.refused("set an aggregate on a non-number column"),
        }
    }

    pub fn cycle_agg_func(&self, column_id: &str) -> Sheet {
        match self.column(column_id).and_then(Column::agg_func) {
            Some(current) => self.set_agg_func(column_id, current.next()),
            None => self.refused("cycle the aggregate of a non-number column"),
        }
    }

    pub fn add_row(&self) -> Sheet {
        if self.rows.len() >= MAX_ROWS {
            return self.refused("add a row beyond the row cap");
        }
        let row = Row::new(
            self.columns
                .iter()
                .map(|c| (c.id.clone(), c.default_cell())),
        );
        self.updated(|sheet| sheet.rows.push(row))
    }

    /// Duplicates a row and places the copy directly after its source.
    pub fn insert_row_copy(&self, row_id: &str) -> Sheet {
        if self.rows.len() >= MAX_ROWS {
            return self.refused("copy a row beyond the row cap");
        }
        let Some(index) = self.rows.iter().position(|r| r.id == row_id) else {
            return self.refused("copy an unknown row");
        };
        let copy = self.rows[index].with_id(new_id());
        self.updated(|sheet| sheet.rows.insert(index + 1, copy))
    }

    pub fn remove_row(&self, row_id: &str) -> Sheet {
        if self.row(row_id).is_none() {
            return self.refused("remove an unknown row");
        }
        self.updated(|sheet| sheet.rows.retain(|r| r.id != row_id))
    }

    /// Writes one cell after validating it against the column type.
    pub fn set_cell(&self, row_id: &str, column_id: &str, value: impl Into<CellValue>) -> Sheet {
        let value = value.into();
        let Some(column) = self.column(column_id) else {
            return self.refused("write a cell for an unknown column");
        };
        if self.row(row_id).is_none() {
            return self.refused("write a cell for an unknown row");
        }
        let Some(coerced) = column.coerce(&value) else {
            debug!(
                "Value '{}' does not fit {} column '{}'",
                value, column.column_type, column.name
            );
            return self.refused("write a cell of the wrong kind");
        };
        self.updated(|sheet| {
            if let Some(row) = sheet.rows.iter_mut().find(|r| r.id == row_id) {
                row.cells.insert(column_id.to_string(), coerced);
            }
        })
    }

    /// Copies the sheet under fresh ids. Cell keys are remapped to the new
    /// column ids; rows are kept only when `with_rows` is set.
    pub fn copy(&self, with_rows: bool) -> Sheet {
        let mut copy = self.reissued();
        copy.name = format!("{}{}", self.name, COPY_SUFFIX);
        if !with_rows {
            copy.rows.clear();
        }
        let now = Utc::now();
        copy.created_at = now;
        copy.updated_at = now;
        copy
    }

    /// The same sheet with a new id for the sheet, every column, and every
    /// row. Cell keys follow their columns; keys without a column are dropped.
    pub(crate) fn reissued(&self) -> Sheet {
        let mut id_map: BTreeMap<&str, String> = BTreeMap::new();
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let id = new_id();
                id_map.entry(column.id.as_str()).or_insert_with(|| id.clone());
                column.with_id(id)
            })
            .collect::<Vec<_>>();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let cells = row
                    .cells
                    .iter()
                    .filter_map(|(key, value)| {
                        id_map
                            .get(key.as_str())
                            .map(|new_key| (new_key.clone(), value.clone()))
                    })
                    .collect();
                row.with_cells(new_id(), cells)
            })
            .collect();
        Sheet {
            id: new_id(),
            name: self.name.clone(),
            color: self.color,
            columns,
            rows,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub(crate) fn touched(mut self, previous: DateTime<Utc>) -> Sheet {
        self.updated_at = next_timestamp(previous);
        self
    }

    /// Enforces the sheet invariants on data that did not come through the
    /// mutation methods. Ids and timestamps are kept. `None` when no column
    /// survives. Cells are coerced to their column's kind where possible;
    /// a stored value the column would refuse on write is kept as is.
    pub(crate) fn normalized(mut self) -> Option<Sheet> {
        let mut seen = HashSet::new();
        let columns = std::mem::take(&mut self.columns)
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .map(Column::normalized)
            .collect::<Vec<_>>();
        if columns.is_empty() {
            debug!("Sheet '{}' has no columns", self.name);
            return None;
        }
        if columns.len() > MAX_COLUMNS {
            warn!(
                "Sheet '{}' has {} columns; keeping the first {}",
                self.name,
                columns.len(),
                MAX_COLUMNS
            );
        }
        self.columns = columns.into_iter().take(MAX_COLUMNS).collect();
        if self.rows.len() > MAX_ROWS {
            warn!(
                "Sheet '{}' has {} rows; keeping the first {}",
                self.name,
                self.rows.len(),
                MAX_ROWS
            );
            self.rows.truncate(MAX_ROWS);
        }
        let columns = &self.columns;
        for row in &mut self.rows {
            let cells = std::mem::take(&mut row.cells);
            row.cells = cells
                .into_iter()
                .filter_map(|(key, value)| {
                    let column = columns.iter().find(|c| c.id == key)?;
                    let kept = column.coerce(&value).unwrap_or_else(|| {
                        debug!(
                            "Keeping stored value {value:?} that column '{}' would refuse",
                            column.name
                        );
                        value
                    });
                    Some((key, kept))
                })
                .collect();
        }
        Some(self)
    }

    /// Drops every cell its column would refuse on write.
    fn with_valid_cells(mut self) -> Sheet {
        let columns = &self.columns;
        for row in &mut self.rows {
            row.cells.retain(|key, value| {
                columns
                    .iter()
                    .find(|c| c.id == *key)
                    .is_some_and(|column| column.coerce(value).is_some())
            });
        }
        self
    }

    fn update_column(&self, column_id: &str, edit: impl FnOnce(&mut Column)) -> Sheet {
        self.updated(|sheet| {
            if let Some(column) = sheet.columns.iter_mut().find(|c| c.id == column_id) {
                edit(column);
            }
        })
    }

    fn updated(&self, edit: impl FnOnce(&mut Sheet)) -> Sheet {
        let mut next = self.clone();
        edit(&mut next);
        next.touched(self.updated_at)
    }

    fn refused(&self, action: &str) -> Sheet {
        debug!("Sheet '{}': refused to {}", self.name, action);
        self.clone()
    }
}

/// `now`, or one millisecond past `previous` when the clock has not moved on.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + TimeDelta::milliseconds(1)
    }
}
