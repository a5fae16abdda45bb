use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::{ColumnType, SheetColor};

#[derive(Debug, Parser)]
#[command(author, version, about = "Typed tracker sheets with CSV import and export", long_about = None)]
pub struct Cli {
    /// JSON snapshot holding every sheet (defaults to tracker.json)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
    /// YAML settings file (store path, type inference thresholds)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List every sheet in the store
    List,
    /// Create a blank sheet or one from a preset
    Create(CreateArgs),
    /// Create a sheet from a schema suggestion (JSON, optionally code-fenced)
    Suggest(SuggestArgs),
    /// Import a CSV file as a new sheet
    Import(ImportArgs),
    /// Export a sheet as CSV
    Export(ExportArgs),
    /// Show a sheet as a table, with optional search, filters, and sort
    Show(ShowArgs),
    /// Summary statistics for every number column of a sheet
    Stats(StatsArgs),
    /// Add a column to a sheet
    AddColumn(AddColumnArgs),
    /// Append a row to a sheet
    AddRow(AddRowArgs),
    /// Copy a sheet under new ids
    Copy(CopyArgs),
    /// Delete a sheet
    Delete(SheetArg),
    /// Regenerate ids when the store holds duplicates
    Repair,
    /// Print the effective configuration as YAML
    Config,
}

#[derive(Debug, Args)]
pub struct SheetArg {
    /// Sheet id or name
    pub sheet: String,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Preset key or name (blank sheet when omitted)
    #[arg(long)]
    pub preset: Option<String>,
    /// Name for the new sheet
    #[arg(long)]
    pub name: Option<String>,
    /// Color tag
    #[arg(long, value_parser = parse_color)]
    pub color: Option<SheetColor>,
}

#[derive(Debug, Args)]
pub struct SuggestArgs {
    /// Suggestion file (`-` for stdin)
    #[arg(short, long)]
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// CSV file to import (`-` for stdin)
    #[arg(short, long)]
    pub input: PathBuf,
    /// Sheet name (defaults to the file name without `.csv`)
    #[arg(long)]
    pub name: Option<String>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Sheet id or name
    pub sheet: String,
    /// Output file (`-` for stdout; defaults to a name derived from the sheet)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Sheet id or name
    pub sheet: String,
    /// Case-insensitive text searched in every column
    #[arg(long)]
    pub search: Option<String>,
    /// Select filters of the form `column=value`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Sort directive of the form `column[:asc|desc]`
    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Sheet id or name
    pub sheet: String,
    /// Restrict the rows with the same search as `show`
    #[arg(long)]
    pub search: Option<String>,
    /// Select filters of the form `column=value`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
}

#[derive(Debug, Args)]
pub struct AddColumnArgs {
    /// Sheet id or name
    pub sheet: String,
    /// Column name
    #[arg(long)]
    pub name: String,
    /// Column type (text, number, date, select)
    #[arg(long = "type", value_parser = parse_column_type, default_value = "text")]
    pub column_type: ColumnType,
    /// Options for a select column
    #[arg(long, value_delimiter = ',')]
    pub options: Vec<String>,
}

#[derive(Debug, Args)]
pub struct AddRowArgs {
    /// Sheet id or name
    pub sheet: String,
    /// Cell values of the form `column=value`
    #[arg(long = "set", action = clap::ArgAction::Append)]
    pub cells: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CopyArgs {
    /// Sheet id or name
    pub sheet: String,
    /// Copy the rows as well as the columns
    #[arg(long)]
    pub with_rows: bool,
}

pub fn parse_color(value: &str) -> Result<SheetColor, String> {
    SheetColor::parse(value).ok_or_else(|| {
        let known = SheetColor::ALL
            .iter()
            .map(SheetColor::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        format!("Unknown color '{value}'. Supported colors: {known}")
    })
}

pub fn parse_column_type(value: &str) -> Result<ColumnType, String> {
    value.parse().map_err(|err: anyhow::Error| err.to_string())
}

/// Splits `column=value`. The value may be empty; the column may not.
pub fn parse_assignment(spec: &str) -> Result<(String, String), String> {
    let (column, value) = spec
        .split_once('=')
        .ok_or_else(|| format!("Expected `column=value`, got '{spec}'"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("Missing column name in '{spec}'"));
    }
    Ok((column.to_string(), value.trim().to_string()))
}
