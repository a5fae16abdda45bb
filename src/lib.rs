pub mod agg;
pub mod cli;
pub mod config;
pub mod csv_codec;
pub mod data;
pub mod id;
pub mod io_utils;
pub mod model;
pub mod presets;
pub mod query;
pub mod repair;
pub mod report;
pub mod schema;
pub mod store;
pub mod suggestion;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands},
    config::Config,
    model::{ColumnType, Sheet},
    query::{Query, SortDirection, SortKey, apply_query},
    store::{FileStore, SnapshotStore, find_sheet, load_sheets, save_sheets},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("tracker_sheet", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref())?;
    let store = FileStore::new(config.store_path(cli.store.as_deref()));
    debug!("Using store {:?}", store.path());
    match cli.command {
        Commands::List => handle_list(&store),
        Commands::Create(args) => handle_create(&store, &args),
        Commands::Suggest(args) => handle_suggest(&store, &args),
        Commands::Import(args) => handle_import(&store, &config, &args),
        Commands::Export(args) => handle_export(&store, &args),
        Commands::Show(args) => handle_show(&store, &args),
        Commands::Stats(args) => handle_stats(&store, &args),
        Commands::AddColumn(args) => handle_add_column(&store, &args),
        Commands::AddRow(args) => handle_add_row(&store, &args),
        Commands::Copy(args) => handle_copy(&store, &args),
        Commands::Delete(args) => handle_delete(&store, &args.sheet),
        Commands::Repair => handle_repair(&store),
        Commands::Config => {
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

fn save(store: &FileStore, sheets: &[Sheet]) -> Result<()> {
    save_sheets(store, sheets).with_context(|| format!("Writing store {:?}", store.path()))
}

fn lookup<'a>(sheets: &'a [Sheet], key: &str) -> Result<&'a Sheet> {
    find_sheet(sheets, key).ok_or_else(|| anyhow!("Sheet '{key}' not found"))
}

fn add_sheet(store: &FileStore, sheet: Sheet) -> Result<()> {
    let mut sheets = load_sheets(store);
    info!(
        "Created sheet '{}' ({}) with {} column(s) and {} row(s)",
        sheet.name(),
        sheet.id(),
        sheet.columns().len(),
        sheet.rows().len()
    );
    let id = sheet.id().to_string();
    sheets.push(sheet);
    save(store, &sheets)?;
    println!("{id}");
    Ok(())
}

/// Loads the store, applies `edit` to one sheet, and writes the result back.
/// A sheet whose `updated_at` did not move was refused by the model.
fn edit_sheet(
    store: &FileStore,
    key: &str,
    edit: impl FnOnce(&Sheet) -> Result<Sheet>,
) -> Result<Sheet> {
    let sheets = load_sheets(store);
    let current = lookup(&sheets, key)?;
    let next = edit(current)?;
    if next.updated_at() == current.updated_at() {
        bail!("Sheet '{}' was not changed", current.name());
    }
    let sheets = store::upsert_sheet(&sheets, next.clone());
    save(store, &sheets)?;
    Ok(next)
}

fn handle_list(store: &FileStore) -> Result<()> {
    let sheets = load_sheets(store);
    print!("{}", report::list_table(&sheets).render());
    info!("{} sheet(s) in {:?}", sheets.len(), store.path());
    Ok(())
}

fn handle_create(store: &FileStore, args: &cli::CreateArgs) -> Result<()> {
    let sheet = match &args.preset {
        Some(key) => presets::find_preset(key)
            .ok_or_else(|| anyhow!("Unknown preset '{key}'"))?
            .instantiate(),
        None => presets::blank_sheet(),
    }
    .ok_or_else(|| anyhow!("Template produced no columns"))?;
    let sheet = match &args.name {
        Some(name) => sheet.rename(name),
        None => sheet,
    };
    let sheet = match args.color {
        Some(color) => sheet.with_color(color),
        None => sheet,
    };
    add_sheet(store, sheet)
}

fn handle_suggest(store: &FileStore, args: &cli::SuggestArgs) -> Result<()> {
    let text = io_utils::read_input_text(&args.input, encoding_rs::UTF_8)?;
    let parsed = suggestion::parse_suggestion(&text)
        .ok_or_else(|| anyhow!("{:?} is not a schema suggestion", args.input))?;
    let sheet = suggestion::sheet_from_suggestion(&parsed)
        .ok_or_else(|| anyhow!("Suggestion in {:?} has no usable columns", args.input))?;
    add_sheet(store, sheet)
}

fn handle_import(store: &FileStore, config: &Config, args: &cli::ImportArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let text = io_utils::read_input_text(&args.input, encoding)?;
    let file_name = args
        .input
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|_| !io_utils::is_dash(&args.input))
        .unwrap_or("stdin");
    info!("Importing {:?} as {}", args.input, encoding.name());
    let sheet = csv_codec::import_csv(file_name, &text, &config.inference)
        .ok_or_else(|| anyhow!("No columns found in {:?}", args.input))?;
    let sheet = match &args.name {
        Some(name) => sheet.rename(name),
        None => sheet,
    };
    add_sheet(store, sheet)
}

fn handle_export(store: &FileStore, args: &cli::ExportArgs) -> Result<()> {
    let sheets = load_sheets(store);
    let sheet = lookup(&sheets, &args.sheet)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| csv_codec::export_file_name(sheet).into());
    io_utils::write_output(&output, &csv_codec::export_csv(sheet))?;
    info!(
        "Exported {} row(s) of '{}' to {:?}",
        sheet.rows().len(),
        sheet.name(),
        output
    );
    Ok(())
}

fn handle_show(store: &FileStore, args: &cli::ShowArgs) -> Result<()> {
    let sheets = load_sheets(store);
    let sheet = lookup(&sheets, &args.sheet)?;
    let mut query = build_query(sheet, args.search.as_deref(), &args.filters)?;
    if let Some(spec) = &args.sort {
        query.sort = Some(parse_sort(sheet, spec)?);
    }
    let rows = apply_query(sheet, &query);
    print!("{}", report::sheet_table(sheet, &rows).render());
    info!("{} of {} row(s) shown", rows.len(), sheet.rows().len());
    Ok(())
}

fn handle_stats(store: &FileStore, args: &cli::StatsArgs) -> Result<()> {
    let sheets = load_sheets(store);
    let sheet = lookup(&sheets, &args.sheet)?;
    if !sheet.has_number_columns() {
        bail!("Sheet '{}' has no number columns", sheet.name());
    }
    let query = build_query(sheet, args.search.as_deref(), &args.filters)?;
    let rows = apply_query(sheet, &query);
    print!("{}", report::stats_table(sheet, &rows).render());
    Ok(())
}

fn handle_add_column(store: &FileStore, args: &cli::AddColumnArgs) -> Result<()> {
    let options = (args.column_type == ColumnType::Select).then(|| args.options.clone());
    let sheet = edit_sheet(store, &args.sheet, |sheet| {
        Ok(sheet.add_column(&args.name, args.column_type, options))
    })?;
    info!(
        "Sheet '{}' now has {} column(s)",
        sheet.name(),
        sheet.columns().len()
    );
    Ok(())
}

fn handle_add_row(store: &FileStore, args: &cli::AddRowArgs) -> Result<()> {
    let sheet = edit_sheet(store, &args.sheet, |sheet| {
        let mut next = sheet.add_row();
        let Some(row) = next.rows().last().filter(|_| next.rows().len() > sheet.rows().len()) else {
            bail!("Sheet '{}' is full", sheet.name());
        };
        let row_id = row.id().to_string();
        for spec in &args.cells {
            let (key, value) = cli::parse_assignment(spec).map_err(|err| anyhow!(err))?;
            let column = next
                .find_column(&key)
                .ok_or_else(|| anyhow!("Column '{key}' not found in '{}'", sheet.name()))?;
            let column_id = column.id().to_string();
            let column_type = column.column_type();
            let updated = next.set_cell(&row_id, &column_id, value.as_str());
            if updated.updated_at() == next.updated_at() {
                bail!("'{value}' is not a valid {column_type} value for column '{key}'");
            }
            next = updated;
        }
        Ok(next)
    })?;
    info!("Sheet '{}' now has {} row(s)", sheet.name(), sheet.rows().len());
    Ok(())
}

fn handle_copy(store: &FileStore, args: &cli::CopyArgs) -> Result<()> {
    let sheets = load_sheets(store);
    let copy = lookup(&sheets, &args.sheet)?.copy(args.with_rows);
    add_sheet(store, copy)
}

fn handle_delete(store: &FileStore, key: &str) -> Result<()> {
    let sheets = load_sheets(store);
    let sheet = lookup(&sheets, key)?;
    let (id, name) = (sheet.id().to_string(), sheet.name().to_string());
    let remaining = store::remove_sheet(&sheets, &id);
    save(store, &remaining)?;
    info!("Deleted sheet '{name}' ({id})");
    Ok(())
}

/// Loading already repairs; writing the result back makes it permanent.
fn handle_repair(store: &FileStore) -> Result<()> {
    let raw = store
        .read()
        .with_context(|| format!("Reading store {:?}", store.path()))?;
    if raw.is_none() {
        info!("Store {:?} is empty; nothing to repair", store.path());
        return Ok(());
    }
    let sheets = load_sheets(store);
    save(store, &sheets)?;
    info!("Store {:?} holds {} sheet(s) with unique ids", store.path(), sheets.len());
    Ok(())
}

fn build_query(sheet: &Sheet, search: Option<&str>, filters: &[String]) -> Result<Query> {
    let mut query = Query::new().search(search.unwrap_or_default());
    for spec in filters {
        let (key, value) = cli::parse_assignment(spec).map_err(|err| anyhow!(err))?;
        let column = sheet
            .find_column(&key)
            .ok_or_else(|| anyhow!("Column '{key}' not found in '{}'", sheet.name()))?;
        if column.column_type() != ColumnType::Select {
            bail!("Column '{key}' is not a select column");
        }
        query = query.filter(column.id(), value);
    }
    Ok(query)
}

/// Parses `column[:asc|desc]`. A suffix that is not a direction stays part of
/// the column name.
fn parse_sort(sheet: &Sheet, spec: &str) -> Result<SortKey> {
    let (key, direction) = match spec.rsplit_once(':') {
        Some((column, direction)) => match direction.parse::<SortDirection>() {
            Ok(direction) => (column, direction),
            Err(_) => (spec, SortDirection::Asc),
        },
        None => (spec, SortDirection::Asc),
    };
    let column = sheet
        .find_column(key)
        .ok_or_else(|| anyhow!("Sort column '{}' not found", key.trim()))?;
    Ok(SortKey::new(column.id(), direction))
}
