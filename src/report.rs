//! Text renderings of sheets for the terminal.

use crate::{
    agg::{compute_agg, format_number, summarize},
    data::CellValue,
    model::{Row, Sheet},
    table::{Align, TextTable},
};

/// Renders the given rows (already filtered and ordered) with an aggregate
/// footer under every number column.
pub fn sheet_table(sheet: &Sheet, rows: &[&Row]) -> TextTable {
    let headers = sheet
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect::<Vec<_>>();
    let align = sheet
        .columns()
        .iter()
        .map(|c| if c.is_number() { Align::Right } else { Align::Left })
        .collect();
    let mut table = TextTable::new(headers).with_align(align);

    for row in rows {
        table.push_row(
            sheet
                .columns()
                .iter()
                .map(|column| match sheet.cell_or_default(row, column.id()) {
                    Some(CellValue::Number(n)) => format_number(n),
                    Some(CellValue::Text(s)) => s,
                    None => String::new(),
                })
                .collect(),
        );
    }

    if sheet.has_number_columns() {
        table.set_footer(
            sheet
                .columns()
                .iter()
                .map(|column| match column.agg_func() {
                    Some(func) => format!(
                        "{}: {}",
                        func.label(),
                        format_number(compute_agg(rows.iter().copied(), column.id(), func))
                    ),
                    None => String::new(),
                })
                .collect(),
        );
    }
    table
}

pub fn stats_table(sheet: &Sheet, rows: &[&Row]) -> TextTable {
    let headers = ["column", "agg", "count", "sum", "avg", "min", "max"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut align = vec![Align::Right; 7];
    align[0] = Align::Left;
    align[1] = Align::Left;
    let mut table = TextTable::new(headers).with_align(align);
    for column in sheet.columns().iter().filter(|c| c.is_number()) {
        let summary = summarize(rows.iter().copied(), column.id());
        table.push_row(vec![
            column.name().to_string(),
            column.agg_func().unwrap_or_default().to_string(),
            summary.count.to_string(),
            format_number(summary.sum),
            format_number(summary.avg),
            format_number(summary.min),
            format_number(summary.max),
        ]);
    }
    table
}

pub fn list_table(sheets: &[Sheet]) -> TextTable {
    let headers = ["id", "name", "color", "columns", "rows", "updated"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut table = TextTable::new(headers).with_align(vec![
        Align::Left,
        Align::Left,
        Align::Left,
        Align::Right,
        Align::Right,
        Align::Left,
    ]);
    for sheet in sheets {
        table.push_row(vec![
            sheet.id().to_string(),
            sheet.name().to_string(),
            sheet.color().to_string(),
            sheet.columns().len().to_string(),
            sheet.rows().len().to_string(),
            sheet.updated_at().format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }
    table
}
