use proptest::prelude::*;
use tracker_sheet::{
    agg::{compute_agg, summarize},
    csv_codec::{export_csv, parse_csv},
    model::{AggFunc, Column, ColumnType, Row, Sheet, SheetColor},
    repair::{count_collisions, repair_collisions},
};

#[derive(Debug, Clone)]
struct RowSpec {
    label: String,
    amount: f64,
}

fn row_spec() -> impl Strategy<Value = RowSpec> {
    (
        "[a-zA-Z0-9 ,;\"\n\rçğışöüÇĞİŞÖÜ]{0,12}",
        -1.0e9f64..1.0e9f64,
    )
        .prop_map(|(label, amount)| RowSpec { label, amount })
}

fn build_sheet(specs: &[RowSpec]) -> Sheet {
    let mut sheet = Sheet::new(
        "Ozellik",
        SheetColor::Cyan,
        vec![Column::text("Etiket"), Column::number("Miktar")],
    )
    .expect("two columns");
    let etiket = sheet.columns()[0].id().to_string();
    let miktar = sheet.columns()[1].id().to_string();
    for spec in specs {
        sheet = sheet.add_row();
        let row = sheet.rows().last().expect("row added").id().to_string();
        sheet = sheet
            .set_cell(&row, &etiket, spec.label.as_str())
            .set_cell(&row, &miktar, spec.amount);
    }
    sheet
}

/// Serializes `sheet`, lets `edit` rewrite ids in the JSON, and decodes it back.
fn with_json_edit(sheet: &Sheet, edit: impl FnOnce(&mut serde_json::Value)) -> Sheet {
    let mut value = serde_json::to_value(sheet).expect("encode sheet");
    edit(&mut value);
    serde_json::from_value(value).expect("decode sheet")
}

fn assert_cell_keys_resolve(sheets: &[Sheet]) {
    for sheet in sheets {
        for row in sheet.rows() {
            for key in row.cells().keys() {
                assert!(sheet.column(key).is_some(), "dangling key {key}");
            }
        }
    }
}

proptest! {
    #[test]
    fn csv_round_trip_keeps_rows_and_numbers(specs in proptest::collection::vec(row_spec(), 0..30)) {
        let sheet = build_sheet(&specs);
        let text = String::from_utf8(export_csv(&sheet)).expect("utf-8");
        let parsed = parse_csv(&text);

        prop_assert_eq!(parsed.rows.len(), sheet.rows().len());
        prop_assert_eq!(parsed.columns.len(), 2);
        if !specs.is_empty() {
            prop_assert_eq!(parsed.columns[1].column_type(), ColumnType::Number);
        }
        let original = sheet.columns()[1].id();
        let reparsed = parsed.columns[1].id();
        for (a, b) in sheet.rows().iter().zip(&parsed.rows) {
            let x = a.cell(original).and_then(|c| c.as_number());
            let y = b.cell(reparsed).and_then(|c| c.as_number());
            prop_assert_eq!(x, y);
        }
    }

    #[test]
    fn sum_equals_avg_times_count(values in proptest::collection::vec(proptest::option::of(-1.0e6f64..1.0e6f64), 0..50)) {
        let rows = values
            .iter()
            .map(|value| Row::new(value.map(|v| ("n".to_string(), v.into()))))
            .collect::<Vec<_>>();
        let summary = summarize(&rows, "n");
        let count = values.iter().flatten().count();
        prop_assert_eq!(summary.count, count);

        let sum = compute_agg(&rows, "n", AggFunc::Sum);
        let avg = compute_agg(&rows, "n", AggFunc::Avg);
        if count > 0 {
            let tolerance = 1e-9 * sum.abs().max(1.0);
            prop_assert!((sum - avg * count as f64).abs() <= tolerance);
        } else {
            for func in [AggFunc::Sum, AggFunc::Avg, AggFunc::Min, AggFunc::Max] {
                prop_assert_eq!(compute_agg(&rows, "n", func), 0.0);
            }
        }
    }

    #[test]
    fn clean_collections_are_left_alone(specs in proptest::collection::vec(row_spec(), 0..10), copies in 1usize..4) {
        let sheets = (0..copies).map(|_| build_sheet(&specs)).collect::<Vec<_>>();
        prop_assert_eq!(count_collisions(&sheets), 0);
        prop_assert_eq!(repair_collisions(sheets.clone()), sheets);
    }

    #[test]
    fn injected_duplicates_are_repaired(specs in proptest::collection::vec(row_spec(), 1..10), pick in 0usize..3) {
        let clean = build_sheet(&specs);
        // Give the first row the id of a column, or the second column the
        // first column's id, or the whole sheet a twin.
        let sheets = match pick {
            0 => {
                let column_id = clean.columns()[0].id().to_string();
                vec![with_json_edit(&clean, |v| v["rows"][0]["id"] = column_id.into())]
            }
            1 => {
                let column_id = clean.columns()[0].id().to_string();
                vec![with_json_edit(&clean, |v| v["columns"][1]["id"] = column_id.into())]
            }
            _ => vec![clean.clone(), clean.clone()],
        };
        prop_assert!(count_collisions(&sheets) > 0);

        let repaired = repair_collisions(sheets);
        prop_assert_eq!(count_collisions(&repaired), 0);
        assert_cell_keys_resolve(&repaired);
        prop_assert_eq!(repair_collisions(repaired.clone()), repaired);
    }
}
