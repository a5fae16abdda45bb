mod common;

use std::fs;

use common::{LEDGER_CSV, TestWorkspace};
use predicates::prelude::*;
use predicates::str::contains;
use tracker_sheet::{
    model::Sheet,
    store::{FileStore, load_sheets},
};

fn stored_sheets(workspace: &TestWorkspace) -> Vec<Sheet> {
    load_sheets(&FileStore::new(workspace.store_path()))
}

fn import_ledger(workspace: &TestWorkspace) -> String {
    let csv_path = workspace.write("Odemeler.csv", LEDGER_CSV);
    workspace.run(&["import", "-i", csv_path.to_str().unwrap()])
}

#[test]
fn create_blank_and_list() {
    let workspace = TestWorkspace::new();
    let id = workspace.run(&["create"]);
    assert!(!id.is_empty());

    workspace
        .command()
        .arg("list")
        .assert()
        .success()
        .stdout(contains("Yeni Sayfa").and(contains(id.as_str())));

    let sheets = stored_sheets(&workspace);
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].columns().len(), 3);
}

#[test]
fn create_from_preset_with_name_and_color() {
    let workspace = TestWorkspace::new();
    workspace.run(&["create", "--preset", "fatura", "--name", "Mart", "--color", "red"]);
    let sheets = stored_sheets(&workspace);
    assert_eq!(sheets[0].name(), "Mart");
    assert_eq!(sheets[0].color().as_str(), "red");
    assert!(sheets[0].find_column("Fatura No").is_some());
}

#[test]
fn unknown_preset_and_color_fail() {
    let workspace = TestWorkspace::new();
    workspace
        .command()
        .args(["create", "--preset", "yok"])
        .assert()
        .failure()
        .stderr(contains("Unknown preset 'yok'"));
    workspace
        .command()
        .args(["create", "--color", "mor"])
        .assert()
        .failure()
        .stderr(contains("Supported colors"));
}

#[test]
fn import_show_search_and_sort() {
    let workspace = TestWorkspace::new();
    import_ledger(&workspace);

    workspace
        .command()
        .args(["show", "Odemeler"])
        .assert()
        .success()
        .stdout(contains("Ali").and(contains("Ayse")).and(contains("Toplam: 350")));

    workspace
        .command()
        .args(["show", "odemeler", "--search", "ay"])
        .assert()
        .success()
        .stdout(contains("Ayse").and(contains("Ali").not()).and(contains("Toplam: 250")));

    let sorted = workspace.run(&["show", "Odemeler", "--sort", "Tutar:desc"]);
    let ayse = sorted.find("Ayse").expect("Ayse listed");
    let ali = sorted.find("Ali").expect("Ali listed");
    assert!(ayse < ali);
}

#[test]
fn show_filters_on_select_columns_only() {
    let workspace = TestWorkspace::new();
    import_ledger(&workspace);

    workspace
        .command()
        .args(["show", "Odemeler", "--filter", "Durum=Odendi"])
        .assert()
        .success()
        .stdout(contains("Ali").and(contains("Ayse").not()));

    workspace
        .command()
        .args(["show", "Odemeler", "--filter", "Ad=Ali"])
        .assert()
        .failure()
        .stderr(contains("not a select column"));
}

#[test]
fn stats_reports_number_columns() {
    let workspace = TestWorkspace::new();
    import_ledger(&workspace);
    workspace
        .command()
        .args(["stats", "Odemeler"])
        .assert()
        .success()
        .stdout(contains("Tutar").and(contains("350")).and(contains("175")));
}

#[test]
fn add_column_and_row_then_export() {
    let workspace = TestWorkspace::new();
    import_ledger(&workspace);
    workspace.run(&[
        "add-column",
        "Odemeler",
        "--name",
        "Banka",
        "--type",
        "select",
        "--options",
        "Ziraat,Vakif",
    ]);
    workspace.run(&[
        "add-row",
        "Odemeler",
        "--set",
        "Ad=Cem",
        "--set",
        "Tutar=12,5",
        "--set",
        "Banka=Vakif",
    ]);

    let output = workspace.path().join("out.csv");
    workspace.run(&["export", "Odemeler", "-o", output.to_str().unwrap()]);
    let bytes = fs::read(&output).unwrap();
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "\"Ad\",\"Tutar\",\"Durum\",\"Banka\"");
    assert_eq!(lines[1], "\"Ali\",100,\"Odendi\",\"\"");
    assert_eq!(lines[3], "\"Cem\",12.5,\"\",\"Vakif\"");
}

#[test]
fn add_row_rejects_invalid_values() {
    let workspace = TestWorkspace::new();
    import_ledger(&workspace);
    workspace
        .command()
        .args(["add-row", "Odemeler", "--set", "Tutar=cok"])
        .assert()
        .failure()
        .stderr(contains("not a valid number value"));
    assert_eq!(stored_sheets(&workspace)[0].rows().len(), 2);
}

#[test]
fn export_defaults_to_sanitized_file_name() {
    let workspace = TestWorkspace::new();
    workspace.run(&["create", "--name", "Şube Gider/Özet"]);
    workspace.run(&["export", "Şube Gider/Özet"]);
    assert!(workspace.path().join("Şube_Gider_Özet.csv").exists());
}

#[test]
fn export_to_stdout() {
    let workspace = TestWorkspace::new();
    import_ledger(&workspace);
    workspace
        .command()
        .args(["export", "Odemeler", "-o", "-"])
        .assert()
        .success()
        .stdout(contains("\"Ayse\",250,\"Odenmedi\""));
}

#[test]
fn import_decodes_legacy_turkish_encoding() {
    let workspace = TestWorkspace::new();
    // "Şehir;Nüfus\nİzmir;4,4" in windows-1254
    let path = workspace.write_bytes("iller.csv", b"\xDEehir;N\xFCfus\n\xDDzmir;4,4\n");
    workspace.run(&[
        "import",
        "-i",
        path.to_str().unwrap(),
        "--input-encoding",
        "windows-1254",
    ]);
    let sheet = stored_sheets(&workspace).remove(0);
    assert_eq!(sheet.name(), "iller");
    assert_eq!(sheet.columns()[0].name(), "Şehir");
    let nufus = sheet.find_column("Nüfus").unwrap().id().to_string();
    assert_eq!(
        sheet.rows()[0].cell(&nufus).and_then(|c| c.as_number()),
        Some(4.4)
    );
}

#[test]
fn suggest_builds_sheet_from_fenced_json() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "oneri.txt",
        "```json\n{\"name\":\"Arac Takibi\",\"color\":\"lime\",\"columns\":[{\"name\":\"Plaka\",\"type\":\"text\"},{\"name\":\"Km\",\"type\":\"number\"},{\"name\":\"Durum\",\"type\":\"select\",\"options\":[\"Aktif\",\"Serviste\"]}]}\n```",
    );
    workspace.run(&["suggest", "-i", path.to_str().unwrap()]);
    let sheet = stored_sheets(&workspace).remove(0);
    assert_eq!(sheet.name(), "Arac Takibi");
    assert_eq!(sheet.columns().len(), 3);

    let bad = workspace.write("bozuk.txt", "tablo olusturamadim");
    workspace
        .command()
        .args(["suggest", "-i", bad.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("is not a schema suggestion"));
}

#[test]
fn copy_and_delete() {
    let workspace = TestWorkspace::new();
    import_ledger(&workspace);
    workspace.run(&["copy", "Odemeler"]);
    workspace.run(&["copy", "Odemeler", "--with-rows"]);

    let sheets = stored_sheets(&workspace);
    assert_eq!(sheets.len(), 3);
    assert_eq!(sheets[1].name(), "Odemeler (kopya)");
    assert!(sheets[1].rows().is_empty());
    assert_eq!(sheets[2].rows().len(), 2);

    let copy_id = sheets[1].id().to_string();
    workspace.run(&["delete", copy_id.as_str()]);
    assert_eq!(stored_sheets(&workspace).len(), 2);

    workspace
        .command()
        .args(["delete", "yok"])
        .assert()
        .failure()
        .stderr(contains("Sheet 'yok' not found"));
}

#[test]
fn repair_rewrites_duplicated_ids() {
    let workspace = TestWorkspace::new();
    import_ledger(&workspace);
    let raw = fs::read_to_string(workspace.store_path()).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let twin = value[0].clone();
    value.as_array_mut().unwrap().push(twin);
    fs::write(workspace.store_path(), value.to_string()).unwrap();

    workspace.run(&["repair"]);

    let raw = fs::read_to_string(workspace.store_path()).unwrap();
    let sheets: Vec<Sheet> = serde_json::from_str(&raw).unwrap();
    assert_eq!(sheets.len(), 2);
    assert_ne!(sheets[0].id(), sheets[1].id());
    assert_ne!(sheets[0].columns()[0].id(), sheets[1].columns()[0].id());
}

#[test]
fn malformed_store_reads_as_empty() {
    let workspace = TestWorkspace::new();
    fs::write(workspace.store_path(), "not json").unwrap();
    workspace
        .command()
        .arg("list")
        .assert()
        .success()
        .stdout(contains("id").and(contains("name")));
}

#[test]
fn config_file_supplies_store_and_inference() {
    let workspace = TestWorkspace::new();
    let config = workspace.write(
        "tracker.yaml",
        "store: ayarli.json\ninference:\n  label_column_select: true\n",
    );
    let csv_path = workspace.write("durum.csv", "Durum,Not\nAcik,x\nKapali,y\n");

    let mut cmd = assert_cmd::Command::cargo_bin("tracker-sheet").unwrap();
    cmd.current_dir(workspace.path())
        .args(["--config", config.to_str().unwrap(), "import", "-i"])
        .arg(&csv_path)
        .assert()
        .success();

    let sheets = load_sheets(&FileStore::new(workspace.path().join("ayarli.json")));
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].columns()[0].column_type().as_str(), "select");

    workspace
        .command()
        .args(["--config", config.to_str().unwrap(), "config"])
        .assert()
        .success()
        .stdout(contains("label_column_select: true"));
}

#[test]
fn missing_config_file_fails() {
    let workspace = TestWorkspace::new();
    workspace
        .command()
        .args(["--config", "yok.yaml", "list"])
        .assert()
        .failure()
        .stderr(contains("Opening config file"));
}
