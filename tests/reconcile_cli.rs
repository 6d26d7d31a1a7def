mod common;

use std::path::Path;

use assert_cmd::Command;
use common::TestWorkspace;
use csv::ReaderBuilder;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

const CONFIG: &str = "sheets:\n\
                      \x20 - name: People\n\
                      \x20   key: id\n\
                      \x20   columns: [name, city]\n";

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .expect("open output csv");
    let headers = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| {
            record
                .expect("record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect();
    (headers, rows)
}

fn reconcile_workspace() -> TestWorkspace {
    let workspace = TestWorkspace::new();
    workspace.write(
        "input/alpha.csv",
        "id,name,city\n1,Alice,Utrecht\n2,Bob,Delft\n",
    );
    workspace.write(
        "input/beta.csv",
        "id,name,city\n1,Alice,Utrecht\n3,Carol,Leiden\n",
    );
    workspace.write("config.yaml", CONFIG);
    workspace
}

fn run_reconcile(workspace: &TestWorkspace) -> assert_cmd::assert::Assert {
    Command::cargo_bin("csv-reconcile")
        .expect("binary exists")
        .args([
            "reconcile",
            "-i",
            workspace.path().join("input").to_str().unwrap(),
            "-o",
            workspace.path().join("output").to_str().unwrap(),
            "-c",
            workspace.path().join("config.yaml").to_str().unwrap(),
        ])
        .assert()
}

#[test]
fn reconcile_writes_the_sheet_in_presentation_order_without_bronmatch() {
    let workspace = reconcile_workspace();
    run_reconcile(&workspace).success().stdout(contains("People"));

    let (headers, rows) = read_csv(&workspace.path().join("output/data/People.csv"));
    assert_eq!(
        headers,
        [
            "Key",
            "Aanwezig_alpha",
            "Aanwezig_beta",
            "Match_Key",
            "alpha_Key",
            "beta_Key",
            "alpha_name",
            "beta_name",
            "Match_name",
            "alpha_city",
            "beta_city",
            "Match_city",
        ]
    );
    assert_eq!(rows.len(), 3);

    let row1 = rows.iter().find(|row| row[0] == "1").expect("key 1");
    assert_eq!(row1[1], "yes");
    assert_eq!(row1[2], "yes");
    assert_eq!(row1[3], "yes");
    assert_eq!(row1[8], "yes");
    assert_eq!(row1[11], "yes");

    let row2 = rows.iter().find(|row| row[0] == "2").expect("key 2");
    assert_eq!(row2[1], "yes");
    assert_eq!(row2[2], "no");
    assert_eq!(row2[3], "no");
    // The absent source's cells stay empty.
    assert_eq!(row2[5], "");
    assert_eq!(row2[7], "");
    assert_eq!(row2[8], "no");
}

#[test]
fn reconcile_writes_the_summary_report() {
    let workspace = reconcile_workspace();
    run_reconcile(&workspace).success();

    let (headers, rows) = read_csv(&workspace.path().join("output/reports/summary.csv"));
    assert_eq!(headers, ["Sheet", "Totaal", "Matches", "Mismatches"]);
    assert_eq!(rows, vec![vec!["People", "3", "1", "2"]]);
}

#[test]
fn reconcile_writes_dashboard_and_log_reports() {
    let workspace = reconcile_workspace();
    run_reconcile(&workspace).success();

    let (headers, rows) = read_csv(&workspace.path().join("output/reports/dashboard.csv"));
    assert_eq!(
        headers,
        [
            "Sheet",
            "Bron",
            "Rijen",
            "Kolommen",
            "KeyKolom",
            "Key_NonNull",
            "Key_Null",
            "Key_Uniek",
            "Key_Duplicaten",
        ]
    );
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][1], "alpha");
    assert_eq!(rows[0][2], "2");
    assert_eq!(rows[0][3], "3");
    assert_eq!(rows[1][1], "beta");

    let (log_headers, log_rows) = read_csv(&workspace.path().join("output/reports/logs.csv"));
    assert_eq!(log_headers, ["Tijd", "Niveau", "Bericht"]);
    assert!(
        log_rows
            .iter()
            .any(|row| row[2].contains("People") && row[2].contains("1 matches"))
    );
}

#[test]
fn a_clean_run_reports_no_duplicates() {
    let workspace = reconcile_workspace();
    run_reconcile(&workspace).success();

    let (headers, rows) = read_csv(&workspace.path().join("output/reports/duplicates.csv"));
    assert_eq!(headers, ["Info"]);
    assert_eq!(rows.len(), 1);
    assert!(rows[0][0].contains("No duplicate keys"));
}

#[test]
fn duplicate_keys_in_a_source_land_in_the_duplicates_report() {
    let workspace = TestWorkspace::new();
    workspace.write(
        "input/alpha.csv",
        "id,name,city\n1,Alice,Utrecht\n1,Alice,Utrecht\n2,Bob,Delft\n",
    );
    workspace.write("config.yaml", CONFIG);
    run_reconcile(&workspace).success();

    let (headers, rows) = read_csv(&workspace.path().join("output/reports/duplicates.csv"));
    assert_eq!(headers, ["Sheet", "Bron", "Key", "Aantal"]);
    assert_eq!(rows, vec![vec!["People", "alpha", "1", "2"]]);
}

#[test]
fn bundle_directories_provide_one_file_per_sheet() {
    let workspace = TestWorkspace::new();
    workspace.write("input/alpha.csv", "id,name,city\n1,Alice,Utrecht\n");
    workspace.write("input/dwh/People.csv", "id,name,city\n1,Alice,Utrecht\n");
    workspace.write("config.yaml", CONFIG);
    run_reconcile(&workspace).success();

    let (headers, rows) = read_csv(&workspace.path().join("output/data/People.csv"));
    assert!(headers.contains(&"Aanwezig_dwh".to_string()));
    let row = &rows[0];
    let presence_alpha = headers.iter().position(|h| h == "Aanwezig_alpha").unwrap();
    let presence_dwh = headers.iter().position(|h| h == "Aanwezig_dwh").unwrap();
    assert_eq!(row[presence_alpha], "yes");
    assert_eq!(row[presence_dwh], "yes");
}

#[test]
fn a_source_that_lacks_the_sheet_collapses_to_absent_rows() {
    let workspace = TestWorkspace::new();
    workspace.write("input/alpha.csv", "id,name,city\n1,Alice,Utrecht\n");
    workspace.write("input/leeg/Anders.csv", "id\n9\n");
    workspace.write("config.yaml", CONFIG);
    run_reconcile(&workspace).success();

    let (headers, rows) = read_csv(&workspace.path().join("output/data/People.csv"));
    let presence_leeg = headers.iter().position(|h| h == "Aanwezig_leeg").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][presence_leeg], "no");

    let (_, summary_rows) = read_csv(&workspace.path().join("output/reports/summary.csv"));
    assert_eq!(summary_rows, vec![vec!["People", "1", "0", "1"]]);
}

#[test]
fn an_empty_input_directory_aborts_the_run() {
    let workspace = TestWorkspace::new();
    workspace.mkdir("input");
    workspace.write("config.yaml", CONFIG);

    run_reconcile(&workspace)
        .failure()
        .stderr(contains("No source files"));
}

#[test]
fn a_config_without_valid_sheets_aborts_the_run() {
    let workspace = TestWorkspace::new();
    workspace.write("input/alpha.csv", "id,name,city\n1,Alice,Utrecht\n");
    workspace.write("config.yaml", "sheets: []\n");

    run_reconcile(&workspace)
        .failure()
        .stderr(contains("No valid sheet configuration"));
}

#[test]
fn check_lists_the_configured_sheets_and_sources() {
    let workspace = reconcile_workspace();
    Command::cargo_bin("csv-reconcile")
        .expect("binary exists")
        .args([
            "check",
            "-c",
            workspace.path().join("config.yaml").to_str().unwrap(),
            "-i",
            workspace.path().join("input").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("People").and(contains("alpha")));
}
