mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::TestWorkspace;
use csv_probe::schema::{ColumnType, Schema};
use encoding_rs::WINDOWS_1252;
use predicates::str::contains;

fn column_types(schema: &Schema) -> Vec<ColumnType> {
    schema.columns.iter().map(|col| col.datatype).collect()
}

#[test]
fn probe_writes_a_loadable_schema() {
    let ws = TestWorkspace::new();
    let input = ws.write(
        "orders.csv",
        "id,amount,flag\n3,42.5,true\n4,13.37,false\n7,9.25,yes\n",
    );
    let schema_path = ws.path().join("orders-schema.yml");

    cargo_bin_cmd!("csv-probe")
        .args([
            "probe",
            "-i",
            input.to_str().unwrap(),
            "-s",
            schema_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let schema = Schema::load(&schema_path).expect("load inferred schema");
    assert!(schema.has_headers);
    assert_eq!(schema.headers(), ["id", "amount", "flag"]);
    assert_eq!(
        column_types(&schema),
        [ColumnType::Int8, ColumnType::Float64, ColumnType::Boolean]
    );
}

#[test]
fn probe_sampling_can_limit_type_detection() {
    let ws = TestWorkspace::new();
    let input = ws.write("mixed.csv", "code\n5\n12\noops\n");

    let sampled_path = ws.path().join("sampled-schema.yml");
    cargo_bin_cmd!("csv-probe")
        .args([
            "probe",
            "-i",
            input.to_str().unwrap(),
            "-s",
            sampled_path.to_str().unwrap(),
            "--has-header",
            "--sample-rows",
            "2",
        ])
        .assert()
        .success();
    let sampled = Schema::load(&sampled_path).expect("load sampled schema");
    assert_eq!(column_types(&sampled), [ColumnType::Int8]);

    let full_path = ws.path().join("full-schema.yml");
    cargo_bin_cmd!("csv-probe")
        .args([
            "probe",
            "-i",
            input.to_str().unwrap(),
            "-s",
            full_path.to_str().unwrap(),
            "--has-header",
            "--sample-rows",
            "0",
        ])
        .assert()
        .success();
    let full = Schema::load(&full_path).expect("load full-scan schema");
    assert_eq!(column_types(&full), [ColumnType::String]);
}

#[test]
fn probe_honors_input_encoding() {
    let ws = TestWorkspace::new();
    let content = "name,qty\nCaf\u{e9},3\n";
    let (encoded, _, _) = WINDOWS_1252.encode(content);
    let input = ws.write_bytes("encoded.csv", &encoded);
    let schema_path = ws.path().join("encoded-schema.yml");

    cargo_bin_cmd!("csv-probe")
        .args([
            "probe",
            "-i",
            input.to_str().unwrap(),
            "-s",
            schema_path.to_str().unwrap(),
            "--encoding",
            "windows-1252",
            "--has-header",
        ])
        .assert()
        .success();

    let schema = Schema::load(&schema_path).expect("load encoded schema");
    assert_eq!(schema.headers(), ["name", "qty"]);
    assert_eq!(column_types(&schema), [ColumnType::String, ColumnType::Int8]);
}

#[test]
fn probe_type_overrides_rewrite_columns() {
    let ws = TestWorkspace::new();
    let input = ws.write("orders.csv", "id,amount,flag\n3,42.5,true\n4,13.37,false\n");
    let schema_path = ws.path().join("overridden-schema.yml");

    cargo_bin_cmd!("csv-probe")
        .args([
            "probe",
            "-i",
            input.to_str().unwrap(),
            "-s",
            schema_path.to_str().unwrap(),
            "--has-header",
            "--types",
            "#1:int64",
            "--types",
            "amount:string",
        ])
        .assert()
        .success();

    let schema = Schema::load(&schema_path).expect("load overridden schema");
    assert_eq!(
        column_types(&schema),
        [ColumnType::Int64, ColumnType::String, ColumnType::Boolean]
    );
}

#[test]
fn probe_json_emits_schema_and_counts() {
    let ws = TestWorkspace::new();
    let input = ws.write("orders.csv", "id,amount\n3,42.5\n4,13.37\n7,9.25\n");

    cargo_bin_cmd!("csv-probe")
        .args(["probe", "-i", input.to_str().unwrap(), "--json"])
        .assert()
        .success()
        .stdout(contains("\"columns\""))
        .stdout(contains("\"rows_read\": 3"));
}

#[test]
fn probe_fixed_columns_rejects_ragged_input() {
    let ws = TestWorkspace::new();
    let input = ws.write("ragged.csv", "a,b\n1,2\n3\n");

    cargo_bin_cmd!("csv-probe")
        .args([
            "probe",
            "-i",
            input.to_str().unwrap(),
            "--has-header",
            "--fixed-columns",
        ])
        .assert()
        .failure()
        .stderr(contains("field(s)"));
}

#[test]
fn probe_reads_stdin() {
    cargo_bin_cmd!("csv-probe")
        .args(["probe", "-i", "-", "--no-header"])
        .write_stdin("7,needle,3.5\n")
        .assert()
        .success()
        .stdout(contains("field_0"))
        .stdout(contains("needle"))
        .stdout(contains("float64"));
}

#[test]
fn probe_zero_one_columns_stay_integer_by_default() {
    let ws = TestWorkspace::new();
    let input = ws.write("toggles.csv", "seen\n0\n1\n");
    let schema_path = ws.path().join("toggles-schema.yml");

    cargo_bin_cmd!("csv-probe")
        .args([
            "probe",
            "-i",
            input.to_str().unwrap(),
            "-s",
            schema_path.to_str().unwrap(),
            "--has-header",
        ])
        .assert()
        .success();
    let schema = Schema::load(&schema_path).expect("load default schema");
    assert_eq!(column_types(&schema), [ColumnType::Int8]);

    // opting in to the integer family flips the same column to boolean
    cargo_bin_cmd!("csv-probe")
        .args([
            "probe",
            "-i",
            input.to_str().unwrap(),
            "-s",
            schema_path.to_str().unwrap(),
            "--has-header",
            "--booleans",
            "integer",
        ])
        .assert()
        .success();
    let schema = Schema::load(&schema_path).expect("load opt-in schema");
    assert_eq!(column_types(&schema), [ColumnType::Boolean]);
}
