use std::io::Write;
use std::path::PathBuf;

use assert_cmd::cargo_bin_cmd;
use predicates::prelude::*;

fn fixture(name: &str) -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures")
        .join(name)
}

fn fixture_arg(name: &str) -> String {
    fixture(name).to_str().unwrap().to_string()
}

#[test]
fn cli_analyze_prints_text_report_and_exits_0() {
    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.args(["--no-color", "analyze", fixture_arg("sample_rules.hsf").as_str()]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Rules without ArtifactSet: 2 out of 5",
        ))
        .stdout(predicate::str::contains("  Indices: [2, 4]"))
        .stdout(predicate::str::contains("Has BOM: yes"))
        .stderr(predicate::str::contains("OK"));
}

#[test]
fn cli_analyse_alias_is_accepted() {
    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.args(["analyse", fixture_arg("sample_rules.hsf").as_str()]);
    cmd.assert().success();
}

#[test]
fn cli_analyze_json_is_machine_readable() {
    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.args([
        "analyze",
        fixture_arg("sample_rules.hsf").as_str(),
        "--format",
        "json",
    ]);

    let out = cmd.assert().success().get_output().stdout.clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["findings"]["rule_count"], 5);
    assert_eq!(v["inputs"]["has_bom"], true);
    assert_eq!(v["findings"]["condition_values"], serde_json::json!(["", "hp>50"]));
    assert_eq!(
        v["findings"]["artifact_type_shape"]["first_violation"]["value"],
        "Boots"
    );
}

#[test]
fn cli_analyze_runs_only_selected_passes() {
    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.args([
        "analyze",
        fixture_arg("sample_rules.hsf").as_str(),
        "--pass",
        "rule-keys",
        "--format",
        "markdown",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("## Keys"))
        .stdout(predicate::str::contains("## Value domains").not());
}

#[test]
fn cli_fields_lists_value_sets() {
    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.args(["fields", fixture_arg("sample_rules.hsf").as_str()]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "All Condition values: [\"\", \"hp>50\"]",
        ))
        .stdout(predicate::str::contains("All Faction values: [0, 2, 11]"))
        .stdout(predicate::str::contains("Rules where ArtifactType is not array: [3]"))
        .stdout(predicate::str::contains("Has BOM").not());
}

#[test]
fn cli_structure_shows_top_level_layout() {
    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.args(["structure", fixture_arg("sample_rules.hsf").as_str()]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Has BOM: yes"))
        .stdout(predicate::str::contains(
            "Top-level keys: [\"Version\", \"Rules\"]",
        ))
        .stdout(predicate::str::contains("Number of rules: 5"))
        .stdout(predicate::str::contains("Second rule:"));
}

#[test]
fn cli_raw_dumps_bytes_and_samples() {
    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.args(["raw", fixture_arg("sample_rules.hsf").as_str()]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("File size: 1089 bytes"))
        .stdout(predicate::str::contains("First bytes: b\"\\xef\\xbb\\xbf{\\n"))
        .stdout(predicate::str::contains("ArtifactSet is always array when present"))
        .stdout(predicate::str::contains("First rule without ArtifactSet (index 2)"))
        .stdout(predicate::str::contains(
            "First rule with substat conditions (index 2)",
        ));
}

#[test]
fn cli_skipped_pass_exits_2_after_printing() {
    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.args(["--no-color", "analyze", fixture_arg("broken_rules.hsf").as_str()]);

    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains("Rules without ArtifactSet: 0 out of 2"))
        .stderr(predicate::str::contains("pass skipped field-domains"))
        .stderr(predicate::str::contains("`Faction`"));
}

#[test]
fn cli_errors_on_missing_input() {
    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.args(["analyze", "does-not-exist.hsf"]);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read does-not-exist.hsf"));
}

#[test]
fn cli_default_path_is_the_sample_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.current_dir(dir.path()).arg("fields");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains(
            "data/panda_ultraendgame_farming_v1.hsf",
        ));
}

#[test]
fn cli_errors_on_malformed_json() {
    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.args(["structure", fixture_arg("truncated.hsf").as_str()]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("malformed JSON"));
}

#[test]
fn cli_errors_when_rules_is_missing() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, r#"{{"Version": 1}}"#).unwrap();

    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.args(["analyze", f.path().to_str().unwrap()]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("`Rules`"));
}

#[test]
fn cli_rejects_unknown_pass() {
    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.args([
        "analyze",
        fixture_arg("sample_rules.hsf").as_str(),
        "--pass",
        "hexdump",
    ]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("unknown pass `hexdump`"));
}

#[test]
fn cli_reads_settings_from_config_file() {
    let mut cfg = tempfile::NamedTempFile::new().unwrap();
    write!(
        cfg,
        "path = {:?}\nformat = \"json\"\npasses = [\"missing-fields\"]\n",
        fixture_arg("sample_rules.hsf")
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.args(["analyze", "--config", cfg.path().to_str().unwrap()]);

    let out = cmd.assert().success().get_output().stdout.clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["findings"]["passes_run"], serde_json::json!(["missing-fields"]));
    assert!(v["findings"].get("rule_keys").is_none());
}

#[test]
fn cli_fails_on_malformed_config_in_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("hsfscan.toml"),
        "format = \"json\"\npasses = [\"missing-fields\"\n",
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("hsfscan");
    cmd.current_dir(dir.path());
    cmd.args(["--no-color", "analyze", fixture_arg("sample_rules.hsf").as_str()]);
    cmd.assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("parse hsfscan.toml"));
}
