use std::io::Write;

use hsfscan_core::analyze::{Pass, PassSet};
use hsfscan_core::config::{AnalyzeOptions, Config, CONFIG_FILE_NAME, DEFAULT_SAMPLE_PATH};

#[test]
fn parse_valid_toml() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(
        f,
        r#"
path = "data/other.hsf"
passes = ["missing-fields", "condition-values"]
format = "json"
"#
    )
    .unwrap();

    let cfg = Config::load(f.path()).unwrap();
    assert_eq!(cfg.path.as_deref(), Some(std::path::Path::new("data/other.hsf")));
    assert_eq!(cfg.format.as_deref(), Some("json"));
    assert_eq!(
        cfg.pass_set().unwrap(),
        PassSet::only([Pass::MissingFields, Pass::ConditionValues])
    );
}

#[test]
fn parse_empty_toml_gives_defaults() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "").unwrap();

    let cfg = Config::load(f.path()).unwrap();
    assert_eq!(cfg.path, None);
    assert!(cfg.passes.is_empty());
    assert_eq!(cfg.format, None);
    assert_eq!(cfg.pass_set().unwrap(), PassSet::all());
}

#[test]
fn parse_invalid_toml_returns_error() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "this is not valid [ toml {{{{").unwrap();

    assert!(Config::load(f.path()).is_err());
}

#[test]
fn unknown_pass_name_is_rejected() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, r#"passes = ["hexdump"]"#).unwrap();

    let cfg = Config::load(f.path()).unwrap();
    let msg = format!("{:#}", cfg.pass_set().unwrap_err());
    assert!(msg.contains("unknown pass `hexdump`"));
}

#[test]
fn unknown_keys_are_rejected() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, r#"budget_ratio = 1.5"#).unwrap();

    assert!(Config::load(f.path()).is_err());
}

#[test]
fn default_options_point_at_the_sample_file() {
    let opts = AnalyzeOptions::default();
    assert_eq!(opts.path, std::path::Path::new(DEFAULT_SAMPLE_PATH));
    assert_eq!(opts.passes, PassSet::all());
}

#[test]
fn discover_without_config_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::discover_in(dir.path()).unwrap().is_none());
}

#[test]
fn discover_reads_the_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "format = \"markdown\"\n").unwrap();

    let cfg = Config::discover_in(dir.path()).unwrap().unwrap();
    assert_eq!(cfg.format.as_deref(), Some("markdown"));
}

#[test]
fn discover_surfaces_a_malformed_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "format = \"json\"\npasses = [\"rule-keys\"\n",
    )
    .unwrap();

    let err = Config::discover_in(dir.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("parse"));
    assert!(format!("{:#}", err).contains(CONFIG_FILE_NAME));
}
