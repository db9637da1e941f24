//! Engine configuration loading tests

mod common;

use brb_core::Column;
use brb_engine::new_joiner::RemovalCause;
use brb_engine::{EngineConfig, EngineError};
use common::ExtractBuilder;
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
        [mining]
        group_columns = ["supervisor_level6", "job_code"]
        min_group_size = 5

        [metrics]
        min_common_users = 3

        [[sod.rules]]
        a = "AR_CORE_1"
        b = "AR_CORE_2"
        severity = "high"
        reason = "Custody split"
        "#,
    );

    let config = EngineConfig::load(file.path()).unwrap();
    assert_eq!(config.mining.group_columns, vec![Column::SupervisorGroup, Column::JobCode]);
    assert_eq!(config.mining.min_group_size, 5);
    assert_eq!(config.metrics.min_common_users, 3);
    assert_eq!(config.metrics.overlap_top_n, 10);
    assert_eq!(config.sod.rules.len(), 1);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, EngineError::Io(_)));
}

#[test]
fn test_malformed_file_is_serialization_error() {
    let file = write_config("[mining\nmax_k = ");
    let err = EngineConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, EngineError::Serialization(_)));
}

#[test]
fn test_configured_rules_reach_recommender() {
    let file = write_config(
        r#"
        [[sod.rules]]
        a = "AR_CORE_1"
        b = "AR_CORE_2"
        severity = "HIGH"
        "#,
    );
    let config = EngineConfig::load(file.path()).unwrap();
    let ds = ExtractBuilder::new()
        .cohort("S1", "JC101", 10, 10, &["AR_CORE_1", "AR_CORE_2"])
        .build();

    let rows = config
        .new_joiner_recommender()
        .recommend(&ds, &config.new_joiner.request("JC101"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sod_removals[0].cause, RemovalCause::ExplicitRule);
}
