//! Tests for src/config.rs
//! Testing library/framework: Rust built-in test framework; tempfile for the
//! save round-trip.

use stagekeeper::StagekeeperConfig;

#[test]
fn defaults_carry_the_two_conventional_staging_labels() {
    let config = StagekeeperConfig::default();
    assert_eq!(config.staging.default_labels, vec!["A", "B"]);
    assert_eq!(config.observability.log_level, "info");
    assert!(config.observability.structured_logging);
}

#[test]
fn environment_variables_override_the_defaults() {
    // One test owns every STAGEKEEPER_ variable so parallel tests never see
    // a half-configured environment
    std::env::set_var("STAGEKEEPER_OBSERVABILITY__LOG_LEVEL", "debug");
    std::env::set_var("STAGEKEEPER_OBSERVABILITY__STRUCTURED_LOGGING", "false");
    std::env::set_var("STAGEKEEPER_STAGING__DEFAULT_LABELS", "review-1,review-2");

    let config = StagekeeperConfig::load().expect("load");

    std::env::remove_var("STAGEKEEPER_OBSERVABILITY__LOG_LEVEL");
    std::env::remove_var("STAGEKEEPER_OBSERVABILITY__STRUCTURED_LOGGING");
    std::env::remove_var("STAGEKEEPER_STAGING__DEFAULT_LABELS");

    assert_eq!(config.observability.log_level, "debug");
    assert!(!config.observability.structured_logging);
    assert_eq!(config.staging.default_labels, vec!["review-1", "review-2"]);
}

#[test]
fn config_round_trips_through_a_toml_file() {
    let mut config = StagekeeperConfig::default();
    config.staging.default_labels = vec!["review-1".to_string(), "review-2".to_string()];
    config.observability.log_level = "debug".to_string();

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stagekeeper.toml");
    config.save_to_file(&path).expect("save");

    let raw = std::fs::read_to_string(&path).expect("read");
    let reloaded: StagekeeperConfig = toml::from_str(&raw).expect("parse");
    assert_eq!(
        reloaded.staging.default_labels,
        vec!["review-1", "review-2"]
    );
    assert_eq!(reloaded.observability.log_level, "debug");
}
