//! Config Tests

use std::time::Duration;

use colquery::config::{
    Config, ConfigEntry, COMMAND_PATTERN_KEY, DEFAULT_MAX_VERSIONS, ENDPOINT_KEY,
    MAX_VERSIONS_KEY, REDACTED, REQUEST_TIMEOUT_KEY,
};
use colquery::ConnectorError;

#[test]
fn test_defaults() {
    let config = Config::default();

    assert_eq!(config.endpoint, None);
    assert_eq!(config.max_versions, DEFAULT_MAX_VERSIONS);
    assert_eq!(config.request_timeout, None);
    assert_eq!(config.command_pattern, None);
}

#[test]
fn test_from_entries_reads_known_keys() {
    let entries = vec![
        ConfigEntry::new(ENDPOINT_KEY, "zk1:2181,zk2:2181"),
        ConfigEntry::new(MAX_VERSIONS_KEY, "3"),
        ConfigEntry::new(REQUEST_TIMEOUT_KEY, "250"),
        ConfigEntry::new(COMMAND_PATTERN_KEY, "custom"),
        ConfigEntry::new("client.name", "reporting"),
    ];
    let config = Config::from_entries(&entries).unwrap();

    assert_eq!(config.endpoint.as_deref(), Some("zk1:2181,zk2:2181"));
    assert_eq!(config.max_versions, 3);
    assert_eq!(config.request_timeout, Some(Duration::from_millis(250)));
    assert_eq!(config.command_pattern.as_deref(), Some("custom"));
    assert_eq!(config.get("client.name"), Some("reporting"));
    assert_eq!(config.entries, entries);
}

#[test]
fn test_later_entries_win() {
    let entries = vec![
        ConfigEntry::new(ENDPOINT_KEY, "first:2181"),
        ConfigEntry::new(ENDPOINT_KEY, "second:2181"),
    ];
    let config = Config::from_entries(&entries).unwrap();

    assert_eq!(config.endpoint.as_deref(), Some("second:2181"));
    assert_eq!(config.get(ENDPOINT_KEY), Some("second:2181"));
}

#[test]
fn test_zero_timeout_means_unbounded() {
    let config =
        Config::from_entries(&[ConfigEntry::new(REQUEST_TIMEOUT_KEY, "0")]).unwrap();
    assert_eq!(config.request_timeout, None);
}

#[test]
fn test_invalid_numbers_rejected() {
    for (key, value) in [
        (MAX_VERSIONS_KEY, "ten"),
        (MAX_VERSIONS_KEY, "0"),
        (MAX_VERSIONS_KEY, "-1"),
        (REQUEST_TIMEOUT_KEY, "1.5"),
    ] {
        let result = Config::from_entries(&[ConfigEntry::new(key, value)]);
        match result {
            Err(e @ ConnectorError::Config(_)) => assert!(e.is_fatal()),
            other => panic!("Expected Config error for {}={}, got {:?}", key, value, other),
        }
    }
}

#[test]
fn test_builder() {
    let config = Config::builder()
        .endpoint("localhost:2181")
        .max_versions(1)
        .request_timeout(Duration::from_secs(2))
        .command_pattern("p")
        .build()
        .unwrap();

    assert_eq!(config.endpoint.as_deref(), Some("localhost:2181"));
    assert_eq!(config.max_versions, 1);
    assert_eq!(config.request_timeout, Some(Duration::from_secs(2)));
    assert_eq!(config.command_pattern.as_deref(), Some("p"));
}

#[test]
fn test_builder_rejects_zero_max_versions() {
    let result = Config::builder()
        .endpoint("localhost:2181")
        .max_versions(0)
        .build();

    assert!(matches!(result, Err(ConnectorError::Config(_))));
}

#[test]
fn test_loggable_value_redacts_unknown_keys() {
    let endpoint = ConfigEntry::new(ENDPOINT_KEY, "localhost:2181");
    let timeout = ConfigEntry::new(REQUEST_TIMEOUT_KEY, "250");
    let secret = ConfigEntry::new("auth.password", "hunter2");

    assert_eq!(endpoint.loggable_value(), "localhost:2181");
    assert_eq!(timeout.loggable_value(), "250");
    assert_eq!(secret.loggable_value(), REDACTED);
}
