//! Configuration for colquery
//!
//! Centralized configuration with sensible defaults. A connector is
//! normally configured from the ordered key/value entries handed to
//! [`Connector::init`](crate::Connector::init); the builder exists for
//! embedding and tests.

use std::time::Duration;

use crate::error::{ConnectorError, Result};

/// Key holding the store endpoint address
pub const ENDPOINT_KEY: &str = "endpoint";

/// Key holding the maximum number of cell versions per fetch
pub const MAX_VERSIONS_KEY: &str = "max_versions";

/// Key holding the per-operation wait timeout in milliseconds (0 = unbounded)
pub const REQUEST_TIMEOUT_KEY: &str = "request_timeout_ms";

/// Key holding an override for the address grammar
pub const COMMAND_PATTERN_KEY: &str = "command_pattern";

/// Default number of historical versions fetched per column
pub const DEFAULT_MAX_VERSIONS: u32 = 10;

/// Logged in place of values under keys this crate does not interpret
pub const REDACTED: &str = "<redacted>";

const KNOWN_KEYS: [&str; 4] = [
    ENDPOINT_KEY,
    MAX_VERSIONS_KEY,
    REQUEST_TIMEOUT_KEY,
    COMMAND_PATTERN_KEY,
];

/// A single configuration pair supplied at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Value safe to write to logs
    ///
    /// Entries under unknown keys are passed through untouched and may carry
    /// credentials, so only well-known keys show their value.
    pub fn loggable_value(&self) -> &str {
        if KNOWN_KEYS.contains(&self.key.as_str()) {
            self.value.as_str()
        } else {
            REDACTED
        }
    }
}

/// Main configuration for a connector
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Store endpoint (e.g. a coordination quorum like `localhost:2181`).
    /// Resolved per request; a missing endpoint fails the request, not init.
    pub endpoint: Option<String>,

    /// Max versions requested for each column
    pub max_versions: u32,

    // -------------------------------------------------------------------------
    // Bridge Configuration
    // -------------------------------------------------------------------------
    /// Bound on each bridged data-operation wait. `None` waits until the
    /// callback fires. Client teardown is never bounded.
    pub request_timeout: Option<Duration>,

    // -------------------------------------------------------------------------
    // Parser Configuration
    // -------------------------------------------------------------------------
    /// Replacement for the built-in address grammar
    pub command_pattern: Option<String>,

    // -------------------------------------------------------------------------
    // Raw Entries
    // -------------------------------------------------------------------------
    /// Every entry as supplied, in order
    pub entries: Vec<ConfigEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            max_versions: DEFAULT_MAX_VERSIONS,
            request_timeout: None,
            command_pattern: None,
            entries: Vec::new(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Build a config from ordered key/value entries
    ///
    /// Later entries win over earlier ones with the same key. Unknown keys
    /// are kept in [`Config::entries`] and otherwise ignored.
    pub fn from_entries(entries: &[ConfigEntry]) -> Result<Self> {
        let mut config = Config::default();

        for entry in entries {
            tracing::debug!("config {} = {}", entry.key, entry.loggable_value());

            match entry.key.as_str() {
                ENDPOINT_KEY => config.endpoint = Some(entry.value.clone()),
                MAX_VERSIONS_KEY => {
                    config.max_versions = check_max_versions(parse_number::<u32>(entry)?)?;
                }
                REQUEST_TIMEOUT_KEY => {
                    let ms = parse_number::<u64>(entry)?;
                    config.request_timeout = (ms > 0).then(|| Duration::from_millis(ms));
                }
                COMMAND_PATTERN_KEY => config.command_pattern = Some(entry.value.clone()),
                _ => {}
            }
        }

        config.entries = entries.to_vec();
        Ok(config)
    }

    /// Look up a raw entry by key (last occurrence wins)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }
}

fn check_max_versions(versions: u32) -> Result<u32> {
    if versions == 0 {
        return Err(ConnectorError::Config(format!(
            "{} must be at least 1",
            MAX_VERSIONS_KEY
        )));
    }
    Ok(versions)
}

fn parse_number<T: std::str::FromStr>(entry: &ConfigEntry) -> Result<T> {
    entry.value.trim().parse::<T>().map_err(|_| {
        ConnectorError::Config(format!(
            "{} expects a non-negative integer, got {:?}",
            entry.key, entry.value
        ))
    })
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the store endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    /// Set the max versions fetched per column
    pub fn max_versions(mut self, versions: u32) -> Self {
        self.config.max_versions = versions;
        self
    }

    /// Bound every bridged wait
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    /// Override the address grammar
    pub fn command_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.command_pattern = Some(pattern.into());
        self
    }

    /// Validate and return the config; rejects the same values as
    /// [`Config::from_entries`]
    pub fn build(self) -> Result<Config> {
        check_max_versions(self.config.max_versions)?;
        Ok(self.config)
    }
}
