//! Logging setup
//!
//! `RUST_LOG` selects the filter (default `info,colquery=debug`). When
//! `COLQUERY_LOG_FILE` names a path, log output is appended to that file
//! instead of stderr.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ConnectorError, Result};

/// Environment variable naming the log file
pub const LOG_FILE_ENV: &str = "COLQUERY_LOG_FILE";

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "info,colquery=debug";

/// Install the global subscriber, honoring `COLQUERY_LOG_FILE`
pub fn init_logging() -> Result<()> {
    init_logging_to(log_file_from_env())
}

/// Install the global subscriber, writing to `log_file` if given
pub fn init_logging_to(log_file: Option<PathBuf>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    let installed = match &log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| ConnectorError::Logging(e.to_string()))?;

    if let Some(path) = log_file {
        tracing::info!("Logging to {}", path.display());
    }
    Ok(())
}

/// Path from `COLQUERY_LOG_FILE`, ignoring an empty value
pub fn log_file_from_env() -> Option<PathBuf> {
    std::env::var_os(LOG_FILE_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Open a log file for append, creating it if missing
pub fn open_log_file(path: &Path) -> Result<File> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_open_log_file_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("connector.log");

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn test_open_log_file_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-such-dir").join("connector.log");
        assert!(matches!(open_log_file(&path), Err(ConnectorError::Io(_))));
    }
}
