//! Logging setup: a human-readable stderr layer plus JSONL log files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

const LOG_PATH_ENV: &str = "SIMCHECK_LOG_PATH";
const LOG_DIR_ENV: &str = "SIMCHECK_LOG_DIR";
const LOG_FILE_PREFIX: &str = "simcheck";
const LOG_FILE_SUFFIX: &str = "jsonl";

/// Where JSONL logs go.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// Explicit log file; wins over `log_dir`.
    pub log_path: Option<PathBuf>,
    /// Directory for daily rolling log files.
    pub log_dir: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Resolve log destinations: environment first, then the configured
    /// directory, then the platform data directory.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        let log_path = std::env::var_os(LOG_PATH_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let log_dir = std::env::var_os(LOG_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or(config_log_dir)
            .or_else(|| {
                simcheck_core::config::user_data_local_dir()
                    .map(|dir| dir.join("logs").into_std_path_buf())
            });
        Self { log_path, log_dir }
    }
}

/// Build the global filter.
///
/// `RUST_LOG` wins when set. Otherwise `-q` limits to errors, `-v` raises
/// to debug and `-vv` to trace, and the configured level applies.
pub fn env_filter(quiet: bool, verbose: u8, config_level: &str) -> EnvFilter {
    if std::env::var_os("RUST_LOG").is_some()
        && let Ok(filter) = EnvFilter::try_from_default_env()
    {
        return filter;
    }
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => config_level,
            1 => "debug",
            _ => "trace",
        }
    };
    EnvFilter::new(level)
}

/// Terminal verbosity. Stays at warnings unless asked for more, so normal
/// command output is not interleaved with log lines.
const fn stderr_level(quiet: bool, verbose: u8) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber.
///
/// Returns the appender guard when file logging is active; keep it alive
/// until exit so buffered lines are flushed. A log file that cannot be
/// created disables file logging with a warning rather than failing the
/// command.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
    quiet: bool,
    verbose: u8,
) -> anyhow::Result<Option<WorkerGuard>> {
    let (appender, file_error) = match file_appender(config) {
        Ok(appender) => (appender, None),
        Err(err) => (None, Some(err)),
    };
    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(stderr_level(quiet, verbose));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    if let Some(err) = file_error {
        tracing::warn!(error = %err, "file logging disabled");
    }

    Ok(guard)
}

/// Open the configured log file, or `Ok(None)` when no destination is set.
fn file_appender(config: &ObservabilityConfig) -> anyhow::Result<Option<RollingFileAppender>> {
    let (dir, builder) = if let Some(ref path) = config.log_path {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .with_context(|| format!("log path {} has no file name", path.display()))?;
        let builder = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(name.to_string_lossy());
        (dir, builder)
    } else if let Some(ref dir) = config.log_dir {
        let builder = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix(LOG_FILE_SUFFIX);
        (dir.as_path(), builder)
    } else {
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let appender = builder
        .build(dir)
        .with_context(|| format!("failed to open log file in {}", dir.display()))?;
    Ok(Some(appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_level_follows_flags() {
        assert_eq!(stderr_level(true, 3), LevelFilter::ERROR);
        assert_eq!(stderr_level(false, 0), LevelFilter::WARN);
        assert_eq!(stderr_level(false, 1), LevelFilter::DEBUG);
        assert_eq!(stderr_level(false, 4), LevelFilter::TRACE);
    }

    #[test]
    fn explicit_path_gets_an_appender() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = ObservabilityConfig {
            log_path: Some(tmp.path().join("nested").join("run.jsonl")),
            log_dir: None,
        };
        assert!(file_appender(&config).unwrap().is_some());
        assert!(tmp.path().join("nested").join("run.jsonl").is_file());
    }

    #[test]
    fn log_dir_gets_a_daily_appender() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = ObservabilityConfig {
            log_path: None,
            log_dir: Some(tmp.path().join("logs")),
        };
        assert!(file_appender(&config).unwrap().is_some());
        assert!(tmp.path().join("logs").is_dir());
    }

    #[test]
    fn no_destination_means_no_file_logging() {
        assert!(file_appender(&ObservabilityConfig::default()).unwrap().is_none());
    }

    #[test]
    fn unopenable_log_file_is_an_error_not_a_panic() {
        let tmp = tempfile::TempDir::new().unwrap();
        // The "file" is an existing directory, so opening it for append fails.
        let occupied = tmp.path().join("taken.jsonl");
        std::fs::create_dir(&occupied).unwrap();
        let config = ObservabilityConfig {
            log_path: Some(occupied),
            log_dir: None,
        };
        assert!(file_appender(&config).is_err());
    }

    #[test]
    fn uncreatable_log_dir_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let config = ObservabilityConfig {
            log_path: None,
            log_dir: Some(blocker.join("logs")),
        };
        assert!(file_appender(&config).is_err());
    }
}
