//! Logging initialization.
//!
//! The mode comes from `LOTWATCH_ENV`:
//! - **production**: JSON lines to a daily rolling file plus compact stdout for journald
//! - anything else: pretty stdout with span open/close events
//!
//! Filtering follows `RUST_LOG` when set, then `LOTWATCH_LOG_LEVEL`, then `info`.

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LEVEL: &str = "info";
const LOG_FILE_PREFIX: &str = "lotwatch";

/// Writer guards; dropping them stops the background writers.
static GUARDS: OnceLock<(WorkerGuard, WorkerGuard)> = OnceLock::new();

/// Where and how log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Rolling JSON file plus compact stdout.
    Production,
    /// Pretty stdout.
    Development,
}

impl LogMode {
    /// Pick the mode from an environment name such as `LOTWATCH_ENV`.
    #[must_use]
    pub fn from_env_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some(n) if n.eq_ignore_ascii_case("production") || n.eq_ignore_ascii_case("prod") => {
                Self::Production
            }
            _ => Self::Development,
        }
    }

    /// Read the mode from `LOTWATCH_ENV`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_name(std::env::var("LOTWATCH_ENV").ok().as_deref())
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or the log directory
/// cannot be created.
pub fn init(mode: LogMode) -> anyhow::Result<()> {
    let filter = env_filter(std::env::var("LOTWATCH_LOG_LEVEL").ok().as_deref())?;
    match mode {
        LogMode::Production => init_production(filter),
        LogMode::Development => {
            init_development(filter);
            Ok(())
        }
    }
}

/// `RUST_LOG` wins over the fallback level.
fn env_filter(fallback: Option<&str>) -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback.unwrap_or(DEFAULT_LEVEL)))?)
}

fn init_production(filter: EnvFilter) -> anyhow::Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // No ANSI colors for journald
    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    let _ = GUARDS.set((file_guard, stdout_guard));
    tracing::info!(dir = %log_dir.display(), "File logging enabled");
    Ok(())
}

fn init_development(filter: EnvFilter) {
    let stdout_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .init();
}

/// Log directory: `LOTWATCH_LOG_DIR`, else the platform default.
fn log_directory() -> PathBuf {
    if let Some(dir) = std::env::var_os("LOTWATCH_LOG_DIR") {
        return PathBuf::from(dir);
    }
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/var/log/lotwatch")
    }
    #[cfg(not(target_os = "linux"))]
    {
        directories::ProjectDirs::from("", "", "lotwatch")
            .map(|dirs| dirs.data_dir().join("logs"))
            .unwrap_or_else(|| PathBuf::from("./logs"))
    }
}
