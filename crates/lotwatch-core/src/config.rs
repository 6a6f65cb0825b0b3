//! Application configuration management.
//!
//! Configuration is layered with the `config` crate, later sources winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. An optional TOML file (`/etc/lotwatch/config.toml` on Linux)
//! 3. Environment variables prefixed `LOTWATCH__`, with `__` between keys,
//!    e.g. `LOTWATCH__CAMPUS__TIMEZONE=America/Denver`
//!
//! The result is validated as a whole so every problem is reported at once.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::live::DEFAULT_STOP_MATCH_RADIUS_M;
use crate::period::PeriodBoundaries;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A configuration source could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    /// A single field holds an invalid value.
    #[error("{field}: {message}")]
    ValidationError {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Several fields hold invalid values.
    #[error("{} invalid configuration values", .0.len())]
    MultipleValidationErrors(Vec<ConfigError>),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Campus time settings.
    pub campus: CampusConfig,

    /// Reference data location.
    pub data: DataConfig,

    /// HTTP server settings.
    pub server: ServerConfig,

    /// Live snapshot handling.
    pub live: LiveConfig,
}

/// Campus time settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampusConfig {
    /// Campus display name.
    pub name: String,

    /// Civil timezone in which parking rules and timetables are written.
    #[serde(with = "timezone_serde")]
    pub timezone: Tz,

    /// Parking period boundaries.
    pub periods: PeriodBoundaries,
}

impl Default for CampusConfig {
    fn default() -> Self {
        Self {
            name: "Campus".to_string(),
            timezone: chrono_tz::America::Los_Angeles,
            periods: PeriodBoundaries::default(),
        }
    }
}

/// Reference data location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// TOML file holding the lot table and route timetables.
    pub catalog_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_config_dir().join("catalog.toml"),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,

    /// Listen port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Live snapshot handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Snapshots older than this are ignored.
    pub max_age_secs: u64,

    /// Radius within which a stop is matched to a route shape.
    pub stop_match_radius_m: f64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 120,
            stop_match_radius_m: DEFAULT_STOP_MATCH_RADIUS_M,
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `path` is given but missing, a load
    /// error if any source fails to parse, or validation errors.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder
                .add_source(::config::File::from(path).format(::config::FileFormat::Toml));
        }

        let config: Self = builder
            .add_source(
                ::config::Environment::with_prefix("LOTWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise from defaults and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(Some(path))
        } else {
            debug!(path = %path.display(), "No configuration file, using defaults");
            Self::load(None)
        }
    }

    /// Check every field, collecting all problems.
    ///
    /// # Errors
    ///
    /// Returns the single error, or [`ConfigError::MultipleValidationErrors`].
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();
        let mut invalid = |field: &str, message: String| {
            errors.push(ConfigError::ValidationError {
                field: field.to_string(),
                message,
            });
        };

        if self.campus.name.trim().is_empty() {
            invalid("campus.name", "must not be empty".to_string());
        }
        if let Err(e) = self.campus.periods.validate() {
            invalid("campus.periods", e.to_string());
        }
        if self.data.catalog_path.as_os_str().is_empty() {
            invalid("data.catalog_path", "must not be empty".to_string());
        }
        if self.server.port == 0 {
            invalid("server.port", "must be between 1 and 65535".to_string());
        }
        if self.live.max_age_secs == 0 {
            invalid("live.max_age_secs", "must be positive".to_string());
        }
        if !(self.live.stop_match_radius_m.is_finite() && self.live.stop_match_radius_m > 0.0) {
            invalid(
                "live.stop_match_radius_m",
                format!("must be a positive distance, got {}", self.live.stop_match_radius_m),
            );
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::MultipleValidationErrors(errors)),
        }
    }
}

/// Whether `name` is a known IANA timezone.
#[must_use]
pub fn is_valid_timezone(name: &str) -> bool {
    name.parse::<Tz>().is_ok()
}

/// Directory holding configuration and reference data.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/etc/lotwatch")
    }
    #[cfg(not(target_os = "linux"))]
    {
        directories::ProjectDirs::from("", "", "lotwatch")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Default configuration file path.
#[must_use]
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

mod timezone_serde {
    use chrono_tz::Tz;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(tz: &Tz, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(tz.name())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Tz, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|_| serde::de::Error::custom(format!("unknown timezone '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.campus.periods, PeriodBoundaries::default());
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_load_file_overrides_defaults() {
        let file = write_config(
            r#"
            [campus]
            name = "Hilltop"
            timezone = "America/Denver"

            [campus.periods]
            overnight_start = 180
            transition_window = 15

            [server]
            port = 8080
            "#,
        );
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.campus.name, "Hilltop");
        assert_eq!(config.campus.timezone, chrono_tz::America::Denver);
        assert_eq!(config.campus.periods.overnight_start, 180);
        assert_eq!(config.campus.periods.business_start, 420);
        assert_eq!(config.campus.periods.transition_window, 15);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/definitely/not/here.toml").unwrap();
        assert_eq!(config.campus.name, "Campus");
    }

    #[test]
    fn test_unknown_timezone_fails_to_load() {
        let file = write_config("[campus]\ntimezone = \"Mars/Olympus_Mons\"\n");
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
        assert!(err.to_string().contains("Mars/Olympus_Mons"));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = Config::default();
        config.server.port = 0;
        config.campus.periods.business_start = 60;
        config.live.stop_match_radius_m = f64::NAN;

        match config.validate().unwrap_err() {
            ConfigError::MultipleValidationErrors(errors) => assert_eq!(errors.len(), 3),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }

    #[test]
    fn test_single_validation_error() {
        let mut config = Config::default();
        config.live.max_age_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("live.max_age_secs"));
    }

    #[test]
    fn test_demo_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/config.toml");
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.campus.name, "Hilltop");
        assert_eq!(config.campus.periods, PeriodBoundaries::default());
    }

    #[test]
    fn test_is_valid_timezone() {
        assert!(is_valid_timezone("America/Los_Angeles"));
        assert!(is_valid_timezone("UTC"));
        assert!(!is_valid_timezone("Pacific Time"));
    }

    #[test]
    fn test_default_paths() {
        assert!(default_config_path().ends_with("config.toml"));
        assert!(Config::default().data.catalog_path.ends_with("catalog.toml"));
    }
}
