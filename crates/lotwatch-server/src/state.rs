//! Application state shared across handlers.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lotwatch_core::{Catalog, Config, DropReport, Evaluator, LiveSnapshot};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// State handle passed to every handler.
pub type SharedState = Arc<RwLock<AppState>>;

/// The last accepted live snapshot and when it arrived.
#[derive(Debug, Clone)]
pub struct LiveFeed {
    /// Wall-clock time the snapshot was accepted.
    pub received_at: DateTime<Utc>,
    /// Validated snapshot.
    pub snapshot: LiveSnapshot,
    /// Entries rejected while validating it.
    pub dropped: DropReport,
}

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Config,
    /// Lot table and route timetables.
    pub catalog: Catalog,
    /// Evaluator built from `config`.
    pub evaluator: Evaluator,
    live: Option<LiveFeed>,
}

impl AppState {
    /// Create state from already-loaded configuration and catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured period boundaries are invalid.
    pub fn new(config: Config, catalog: Catalog) -> lotwatch_core::Result<Self> {
        let evaluator = Evaluator::from_config(&config)?;
        Ok(Self {
            config,
            catalog,
            evaluator,
            live: None,
        })
    }

    /// Load configuration from `config_path` (or defaults) and the catalog it names.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or catalog cannot be loaded.
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let config = Config::load_or_default(config_path)?;
        let catalog = Catalog::load(&config.data.catalog_path)?;
        info!(
            campus = %config.campus.name,
            timezone = %config.campus.timezone,
            "Loaded campus"
        );
        Ok(Self::new(config, catalog)?)
    }

    /// Wrap the state for sharing between handlers.
    #[must_use]
    pub fn into_shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    /// Replace the live snapshot.
    pub fn set_live(&mut self, received_at: DateTime<Utc>, snapshot: LiveSnapshot, dropped: DropReport) {
        self.live = Some(LiveFeed {
            received_at,
            snapshot,
            dropped,
        });
    }

    /// The live feed if it is no older than `live.max_age_secs` at `now`.
    #[must_use]
    pub fn live_feed(&self, now: DateTime<Utc>) -> Option<&LiveFeed> {
        let feed = self.live.as_ref()?;
        let age = now.signed_duration_since(feed.received_at).num_seconds();
        let max_age = i64::try_from(self.config.live.max_age_secs).unwrap_or(i64::MAX);
        if age > max_age {
            debug!(age_secs = age, max_age_secs = max_age, "Ignoring stale live snapshot");
            return None;
        }
        Some(feed)
    }

    /// The fresh live snapshot at `now`, if any.
    #[must_use]
    pub fn live_snapshot(&self, now: DateTime<Utc>) -> Option<&LiveSnapshot> {
        self.live_feed(now).map(|feed| &feed.snapshot)
    }
}
