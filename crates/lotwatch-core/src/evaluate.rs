//! One evaluation tick over the whole campus.
//!
//! The host samples the clock (every 15 seconds in the reference UI), hands in
//! the catalog, the latest live snapshot and the user's location, and gets back
//! a fresh [`CampusEvaluation`]. Nothing is cached between ticks.

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{LotwatchError, Result};
use crate::geo::{point_distance, GeoPoint};
use crate::live::{LiveSnapshot, UserLocation};
use crate::lots::{LotCategory, LotStatus, LotStatusEngine, ParkingLot};
use crate::period::{Period, PeriodClassifier, Transition};
use crate::schedule::{RouteSchedule, RouteStatus};
use crate::time::{TimeDescriptor, TimeResolver};

/// Status of one lot, as reported to the host.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LotReport {
    /// Lot id.
    #[schema(example = "P101")]
    pub id: String,

    /// Display name.
    #[schema(example = "East Remote")]
    pub name: String,

    /// Permit category.
    pub category: LotCategory,

    /// Exempt from the overnight restriction.
    pub overnight_exempt: bool,

    /// Representative point.
    pub location: GeoPoint,

    /// Current status.
    pub status: LotStatus,

    /// Meters from the user, when their location is known.
    pub distance_m: Option<f64>,
}

/// Everything derived for the campus at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CampusEvaluation {
    /// Resolved local time.
    pub time: TimeDescriptor,

    /// Current parking period.
    pub period: Period,

    /// Next period boundary.
    pub next_transition: Transition,

    /// Lot statuses, nearest first when the user's location is known.
    pub lots: Vec<LotReport>,

    /// Route statuses in catalog order.
    pub routes: Vec<RouteStatus>,
}

/// Evaluates lots and routes for one configured campus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluator {
    resolver: TimeResolver,
    engine: LotStatusEngine,
}

impl Evaluator {
    /// Create an evaluator from its parts.
    #[must_use]
    pub const fn new(resolver: TimeResolver, engine: LotStatusEngine) -> Self {
        Self { resolver, engine }
    }

    /// Create an evaluator from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LotwatchError::InvalidBoundaries`] if the configured periods are invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let classifier = PeriodClassifier::new(config.campus.periods)?;
        Ok(Self::new(
            TimeResolver::new(config.campus.timezone),
            LotStatusEngine::new(classifier),
        ))
    }

    /// The time resolver.
    #[must_use]
    pub const fn resolver(&self) -> &TimeResolver {
        &self.resolver
    }

    /// The lot status engine.
    #[must_use]
    pub const fn engine(&self) -> &LotStatusEngine {
        &self.engine
    }

    /// Resolve `now` and report the current period and next boundary.
    #[must_use]
    pub fn period_at<Z: TimeZone>(&self, now: &DateTime<Z>) -> (TimeDescriptor, Period, Transition) {
        let time = self.resolver.resolve(now);
        let classifier = self.engine.classifier();
        let period = classifier.classify(&time);
        let next = classifier.next_transition(&time);
        (time, period, next)
    }

    /// Report one lot at a resolved time.
    #[must_use]
    pub fn lot_report(
        &self,
        lot: &ParkingLot,
        time: &TimeDescriptor,
        location: &UserLocation,
    ) -> LotReport {
        LotReport {
            id: lot.id.clone(),
            name: lot.name.clone(),
            category: lot.category,
            overnight_exempt: lot.overnight_exempt,
            location: lot.location,
            status: self.engine.evaluate(lot, time),
            distance_m: location
                .position()
                .map(|origin| point_distance(origin, lot.location) * 1000.0),
        }
    }

    /// Report the lot with `id` at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`LotwatchError::LotNotFound`] for unknown ids.
    pub fn lot_status<Z: TimeZone>(
        &self,
        now: &DateTime<Z>,
        catalog: &Catalog,
        id: &str,
        location: &UserLocation,
    ) -> Result<LotReport> {
        let lot = catalog
            .lot(id)
            .ok_or_else(|| LotwatchError::LotNotFound(id.to_string()))?;
        let time = self.resolver.resolve(now);
        Ok(self.lot_report(lot, &time, location))
    }

    /// Report every lot at a resolved time, nearest first when the location is known.
    #[must_use]
    pub fn lot_reports(
        &self,
        catalog: &Catalog,
        time: &TimeDescriptor,
        location: &UserLocation,
    ) -> Vec<LotReport> {
        let mut reports: Vec<LotReport> = catalog
            .lots
            .iter()
            .map(|lot| self.lot_report(lot, time, location))
            .collect();
        if location.position().is_some() {
            reports.sort_by(|a, b| {
                let a = a.distance_m.unwrap_or(f64::INFINITY);
                let b = b.distance_m.unwrap_or(f64::INFINITY);
                a.total_cmp(&b)
            });
        }
        reports
    }

    /// Report every route at a resolved time.
    #[must_use]
    pub fn route_reports(
        &self,
        routes: &[RouteSchedule],
        time: &TimeDescriptor,
        live: Option<&LiveSnapshot>,
    ) -> Vec<RouteStatus> {
        routes
            .iter()
            .map(|route| {
                let live_vehicles = live.map_or(0, |snapshot| snapshot.live_vehicle_count(route));
                route.status(time, live_vehicles)
            })
            .collect()
    }

    /// Evaluate the whole campus at `now`.
    #[must_use]
    #[instrument(level = "debug", skip_all)]
    pub fn evaluate<Z: TimeZone>(
        &self,
        now: &DateTime<Z>,
        catalog: &Catalog,
        live: Option<&LiveSnapshot>,
        location: &UserLocation,
    ) -> CampusEvaluation {
        let (time, period, next_transition) = self.period_at(now);
        let lots = self.lot_reports(catalog, &time, location);
        let routes = self.route_reports(&catalog.routes, &time, live);

        debug!(
            time = time.display(),
            ?period,
            lots = lots.len(),
            running_routes = routes.iter().filter(|r| r.running).count(),
            "Evaluated campus"
        );

        CampusEvaluation {
            time,
            period,
            next_transition,
            lots,
            routes,
        }
    }
}
