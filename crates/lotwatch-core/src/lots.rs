//! Parking lot status decisions.
//!
//! [`LotStatusEngine::decide`] is a pure function of a lot's category, its
//! overnight exemption and the time context. It is evaluated fresh for every lot
//! on every tick; statuses are never cached.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geo::GeoPoint;
use crate::period::{Period, PeriodClassifier};
use crate::time::TimeDescriptor;

/// Permit category of a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LotCategory {
    /// Student permits, valid outside the overnight restriction.
    Student,
    /// Employee permits required during business hours on weekdays.
    Employee,
    /// Never available for general parking.
    Restricted,
}

/// A parking lot from the campus reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ParkingLot {
    /// Stable lot identifier.
    #[schema(example = "P101")]
    pub id: String,

    /// Display name.
    #[schema(example = "East Remote")]
    pub name: String,

    /// Permit category.
    pub category: LotCategory,

    /// Whether the lot is usable 24/7, unaffected by the overnight restriction.
    #[serde(default)]
    pub overnight_exempt: bool,

    /// Representative point used for proximity sorting.
    pub location: GeoPoint,

    /// Lot outline, as a closed ring of points.
    #[serde(default)]
    pub boundary: Vec<GeoPoint>,
}

/// Traffic-light color of a lot status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    /// Parking allowed.
    Green,
    /// Not allowed yet, opens within the transition window.
    Yellow,
    /// Allowed now, closes within the transition window.
    Orange,
    /// Parking not allowed.
    Red,
}

/// The derived parking status of one lot at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[schema(example = json!({
    "color": "red",
    "label": "Closed",
    "reason": "Overnight restriction"
}))]
pub struct LotStatus {
    /// Traffic-light color.
    pub color: StatusColor,

    /// Short status label.
    #[schema(example = "Closed")]
    pub label: String,

    /// Why the lot has this status.
    #[schema(example = "Overnight restriction")]
    pub reason: String,
}

impl LotStatus {
    fn open(reason: impl Into<String>) -> Self {
        Self {
            color: StatusColor::Green,
            label: "Open".to_string(),
            reason: reason.into(),
        }
    }

    fn opening_soon(reason: impl Into<String>) -> Self {
        Self {
            color: StatusColor::Yellow,
            label: "Opening soon".to_string(),
            reason: reason.into(),
        }
    }

    fn closing_soon(reason: impl Into<String>) -> Self {
        Self {
            color: StatusColor::Orange,
            label: "Closing soon".to_string(),
            reason: reason.into(),
        }
    }

    fn closed(reason: impl Into<String>) -> Self {
        Self {
            color: StatusColor::Red,
            label: "Closed".to_string(),
            reason: reason.into(),
        }
    }

    /// Whether parking is allowed right now.
    #[must_use]
    pub const fn is_parkable(&self) -> bool {
        matches!(self.color, StatusColor::Green | StatusColor::Orange)
    }
}

/// Everything the decision table looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusInputs {
    /// Lot permit category.
    pub category: LotCategory,
    /// Lot is exempt from the overnight restriction.
    pub overnight_exempt: bool,
    /// Current period.
    pub period: Period,
    /// Saturday or Sunday.
    pub weekend: bool,
    /// Current minute-of-day.
    pub minutes: u16,
    /// Cyclic minutes until business hours begin.
    pub until_business_start: u16,
    /// Cyclic minutes until open parking begins.
    pub until_open_start: u16,
    /// Cyclic minutes until the overnight restriction begins.
    pub until_overnight_start: u16,
}

/// Computes [`LotStatus`] from lot attributes and the time context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LotStatusEngine {
    classifier: PeriodClassifier,
}

impl LotStatusEngine {
    /// Create an engine over a period classifier.
    #[must_use]
    pub const fn new(classifier: PeriodClassifier) -> Self {
        Self { classifier }
    }

    /// The classifier backing this engine.
    #[must_use]
    pub const fn classifier(&self) -> &PeriodClassifier {
        &self.classifier
    }

    /// Gather decision inputs for `lot` at `time`.
    #[must_use]
    pub const fn inputs(&self, lot: &ParkingLot, time: &TimeDescriptor) -> StatusInputs {
        let c = &self.classifier;
        StatusInputs {
            category: lot.category,
            overnight_exempt: lot.overnight_exempt,
            period: c.classify(time),
            weekend: time.is_weekend(),
            minutes: time.minutes_since_midnight(),
            until_business_start: c.minutes_until_start(time, Period::Business),
            until_open_start: c.minutes_until_start(time, Period::Open),
            until_overnight_start: c.minutes_until_start(time, Period::Overnight),
        }
    }

    /// Status of `lot` at `time`.
    #[must_use]
    pub fn evaluate(&self, lot: &ParkingLot, time: &TimeDescriptor) -> LotStatus {
        self.decide(&self.inputs(lot, time))
    }

    /// Apply the decision table.
    #[must_use]
    pub fn decide(&self, inputs: &StatusInputs) -> LotStatus {
        let bounds = self.classifier.boundaries();
        let window = bounds.transition_window;
        let StatusInputs {
            category,
            overnight_exempt,
            period,
            weekend,
            minutes,
            until_business_start,
            until_open_start,
            until_overnight_start,
        } = *inputs;
        let is_student = category == LotCategory::Student;
        let is_employee = category == LotCategory::Employee;

        if category == LotCategory::Restricted {
            return LotStatus::closed("Restricted lot");
        }

        if period == Period::Overnight {
            let business_soon = until_business_start <= window;
            if overnight_exempt {
                if is_employee && !weekend && business_soon {
                    return LotStatus::closing_soon(format!(
                        "Employee permit required at business start in {until_business_start} min"
                    ));
                }
                return LotStatus::open("Overnight parking allowed");
            }
            if business_soon && (is_student || weekend) {
                return LotStatus::opening_soon(format!(
                    "Overnight restriction ends in {until_business_start} min"
                ));
            }
            if business_soon && is_employee && !weekend {
                return LotStatus::closed(
                    "Overnight restriction, then employee permit required for business hours",
                );
            }
            return LotStatus::closed("Overnight restriction");
        }

        if weekend {
            if until_overnight_start <= window && !overnight_exempt && minutes >= bounds.business_start
            {
                return LotStatus::closing_soon(format!(
                    "Overnight restriction begins in {until_overnight_start} min"
                ));
            }
            return LotStatus::open("Weekend parking");
        }

        match period {
            Period::Business if is_student => LotStatus::open("Student permits valid"),
            Period::Business if until_open_start <= window => LotStatus::opening_soon(format!(
                "Open to all permits in {until_open_start} min"
            )),
            Period::Business => {
                LotStatus::closed("Employee permit required during business hours")
            }
            _ if is_student => LotStatus::open("Student permits valid"),
            _ if !overnight_exempt && until_overnight_start <= window => {
                LotStatus::closing_soon(format!(
                    "Overnight restriction begins in {until_overnight_start} min"
                ))
            }
            _ => LotStatus::open("Open to all permits"),
        }
    }
}
