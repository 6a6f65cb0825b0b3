//! Parking period classification.
//!
//! A campus day is split by three boundaries into named periods:
//!
//! ```text
//! 0 ───── overnight_start ───── business_start ───── open_start ───── 1440
//!   Open          Overnight              Business             Open
//! ```
//!
//! The `Open` period wraps across midnight.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{LotwatchError, Result};
use crate::time::{format_minute_of_day, minutes_until, TimeDescriptor, MINUTES_PER_DAY};

/// Default start of the overnight restriction (2:00 AM).
pub const DEFAULT_OVERNIGHT_START: u16 = 2 * 60;

/// Default start of business hours (7:00 AM).
pub const DEFAULT_BUSINESS_START: u16 = 7 * 60;

/// Default start of open parking (5:00 PM).
pub const DEFAULT_OPEN_START: u16 = 17 * 60;

/// Default lookahead before a boundary during which a lot is "soon" open or closed.
pub const DEFAULT_TRANSITION_WINDOW: u16 = 30;

/// Boundaries of the parking day, in minutes since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PeriodBoundaries {
    /// Start of the overnight restriction.
    #[schema(example = 120)]
    pub overnight_start: u16,

    /// Start of business hours.
    #[schema(example = 420)]
    pub business_start: u16,

    /// Start of open parking.
    #[schema(example = 1020)]
    pub open_start: u16,

    /// Lookahead in minutes before a boundary.
    #[schema(example = 30)]
    pub transition_window: u16,
}

impl Default for PeriodBoundaries {
    fn default() -> Self {
        Self {
            overnight_start: DEFAULT_OVERNIGHT_START,
            business_start: DEFAULT_BUSINESS_START,
            open_start: DEFAULT_OPEN_START,
            transition_window: DEFAULT_TRANSITION_WINDOW,
        }
    }
}

impl PeriodBoundaries {
    /// Check that the boundaries describe three non-empty periods.
    ///
    /// # Errors
    ///
    /// Returns [`LotwatchError::InvalidBoundaries`] unless
    /// `overnight_start < business_start < open_start < 1440` and the transition
    /// window is between 1 and 1439 minutes.
    pub fn validate(&self) -> Result<()> {
        if !(self.overnight_start < self.business_start
            && self.business_start < self.open_start
            && self.open_start < MINUTES_PER_DAY)
        {
            return Err(LotwatchError::InvalidBoundaries(format!(
                "expected overnight_start < business_start < open_start < 1440, got {} / {} / {}",
                self.overnight_start, self.business_start, self.open_start
            )));
        }
        if self.transition_window == 0 || self.transition_window >= MINUTES_PER_DAY {
            return Err(LotwatchError::InvalidBoundaries(format!(
                "transition_window must be between 1 and 1439 minutes, got {}",
                self.transition_window
            )));
        }
        Ok(())
    }

    /// Minute-of-day at which `period` begins.
    #[must_use]
    pub const fn start_of(&self, period: Period) -> u16 {
        match period {
            Period::Overnight => self.overnight_start,
            Period::Business => self.business_start,
            Period::Open => self.open_start,
        }
    }
}

/// A named window of the parking day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Overnight restriction; only exempt lots are usable.
    Overnight,
    /// Business hours; employee lots require an employee permit.
    Business,
    /// Open parking for all permit types.
    Open,
}

impl Period {
    /// Boundary order through the day.
    pub const ALL: [Self; 3] = [Self::Overnight, Self::Business, Self::Open];

    /// Short display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Overnight => "Overnight",
            Self::Business => "Business hours",
            Self::Open => "Open parking",
        }
    }

    /// Label shown when this period is the next one to begin.
    #[must_use]
    pub const fn transition_label(self) -> &'static str {
        match self {
            Self::Overnight => "Overnight restriction begins",
            Self::Business => "Business hours begin",
            Self::Open => "Open parking begins",
        }
    }
}

/// The next upcoming period boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[schema(example = json!({
    "period": "business",
    "label": "Business hours begin",
    "starts_at": "7:00 AM",
    "minutes_until": 295
}))]
pub struct Transition {
    /// Period that begins at the boundary.
    pub period: Period,

    /// Display label for the countdown.
    #[schema(example = "Business hours begin")]
    pub label: String,

    /// Local clock time of the boundary.
    #[schema(example = "7:00 AM")]
    pub starts_at: String,

    /// Cyclic minutes until the boundary, `1..=1440`.
    #[schema(example = 295)]
    pub minutes_until: u16,
}

/// Maps minutes-of-day onto [`Period`]s for one set of boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodClassifier {
    boundaries: PeriodBoundaries,
}

impl PeriodClassifier {
    /// Create a classifier.
    ///
    /// # Errors
    ///
    /// Returns [`LotwatchError::InvalidBoundaries`] if the boundaries fail validation.
    pub fn new(boundaries: PeriodBoundaries) -> Result<Self> {
        boundaries.validate()?;
        Ok(Self { boundaries })
    }

    /// The boundaries this classifier was built with.
    #[must_use]
    pub const fn boundaries(&self) -> &PeriodBoundaries {
        &self.boundaries
    }

    /// Classify a resolved time.
    #[must_use]
    pub const fn classify(&self, time: &TimeDescriptor) -> Period {
        self.classify_in_domain(time.minutes_since_midnight())
    }

    /// Classify a raw minute-of-day.
    ///
    /// # Errors
    ///
    /// Returns [`LotwatchError::MinuteOutOfRange`] for `minutes >= 1440`.
    pub fn classify_minutes(&self, minutes: u16) -> Result<Period> {
        if minutes >= MINUTES_PER_DAY {
            return Err(LotwatchError::MinuteOutOfRange(minutes));
        }
        Ok(self.classify_in_domain(minutes))
    }

    const fn classify_in_domain(&self, minutes: u16) -> Period {
        let b = &self.boundaries;
        if minutes >= b.overnight_start && minutes < b.business_start {
            Period::Overnight
        } else if minutes >= b.business_start && minutes < b.open_start {
            Period::Business
        } else {
            Period::Open
        }
    }

    /// Cyclic minutes from `time` until `period` next begins.
    #[must_use]
    pub const fn minutes_until_start(&self, time: &TimeDescriptor, period: Period) -> u16 {
        minutes_until(time.minutes_since_midnight(), self.boundaries.start_of(period))
    }

    /// The nearest upcoming boundary after `time`.
    #[must_use]
    pub fn next_transition(&self, time: &TimeDescriptor) -> Transition {
        let (period, minutes) = Period::ALL
            .into_iter()
            .map(|period| (period, self.minutes_until_start(time, period)))
            .min_by_key(|&(_, minutes)| minutes)
            .unwrap_or((Period::Overnight, MINUTES_PER_DAY));

        Transition {
            period,
            label: period.transition_label().to_string(),
            starts_at: format_minute_of_day(self.boundaries.start_of(period)),
            minutes_until: minutes,
        }
    }
}

impl Default for PeriodClassifier {
    fn default() -> Self {
        Self {
            boundaries: PeriodBoundaries::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(minutes: u16, day: u8) -> TimeDescriptor {
        TimeDescriptor::new(minutes, day).unwrap()
    }

    #[test]
    fn test_default_boundaries_are_valid() {
        assert!(PeriodBoundaries::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_unordered_boundaries() {
        let boundaries = PeriodBoundaries {
            overnight_start: 420,
            business_start: 120,
            ..PeriodBoundaries::default()
        };
        assert!(matches!(
            PeriodClassifier::new(boundaries),
            Err(LotwatchError::InvalidBoundaries(_))
        ));
    }

    #[test]
    fn test_rejects_zero_transition_window() {
        let boundaries = PeriodBoundaries {
            transition_window: 0,
            ..PeriodBoundaries::default()
        };
        assert!(boundaries.validate().is_err());
    }

    #[test]
    fn test_classify_every_minute_matches_table() {
        let classifier = PeriodClassifier::default();
        for weekend_day in [0_u8, 3] {
            for minutes in 0..MINUTES_PER_DAY {
                let expected = if (120..420).contains(&minutes) {
                    Period::Overnight
                } else if (420..1020).contains(&minutes) {
                    Period::Business
                } else {
                    Period::Open
                };
                assert_eq!(
                    classifier.classify(&at(minutes, weekend_day)),
                    expected,
                    "minute {minutes}"
                );
            }
        }
    }

    #[test]
    fn test_classify_boundaries_are_inclusive_starts() {
        let classifier = PeriodClassifier::default();
        assert_eq!(classifier.classify_minutes(119).unwrap(), Period::Open);
        assert_eq!(classifier.classify_minutes(120).unwrap(), Period::Overnight);
        assert_eq!(classifier.classify_minutes(420).unwrap(), Period::Business);
        assert_eq!(classifier.classify_minutes(1020).unwrap(), Period::Open);
        assert_eq!(classifier.classify_minutes(0).unwrap(), Period::Open);
    }

    #[test]
    fn test_classify_minutes_fails_fast_out_of_domain() {
        let classifier = PeriodClassifier::default();
        assert!(matches!(
            classifier.classify_minutes(1440),
            Err(LotwatchError::MinuteOutOfRange(1440))
        ));
    }

    #[test]
    fn test_alternate_boundaries() {
        let classifier = PeriodClassifier::new(PeriodBoundaries {
            overnight_start: 60,
            business_start: 360,
            open_start: 1200,
            transition_window: 15,
        })
        .unwrap();
        assert_eq!(classifier.classify_minutes(90).unwrap(), Period::Overnight);
        assert_eq!(classifier.classify_minutes(1100).unwrap(), Period::Business);
        assert_eq!(classifier.classify_minutes(30).unwrap(), Period::Open);
    }

    #[test]
    fn test_next_transition_from_overnight() {
        let classifier = PeriodClassifier::default();
        let next = classifier.next_transition(&at(125, 3));
        assert_eq!(next.period, Period::Business);
        assert_eq!(next.minutes_until, 295);
        assert_eq!(next.starts_at, "7:00 AM");
        assert_eq!(next.label, "Business hours begin");
    }

    #[test]
    fn test_next_transition_wraps_midnight() {
        let classifier = PeriodClassifier::default();
        let next = classifier.next_transition(&at(1430, 5));
        assert_eq!(next.period, Period::Overnight);
        assert_eq!(next.minutes_until, 130);
    }

    #[test]
    fn test_next_transition_at_boundary_skips_current() {
        let classifier = PeriodClassifier::default();
        let next = classifier.next_transition(&at(420, 2));
        assert_eq!(next.period, Period::Open);
        assert_eq!(next.minutes_until, 600);
    }
}
