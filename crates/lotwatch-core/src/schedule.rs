//! Shuttle timetables: running state and next departure.
//!
//! Departures are written as 12-hour clock strings (`"11:52 AM"`) in the
//! reference data and parsed into [`TimeOfDay`] when the catalog is loaded, so
//! a malformed entry is rejected up front instead of silently reading as
//! midnight.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::time::{format_minute_of_day, minutes_until, TimeDescriptor};

/// Minutes before the first departure during which a schedule already counts as active.
pub const PRE_SERVICE_GRACE_MINUTES: i32 = 5;

/// `h:mm AM` with 1-12 hours, case-insensitive meridiem.
static TIME_OF_DAY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(1[0-2]|0?[1-9]):([0-5][0-9])\s*([AaPp])\.?[Mm]\.?\s*$")
        .expect("Invalid time of day regex")
});

/// Errors from parsing schedule data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// The string is not a 12-hour clock time.
    #[error("invalid departure time '{input}', expected 12-hour format like '7:05 AM'")]
    InvalidTimeOfDay {
        /// The rejected input.
        input: String,
    },
}

/// A minute-of-day parsed from a 12-hour clock string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Minutes since midnight, `0..1440`.
    #[must_use]
    pub const fn minute_of_day(self) -> u16 {
        self.0
    }
}

/// Parse a 12-hour clock string such as `"11:52 AM"`.
///
/// `12 AM` is hour 0 and `12 PM` is hour 12; any other PM hour adds 12.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidTimeOfDay`] for anything else.
pub fn parse_time_of_day(s: &str) -> Result<TimeOfDay, ScheduleError> {
    let invalid = || ScheduleError::InvalidTimeOfDay {
        input: s.to_string(),
    };
    let caps = TIME_OF_DAY_REGEX.captures(s).ok_or_else(invalid)?;
    let hour: u16 = caps[1].parse().map_err(|_| invalid())?;
    let minute: u16 = caps[2].parse().map_err(|_| invalid())?;
    let pm = caps[3].eq_ignore_ascii_case("p");

    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    Ok(TimeOfDay(hour * 60 + minute))
}

impl FromStr for TimeOfDay {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time_of_day(s)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ScheduleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        parse_time_of_day(&s)
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_minute_of_day(self.0))
    }
}

/// A stop on a trip, offset from the trip's departure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleStop {
    /// Stop name.
    #[schema(example = "Main Entrance")]
    pub name: String,

    /// Minutes after departure at which the shuttle reaches this stop.
    #[serde(default)]
    #[schema(example = 12)]
    pub offset_minutes: u16,
}

/// One timetable variant of a route, e.g. weekday daytime service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubSchedule {
    /// Display label, e.g. "Daytime".
    pub label: String,

    /// Days the timetable runs, Sunday = 0.
    pub days_of_week: BTreeSet<u8>,

    /// Stops along each trip, in order.
    #[serde(default)]
    pub stops: Vec<ScheduleStop>,

    /// Trip departure times. The last may be earlier than the first when
    /// service crosses midnight.
    #[serde(default)]
    pub departures: Vec<TimeOfDay>,
}

impl SubSchedule {
    /// Whether the timetable runs on the descriptor's day.
    #[must_use]
    pub fn runs_on(&self, time: &TimeDescriptor) -> bool {
        self.days_of_week.contains(&time.day_of_week())
    }

    /// Whether the departure list crosses midnight.
    #[must_use]
    pub fn wraps_midnight(&self) -> bool {
        match (self.departures.first(), self.departures.last()) {
            (Some(first), Some(last)) => last < first,
            _ => false,
        }
    }

    /// Minutes from departure to the final stop.
    #[must_use]
    pub fn trip_length(&self) -> u16 {
        self.stops.last().map_or(0, |stop| stop.offset_minutes)
    }

    /// First listed departure strictly after `time`, ignoring wraparound.
    #[must_use]
    pub fn next_departure(&self, time: &TimeDescriptor) -> Option<TimeOfDay> {
        let now = time.minutes_since_midnight();
        self.departures
            .iter()
            .copied()
            .find(|departure| departure.minute_of_day() > now)
    }

    /// Whether service is running at `time`.
    ///
    /// Active from five minutes before the first departure until the last
    /// trip reaches its final stop. Wraparound schedules are active from the
    /// first departure through midnight into the early morning.
    #[must_use]
    pub fn is_active(&self, time: &TimeDescriptor) -> bool {
        if !self.runs_on(time) {
            return false;
        }
        let (Some(first), Some(last)) = (self.departures.first(), self.departures.last()) else {
            return false;
        };

        let now = i32::from(time.minutes_since_midnight());
        let first = i32::from(first.minute_of_day());
        let last = i32::from(last.minute_of_day());
        let end = last + i32::from(self.trip_length());

        if last < first {
            now >= first || now <= end
        } else {
            first - PRE_SERVICE_GRACE_MINUTES <= now && now <= end
        }
    }
}

/// A shuttle route and its timetables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSchedule {
    /// Route name, matched case-insensitively against live route names.
    pub name: String,

    /// Display color, e.g. `#1f77b4`.
    #[serde(default)]
    pub color: String,

    /// Timetable variants.
    pub sub_schedules: Vec<SubSchedule>,
}

impl RouteSchedule {
    /// Whether any timetable is active.
    #[must_use]
    pub fn is_running(&self, time: &TimeDescriptor) -> bool {
        self.sub_schedules.iter().any(|s| s.is_active(time))
    }

    /// Earliest next departure across today's timetables.
    #[must_use]
    pub fn next_departure(&self, time: &TimeDescriptor) -> Option<TimeOfDay> {
        self.sub_schedules
            .iter()
            .filter(|s| s.runs_on(time))
            .filter_map(|s| s.next_departure(time))
            .min()
    }

    /// Whether `name` refers to this route.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }

    /// Full status at `time`, given how many live vehicles report this route.
    #[must_use]
    pub fn status(&self, time: &TimeDescriptor, live_vehicles: usize) -> RouteStatus {
        let active_schedules: Vec<String> = self
            .sub_schedules
            .iter()
            .filter(|s| s.is_active(time))
            .map(|s| s.label.clone())
            .collect();
        let running = !active_schedules.is_empty();
        let next = self.next_departure(time);

        RouteStatus {
            name: self.name.clone(),
            color: self.color.clone(),
            running,
            active_schedules,
            next_departure: next,
            minutes_until_departure: next
                .map(|d| minutes_until(time.minutes_since_midnight(), d.minute_of_day())),
            live_vehicles,
            visible: running || live_vehicles > 0,
        }
    }
}

/// Derived state of a route at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[schema(example = json!({
    "name": "Loop",
    "color": "#1f77b4",
    "running": true,
    "active_schedules": ["Daytime"],
    "next_departure": "11:52 AM",
    "minutes_until_departure": 12,
    "live_vehicles": 2,
    "visible": true
}))]
pub struct RouteStatus {
    /// Route name.
    #[schema(example = "Loop")]
    pub name: String,

    /// Display color.
    #[schema(example = "#1f77b4")]
    pub color: String,

    /// Any timetable is active.
    pub running: bool,

    /// Labels of the active timetables.
    pub active_schedules: Vec<String>,

    /// Next departure today, if any remain.
    #[schema(value_type = Option<String>, example = "11:52 AM")]
    pub next_departure: Option<TimeOfDay>,

    /// Minutes until the next departure.
    pub minutes_until_departure: Option<u16>,

    /// Live vehicles currently reporting this route.
    pub live_vehicles: usize,

    /// Shown to riders: running on schedule or observed live.
    pub visible: bool,
}
