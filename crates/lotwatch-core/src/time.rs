//! Wall-clock resolution into campus-local minute-of-day and day-of-week.
//!
//! Every evaluation starts by resolving the current instant in the campus
//! timezone, never the caller's local zone. Daylight-saving transitions are
//! handled by `chrono-tz`; nothing here does offset arithmetic.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{LotwatchError, Result};

/// Number of minutes in a civil day.
pub const MINUTES_PER_DAY: u16 = 1440;

/// Cyclic distance in minutes from `current` forward to `target`.
///
/// A target equal to `current` is a full day away, so a boundary that has
/// just been reached is never reported as upcoming.
#[must_use]
pub const fn minutes_until(current: u16, target: u16) -> u16 {
    if target > current {
        target - current
    } else {
        target + MINUTES_PER_DAY - current
    }
}

/// Formats a minute-of-day as a 12-hour clock string, e.g. `2:05 AM`.
#[must_use]
pub fn format_minute_of_day(minute: u16) -> String {
    let minute = minute % MINUTES_PER_DAY;
    let hour = minute / 60;
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{display_hour}:{:02} {suffix}", minute % 60)
}

/// A resolved point in the campus day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[schema(example = json!({
    "minutes_since_midnight": 125,
    "day_of_week": 3,
    "display": "2:05 AM"
}))]
pub struct TimeDescriptor {
    /// Minutes since local midnight, `0..1440`.
    #[schema(example = 125, minimum = 0, maximum = 1439)]
    minutes_since_midnight: u16,

    /// Day of week, Sunday = 0 through Saturday = 6.
    #[schema(example = 3, minimum = 0, maximum = 6)]
    day_of_week: u8,

    /// Human-readable local time.
    #[schema(example = "2:05 AM")]
    display: String,
}

impl TimeDescriptor {
    /// Builds a descriptor from raw components.
    ///
    /// # Errors
    ///
    /// Returns [`LotwatchError::MinuteOutOfRange`] or [`LotwatchError::DayOutOfRange`]
    /// when a component lies outside its domain. Values are never clamped.
    pub fn new(minutes_since_midnight: u16, day_of_week: u8) -> Result<Self> {
        if minutes_since_midnight >= MINUTES_PER_DAY {
            return Err(LotwatchError::MinuteOutOfRange(minutes_since_midnight));
        }
        if day_of_week > 6 {
            return Err(LotwatchError::DayOutOfRange(day_of_week));
        }
        Ok(Self {
            minutes_since_midnight,
            day_of_week,
            display: format_minute_of_day(minutes_since_midnight),
        })
    }

    /// Minutes since local midnight.
    #[must_use]
    pub const fn minutes_since_midnight(&self) -> u16 {
        self.minutes_since_midnight
    }

    /// Day of week with Sunday = 0.
    #[must_use]
    pub const fn day_of_week(&self) -> u8 {
        self.day_of_week
    }

    /// Local time as displayed to users.
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Saturday or Sunday.
    #[must_use]
    pub const fn is_weekend(&self) -> bool {
        self.day_of_week == 0 || self.day_of_week == 6
    }
}

/// Resolves instants into [`TimeDescriptor`]s for one civil timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeResolver {
    timezone: Tz,
}

impl TimeResolver {
    /// Create a resolver for the given campus timezone.
    #[must_use]
    pub const fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// The campus timezone.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Resolve an instant in the campus timezone.
    #[must_use]
    pub fn resolve<Z: TimeZone>(&self, instant: &DateTime<Z>) -> TimeDescriptor {
        let local = instant.with_timezone(&self.timezone);
        // hour() < 24 and minute() < 60, so both casts are lossless.
        #[allow(clippy::cast_possible_truncation)]
        let minutes = (local.hour() * 60 + local.minute()) as u16;
        #[allow(clippy::cast_possible_truncation)]
        let day = local.weekday().num_days_from_sunday() as u8;

        TimeDescriptor {
            minutes_since_midnight: minutes,
            day_of_week: day,
            display: local.format("%-I:%M %p").to_string(),
        }
    }

    /// Resolve the current wall-clock instant.
    #[must_use]
    pub fn now(&self) -> TimeDescriptor {
        self.resolve(&Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_minutes_until_forward() {
        assert_eq!(minutes_until(125, 420), 295);
        assert_eq!(minutes_until(395, 420), 25);
    }

    #[test]
    fn test_minutes_until_wraps_past_midnight() {
        assert_eq!(minutes_until(1430, 120), 130);
        assert_eq!(minutes_until(420, 420), MINUTES_PER_DAY);
    }

    #[test]
    fn test_format_minute_of_day() {
        assert_eq!(format_minute_of_day(0), "12:00 AM");
        assert_eq!(format_minute_of_day(125), "2:05 AM");
        assert_eq!(format_minute_of_day(720), "12:00 PM");
        assert_eq!(format_minute_of_day(712), "11:52 AM");
        assert_eq!(format_minute_of_day(1439), "11:59 PM");
    }

    #[test]
    fn test_descriptor_rejects_out_of_domain() {
        assert!(matches!(
            TimeDescriptor::new(1440, 2),
            Err(LotwatchError::MinuteOutOfRange(1440))
        ));
        assert!(matches!(
            TimeDescriptor::new(10, 7),
            Err(LotwatchError::DayOutOfRange(7))
        ));
    }

    #[test]
    fn test_descriptor_weekend() {
        assert!(TimeDescriptor::new(600, 0).unwrap().is_weekend());
        assert!(TimeDescriptor::new(600, 6).unwrap().is_weekend());
        assert!(!TimeDescriptor::new(600, 3).unwrap().is_weekend());
    }

    #[test]
    fn test_resolve_uses_campus_timezone() {
        let resolver = TimeResolver::new(chrono_tz::America::Los_Angeles);
        // Wednesday 2025-01-15 10:05 UTC is 02:05 PST on the same day.
        let time = resolver.resolve(&utc("2025-01-15T10:05:00Z"));
        assert_eq!(time.minutes_since_midnight(), 125);
        assert_eq!(time.day_of_week(), 3);
        assert_eq!(time.display(), "2:05 AM");
    }

    #[test]
    fn test_resolve_crosses_local_midnight() {
        let resolver = TimeResolver::new(chrono_tz::America::Los_Angeles);
        // Sunday 2025-01-19 03:00 UTC is Saturday 19:00 PST.
        let time = resolver.resolve(&utc("2025-01-19T03:00:00Z"));
        assert_eq!(time.minutes_since_midnight(), 19 * 60);
        assert_eq!(time.day_of_week(), 6);
        assert!(time.is_weekend());
    }

    #[test]
    fn test_resolve_follows_daylight_saving() {
        let resolver = TimeResolver::new(chrono_tz::America::Los_Angeles);
        // 15:00 UTC is 07:00 PST in January and 08:00 PDT in July.
        let winter = resolver.resolve(&utc("2025-01-15T15:00:00Z"));
        let summer = resolver.resolve(&utc("2025-07-15T15:00:00Z"));
        assert_eq!(winter.minutes_since_midnight(), 420);
        assert_eq!(summer.minutes_since_midnight(), 480);
    }
}
