//! Calendar features derived from a (date, hour) slot.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::core::slot_timestamp;

/// Derived calendar fields for one observation row.
///
/// Fields are kept as f64 so they drop straight into a feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    /// Combined timestamp: date at midnight plus the hour offset.
    pub timestamp: NaiveDateTime,
    /// Day of week, 0 = Monday.
    pub dow: f64,
    /// Month, 1..=12.
    pub month: f64,
    /// Day of year, 1..=366.
    pub doy: f64,
    /// Calendar year.
    pub year: f64,
    /// Day of month, 1..=31.
    pub day: f64,
    /// ISO week number, 1..=53.
    pub week: f64,
    /// Day of week stretched onto the weekly cycle: `dow / (7 / 2π)`.
    pub dow_norm: f64,
}

/// Build calendar features for one (date, hour) slot.
pub fn calendar_features(date: NaiveDate, hour: u32) -> Calendar {
    let dow = f64::from(date.weekday().num_days_from_monday());
    let week_period = 7.0 / (2.0 * std::f64::consts::PI);
    Calendar {
        timestamp: slot_timestamp(date, hour),
        dow,
        month: f64::from(date.month()),
        doy: f64::from(date.ordinal()),
        year: f64::from(date.year()),
        day: f64::from(date.day()),
        week: f64::from(date.iso_week().week()),
        dow_norm: dow / week_period,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fields_for_a_known_date() {
        // 2019-01-01 was a Tuesday in ISO week 1.
        let cal = calendar_features(NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(), 5);
        assert_relative_eq!(cal.dow, 1.0, epsilon = 1e-12);
        assert_relative_eq!(cal.month, 1.0, epsilon = 1e-12);
        assert_relative_eq!(cal.doy, 1.0, epsilon = 1e-12);
        assert_relative_eq!(cal.year, 2019.0, epsilon = 1e-12);
        assert_relative_eq!(cal.day, 1.0, epsilon = 1e-12);
        assert_relative_eq!(cal.week, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn dow_norm_is_a_linear_stretch_of_dow() {
        // Sunday (dow 6) maps to 6 * 2π / 7, not to radians of a clock.
        let cal = calendar_features(NaiveDate::from_ymd_opt(2019, 1, 6).unwrap(), 0);
        assert_relative_eq!(cal.dow, 6.0, epsilon = 1e-12);
        assert_relative_eq!(
            cal.dow_norm,
            6.0 * 2.0 * std::f64::consts::PI / 7.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn timestamp_includes_hour_offset() {
        let cal = calendar_features(NaiveDate::from_ymd_opt(2018, 6, 15).unwrap(), 13);
        assert_eq!(
            cal.timestamp,
            NaiveDate::from_ymd_opt(2018, 6, 15)
                .unwrap()
                .and_hms_opt(13, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn iso_week_rolls_over_at_year_end() {
        // 2018-12-31 belongs to ISO week 1 of 2019.
        let cal = calendar_features(NaiveDate::from_ymd_opt(2018, 12, 31).unwrap(), 0);
        assert_relative_eq!(cal.week, 1.0, epsilon = 1e-12);
    }
}
