//! Special-day annotations: per-zone demand-shock weights and a holiday flag.
//!
//! These are hand-tuned tables encoding known irregular-traffic events a
//! pure time-series model cannot infer from limited history. They are the
//! one piece of domain knowledge that needs future editing, so they live
//! here as named constants rather than scattered literals.

use chrono::{Datelike, NaiveDate};

/// Hand-tuned shock weight for one zone (negative = demand drop).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneShock {
    /// Zone code the weight applies to.
    pub zone: &'static str,
    /// Weight applied to `abnormal_bw`.
    pub bandwidth: f64,
    /// Weight applied to `abnormal_u`.
    pub max_user: f64,
}

/// Shock table used by the baseline pipeline (asymmetric for ZONE03).
pub const BASELINE_SHOCKS: [ZoneShock; 3] = [
    ZoneShock {
        zone: "ZONE01",
        bandwidth: -1.0,
        max_user: -1.0,
    },
    ZoneShock {
        zone: "ZONE02",
        bandwidth: 1.0,
        max_user: 1.0,
    },
    ZoneShock {
        zone: "ZONE03",
        bandwidth: 0.2,
        max_user: 0.8,
    },
];

/// Shock table used by the revised pipeline.
pub const REVISED_SHOCKS: [ZoneShock; 3] = [
    ZoneShock {
        zone: "ZONE01",
        bandwidth: -1.0,
        max_user: -1.0,
    },
    ZoneShock {
        zone: "ZONE02",
        bandwidth: 0.8,
        max_user: 0.8,
    },
    ZoneShock {
        zone: "ZONE03",
        bandwidth: 0.2,
        max_user: 0.6,
    },
];

/// Inclusive date ranges of known sudden demand shifts, as (y, m, d) pairs.
const ABNORMAL_RANGES: [((i32, u32, u32), (i32, u32, u32)); 2] = [
    ((2018, 2, 10), (2018, 2, 27)),
    ((2019, 1, 30), (2019, 2, 12)),
];

/// Fixed list of known holiday dates spanning two years.
const HOLIDAYS: [(i32, u32, u32); 28] = [
    (2017, 12, 23),
    (2017, 12, 24),
    (2017, 12, 25),
    (2018, 1, 1),
    (2018, 2, 14),
    (2018, 2, 15),
    (2018, 2, 16),
    (2018, 2, 17),
    (2018, 2, 18),
    (2018, 2, 19),
    (2018, 2, 20),
    (2018, 3, 27),
    (2018, 4, 30),
    (2018, 5, 1),
    (2018, 9, 2),
    (2018, 9, 3),
    (2018, 12, 31),
    (2019, 1, 1),
    (2019, 2, 4),
    (2019, 2, 5),
    (2019, 2, 6),
    (2019, 2, 7),
    (2019, 2, 8),
    (2019, 4, 15),
    (2019, 4, 29),
    (2019, 4, 30),
    (2019, 5, 1),
    (2019, 9, 2),
];

/// Special-day columns for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecialDays {
    /// Demand-shock weight for the bandwidth target (0 outside shocks).
    pub abnormal_bw: f64,
    /// Demand-shock weight for the max-user target (0 outside shocks).
    pub abnormal_u: f64,
    /// 1 if the date is a known holiday, else 0.
    pub holiday: f64,
}

fn ymd(date: NaiveDate) -> (i32, u32, u32) {
    (date.year(), date.month(), date.day())
}

/// True when the date falls inside one of the fixed abnormal ranges.
pub fn is_abnormal(date: NaiveDate) -> bool {
    let d = ymd(date);
    ABNORMAL_RANGES
        .iter()
        .any(|&(start, end)| d >= start && d <= end)
}

/// True when the date is in the fixed holiday list.
pub fn is_holiday(date: NaiveDate) -> bool {
    HOLIDAYS.contains(&ymd(date))
}

/// Annotate one (zone, date) with shock weights and the holiday flag.
///
/// Zones absent from the table get zero weights.
pub fn special_day_features(zone: &str, date: NaiveDate, shocks: &[ZoneShock]) -> SpecialDays {
    let (abnormal_bw, abnormal_u) = if is_abnormal(date) {
        shocks
            .iter()
            .find(|s| s.zone == zone)
            .map(|s| (s.bandwidth, s.max_user))
            .unwrap_or((0.0, 0.0))
    } else {
        (0.0, 0.0)
    };
    SpecialDays {
        abnormal_bw,
        abnormal_u,
        holiday: if is_holiday(date) { 1.0 } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ==================== shock weights ====================

    #[test]
    fn listed_zone_inside_range_gets_its_weight() {
        let s = special_day_features("ZONE01", date(2018, 2, 15), &BASELINE_SHOCKS);
        assert_relative_eq!(s.abnormal_bw, -1.0, epsilon = 1e-12);
        assert_relative_eq!(s.abnormal_u, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn unlisted_zone_inside_range_gets_zero() {
        let s = special_day_features("ZONE04", date(2018, 2, 15), &BASELINE_SHOCKS);
        assert_relative_eq!(s.abnormal_bw, 0.0, epsilon = 1e-12);
        assert_relative_eq!(s.abnormal_u, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn listed_zone_outside_range_gets_zero() {
        let s = special_day_features("ZONE01", date(2018, 6, 1), &BASELINE_SHOCKS);
        assert_relative_eq!(s.abnormal_bw, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn second_range_is_honored() {
        let s = special_day_features("ZONE02", date(2019, 2, 1), &BASELINE_SHOCKS);
        assert_relative_eq!(s.abnormal_bw, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn tables_differ_between_variants() {
        let baseline = special_day_features("ZONE03", date(2019, 2, 1), &BASELINE_SHOCKS);
        let revised = special_day_features("ZONE03", date(2019, 2, 1), &REVISED_SHOCKS);
        assert_relative_eq!(baseline.abnormal_u, 0.8, epsilon = 1e-12);
        assert_relative_eq!(revised.abnormal_u, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(is_abnormal(date(2018, 2, 10)));
        assert!(is_abnormal(date(2018, 2, 27)));
        assert!(!is_abnormal(date(2018, 2, 28)));
        assert!(is_abnormal(date(2019, 1, 30)));
        assert!(is_abnormal(date(2019, 2, 12)));
        assert!(!is_abnormal(date(2019, 2, 13)));
    }

    // ==================== holiday flag ====================

    #[test]
    fn new_year_2019_is_a_holiday() {
        let s = special_day_features("ZONE01", date(2019, 1, 1), &BASELINE_SHOCKS);
        assert_relative_eq!(s.holiday, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn day_after_new_year_is_not() {
        let s = special_day_features("ZONE01", date(2019, 1, 2), &BASELINE_SHOCKS);
        assert_relative_eq!(s.holiday, 0.0, epsilon = 1e-12);
    }
}
