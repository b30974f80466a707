//! Feature engineering: calendar fields, special-day annotations, per-zone
//! aggregate lookups, and zone label encoding.

pub mod calendar;
pub mod encode;
pub mod special_days;
pub mod zones;

pub use calendar::{calendar_features, Calendar};
pub use encode::ZoneEncoder;
pub use special_days::{
    special_day_features, SpecialDays, ZoneShock, BASELINE_SHOCKS, REVISED_SHOCKS,
};
pub use zones::{zone_features, ZoneAggregateConfig, ZoneLookup};
