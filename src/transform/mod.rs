//! Data transformations: log scaling, min-max normalization, and the
//! hourly-grid missing-value backfiller.

pub mod fill;
pub mod log;
pub mod scale;

pub use fill::fill_missing_values;
pub use log::{expm1, log1p};
pub use scale::MinMaxScaler;
