//! Zone label encoding: categorical code → dense integer.
//!
//! Classes are fit on the training zones (sorted) and the same mapping is
//! reused for test rows; a test zone never seen during fit is a hard error.

use crate::error::{PipelineError, Result};

/// Fitted zone-code encoder with a stable sorted class list.
#[derive(Debug, Clone)]
pub struct ZoneEncoder {
    classes: Vec<String>,
}

impl ZoneEncoder {
    /// Fit on the distinct zone codes, sorted lexicographically.
    pub fn fit<'a>(zones: impl IntoIterator<Item = &'a str>) -> Self {
        let mut classes: Vec<String> = zones.into_iter().map(str::to_string).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Encode one zone code as its dense class index.
    pub fn encode(&self, zone: &str) -> Result<f64> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(zone))
            .map(|i| i as f64)
            .map_err(|_| PipelineError::UnknownZone(zone.to_string()))
    }

    /// The fitted classes in encoding order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
