//! Missing-value backfiller.
//!
//! Reindexes each zone onto a complete hourly grid spanning its observed
//! min..max timestamp and fills inserted gaps by looking back exactly one
//! week (168 hours) repeatedly until a real value is found. Gaps are
//! filled in ascending time order, so a value filled earlier can serve a
//! later gap one week downstream.

use std::collections::HashMap;

use chrono::Duration;
use tracing::debug;

use crate::core::TrainRecord;
use crate::error::{PipelineError, Result};

/// Hours in one week, the carry-forward lag.
const WEEK_HOURS: usize = 168;

/// Backfill missing hourly slots for every zone.
///
/// The weekly lookback is bounded by the start of the zone's grid:
/// stepping past it is a fatal [`PipelineError::UnfilledGap`], never an
/// unbounded loop. Before returning, the output is re-checked to hold no
/// remaining gaps; this is a correctness gate, not a best-effort fill.
pub fn fill_missing_values(records: &[TrainRecord]) -> Result<Vec<TrainRecord>> {
    if records.is_empty() {
        return Err(PipelineError::EmptyData);
    }

    // Zones in first-appearance order.
    let mut zones: Vec<&str> = Vec::new();
    for rec in records {
        if !zones.contains(&rec.zone.as_str()) {
            zones.push(&rec.zone);
        }
    }

    let mut out = Vec::with_capacity(records.len());
    for zone in zones {
        let observed: HashMap<_, _> = records
            .iter()
            .filter(|r| r.zone == zone)
            .map(|r| (r.timestamp(), (r.bandwidth, r.max_user)))
            .collect();

        let start = observed.keys().min().copied().ok_or(PipelineError::EmptyData)?;
        let end = observed.keys().max().copied().ok_or(PipelineError::EmptyData)?;

        // Complete hourly grid with nulls where no observation exists.
        let n_slots = (end - start).num_hours() as usize + 1;
        let mut bandwidth: Vec<Option<f64>> = Vec::with_capacity(n_slots);
        let mut max_user: Vec<Option<f64>> = Vec::with_capacity(n_slots);
        for i in 0..n_slots {
            let ts = start + Duration::hours(i as i64);
            match observed.get(&ts) {
                Some(&(bw, u)) => {
                    bandwidth.push(Some(bw));
                    max_user.push(Some(u));
                }
                None => {
                    bandwidth.push(None);
                    max_user.push(None);
                }
            }
        }

        let inserted = bandwidth.iter().filter(|v| v.is_none()).count();
        if inserted > 0 {
            debug!(zone, inserted, "backfilling missing hourly slots");
        }

        for column in [&mut bandwidth, &mut max_user] {
            fill_column(column, zone, start)?;
        }

        for i in 0..n_slots {
            let ts = start + Duration::hours(i as i64);
            match (bandwidth[i], max_user[i]) {
                (Some(bw), Some(u)) => {
                    out.push(TrainRecord::from_timestamp(zone.to_string(), ts, bw, u));
                }
                // Unreachable after fill_column, kept as the hard gate.
                _ => {
                    return Err(PipelineError::UnfilledGap {
                        zone: zone.to_string(),
                        timestamp: ts,
                    })
                }
            }
        }
    }

    Ok(out)
}

/// Fill nulls in one target column by repeated weekly lookback.
fn fill_column(
    column: &mut [Option<f64>],
    zone: &str,
    start: chrono::NaiveDateTime,
) -> Result<()> {
    for i in 0..column.len() {
        if column[i].is_some() {
            continue;
        }
        let mut j = i;
        loop {
            if j < WEEK_HOURS {
                return Err(PipelineError::UnfilledGap {
                    zone: zone.to_string(),
                    timestamp: start + Duration::hours(i as i64),
                });
            }
            j -= WEEK_HOURS;
            if let Some(value) = column[j] {
                column[i] = Some(value);
                break;
            }
        }
    }
    Ok(())
}
