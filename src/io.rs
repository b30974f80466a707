//! CSV input/output.
//!
//! Column names are lowercased and trimmed on load, so files exported
//! with mixed-case or padded headers still parse. Files are read and
//! written in full; a failed write leaves no partial submission behind.

use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use serde::Deserialize;
use tracing::info;

use crate::core::{SubmissionRecord, TestRecord, TrainRecord};
use crate::error::{PipelineError, Result};

#[derive(Debug, Deserialize)]
struct RawTrainRow {
    zone_code: String,
    update_time: NaiveDate,
    hour_id: u32,
    bandwidth_total: f64,
    max_user: f64,
}

#[derive(Debug, Deserialize)]
struct RawTestRow {
    id: u64,
    zone_code: String,
    update_time: NaiveDate,
    hour_id: u32,
}

fn normalized_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: StringRecord = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    reader.set_headers(headers);
    Ok(reader)
}

fn check_row(zone: &str, hour: u32, value_ok: bool) -> Result<()> {
    if hour > 23 {
        return Err(PipelineError::InvalidParameter(format!(
            "hour_id {hour} out of range for zone {zone}"
        )));
    }
    if !value_ok {
        return Err(PipelineError::InvalidParameter(format!(
            "negative target value for zone {zone}"
        )));
    }
    Ok(())
}

/// Load the training observations.
pub fn load_train(path: &Path) -> Result<Vec<TrainRecord>> {
    let mut reader = normalized_reader(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize::<RawTrainRow>() {
        let row = row?;
        check_row(
            &row.zone_code,
            row.hour_id,
            row.bandwidth_total >= 0.0 && row.max_user >= 0.0,
        )?;
        records.push(TrainRecord {
            zone: row.zone_code,
            date: row.update_time,
            hour: row.hour_id,
            bandwidth: row.bandwidth_total,
            max_user: row.max_user,
        });
    }
    if records.is_empty() {
        return Err(PipelineError::EmptyData);
    }
    info!(rows = records.len(), path = %path.display(), "training data loaded");
    Ok(records)
}

/// Load the test rows to score.
pub fn load_test(path: &Path) -> Result<Vec<TestRecord>> {
    let mut reader = normalized_reader(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize::<RawTestRow>() {
        let row = row?;
        check_row(&row.zone_code, row.hour_id, true)?;
        records.push(TestRecord {
            id: row.id,
            zone: row.zone_code,
            date: row.update_time,
            hour: row.hour_id,
        });
    }
    if records.is_empty() {
        return Err(PipelineError::EmptyData);
    }
    info!(rows = records.len(), path = %path.display(), "test data loaded");
    Ok(records)
}

/// Write the submission file: one `id,label` row per test row, in order.
pub fn write_submission(path: &Path, rows: &[SubmissionRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(rows = rows.len(), path = %path.display(), "submission written");
    Ok(())
}
