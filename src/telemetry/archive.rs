//! # Telemetry Archive
//!
//! Saves and loads telemetry history as comma-separated lines.
//!
//! ## Line Format
//!
//! ```text
//! <epoch_ms>,<b0>,<b1>,...,<b401>
//! ```
//!
//! Each `bN` is one byte of the raw telemetry frame written as a signed
//! decimal (-128..=127). There is no header row.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info};

use super::history::TelemetryHistory;
use super::record::TelemetryRecord;
use crate::error::{KipError, Result};
use crate::frame::protocol::TELEMETRY_FRAME_SIZE;

/// Fields per line: timestamp plus every frame byte
const FIELDS_PER_LINE: usize = 1 + TELEMETRY_FRAME_SIZE;

/// Fields of one archive line
pub fn encode_line(record: &TelemetryRecord) -> Vec<String> {
    let mut fields = Vec::with_capacity(FIELDS_PER_LINE);
    fields.push(record.epoch_millis().to_string());
    fields.extend(record.raw().iter().map(|&byte| (byte as i8).to_string()));
    fields
}

/// Rebuild a record from the fields of one archive line
///
/// # Errors
///
/// Returns error if the field count is wrong, a value does not parse, or the
/// timestamp is out of range.
pub fn decode_line(fields: &StringRecord) -> Result<TelemetryRecord> {
    if fields.len() != FIELDS_PER_LINE {
        return Err(KipError::Archive(format!(
            "Expected {} fields, got {}",
            FIELDS_PER_LINE,
            fields.len()
        )));
    }

    let epoch_millis: i64 = fields[0]
        .trim()
        .parse()
        .map_err(|e| KipError::Archive(format!("Invalid timestamp '{}': {}", &fields[0], e)))?;

    let bytes = fields
        .iter()
        .skip(1)
        .map(|field| {
            field
                .trim()
                .parse::<i8>()
                .map(|value| value as u8)
                .map_err(|e| KipError::Archive(format!("Invalid byte '{}': {}", field, e)))
        })
        .collect::<Result<Vec<u8>>>()?;

    TelemetryRecord::from_epoch_millis(epoch_millis, &bytes)
}

/// Write records to any writer, one line each
pub fn write_records<W: Write>(writer: W, records: &[Arc<TelemetryRecord>]) -> Result<()> {
    let mut csv = WriterBuilder::new().has_headers(false).from_writer(writer);

    for record in records {
        csv.write_record(encode_line(record))?;
    }

    csv.flush()?;
    Ok(())
}

/// Read records from any reader
///
/// # Errors
///
/// Returns error naming the 1-based line number of the first bad line.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<TelemetryRecord>> {
    let mut csv = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for (index, line) in csv.records().enumerate() {
        let line = line?;
        let record = decode_line(&line)
            .map_err(|e| KipError::Archive(format!("line {}: {}", index + 1, e)))?;
        records.push(record);
    }

    Ok(records)
}

/// Save the full history to a file
pub fn save<P: AsRef<Path>>(path: P, history: &TelemetryHistory) -> Result<usize> {
    let path = path.as_ref();
    let records = history.snapshot();

    write_records(File::create(path)?, &records)?;

    info!("Saved {} records to {}", records.len(), path.display());
    Ok(records.len())
}

/// Load records from a file and append them to the history
pub fn load<P: AsRef<Path>>(path: P, history: &TelemetryHistory) -> Result<usize> {
    let path = path.as_ref();
    let records = read_records(File::open(path)?)?;
    let count = records.len();

    for record in records {
        history.append(Arc::new(record));
    }

    debug!("Appended {} archived records", count);
    info!("Loaded {} records from {}", count, path.display());
    Ok(count)
}
