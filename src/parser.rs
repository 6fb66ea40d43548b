//! JSON parser for vehicle-count endpoint responses.

use serde::Deserialize;
use serde_json::Value;

use crate::error::SourceError;
use crate::model::DetailRecord;

/// Decodes the records from a response body shaped `[{"data": [...]}, ...]`.
///
/// Only the first element of the outer array is read. Grouped entries
/// (`{"camera_id": .., "details": [..]}`) are flattened in order.
///
/// # Errors
///
/// [`SourceError::EmptyBody`] for a blank body, [`SourceError::Malformed`] for
/// anything that is not the expected shape.
pub fn parse_counts(body: &[u8]) -> Result<Vec<DetailRecord>, SourceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(SourceError::EmptyBody);
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| SourceError::Malformed(e.to_string()))?;

    let data = value
        .as_array()
        .ok_or_else(|| SourceError::Malformed("response is not an array".into()))?
        .first()
        .and_then(|first| first.get("data"))
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Malformed("missing `data` array".into()))?;

    let mut records = Vec::new();
    for entry in data {
        // an entry carrying `details` is grouped, whatever that field holds
        match entry.get("details") {
            Some(details) => records.extend(decode::<Vec<DetailRecord>>(details)?),
            None => records.push(decode::<DetailRecord>(entry)?),
        }
    }

    Ok(records)
}

fn decode<'a, T: Deserialize<'a>>(value: &'a Value) -> Result<T, SourceError> {
    T::deserialize(value).map_err(|e| SourceError::Malformed(e.to_string()))
}
