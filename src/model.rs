//! Core data types shared by the fetch, merge and projection stages.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PipelineError, SourceError};

/// Identifier of a single camera. Ordering is numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub u32);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SourceId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(SourceId)
    }
}

/// Inclusive calendar date range sent to the endpoint.
///
/// No ordering is enforced: `start` may fall after `end`, and the pair is
/// forwarded exactly as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Both bounds set to the current UTC date.
    pub fn today() -> Self {
        let today = Utc::now().date_naive();
        Self::new(today, today)
    }

    /// Parses both bounds with [`parse_day`].
    pub fn parse(start: &str, end: &str) -> Result<Self, PipelineError> {
        Ok(Self::new(parse_day(start)?, parse_day(end)?))
    }

    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn stop_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start_param(), self.stop_param())
    }
}

/// Reads a calendar day from `YYYY-MM-DD`, an RFC 3339 timestamp, or a naive
/// `YYYY-MM-DDTHH:MM:SS` timestamp. Timestamps are truncated to the UTC day.
pub fn parse_day(input: &str) -> Result<NaiveDate, PipelineError> {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc).date_naive());
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|ts| ts.date())
        .map_err(|source| PipelineError::InvalidDate {
            input: input.to_string(),
            source,
        })
}

/// One (vehicle category, direction, count) observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRecord {
    #[serde(default)]
    pub vehicle_type_name: String,
    #[serde(default)]
    pub direction_type_name: String,
    #[serde(default)]
    pub count: u64,
}

impl DetailRecord {
    pub fn new(category: &str, direction: &str, count: u64) -> Self {
        Self {
            vehicle_type_name: category.to_string(),
            direction_type_name: direction.to_string(),
            count,
        }
    }
}

/// Records returned by one source for the queried range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceResult {
    pub source: SourceId,
    pub records: Vec<DetailRecord>,
}

/// Settled result of a single fan-out request.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: SourceId,
    pub result: Result<SourceResult, SourceError>,
}

/// The merged snapshot backing every projection. Replaced wholesale per search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateDataset {
    pub sources: Vec<SourceResult>,
}

impl AggregateDataset {
    /// True when no source contributed a record.
    pub fn is_empty(&self) -> bool {
        self.sources.iter().all(|s| s.records.is_empty())
    }

    pub fn record_count(&self) -> usize {
        self.sources.iter().map(|s| s.records.len()).sum()
    }

    /// Sum of every record's count, saturating at `u64::MAX`.
    pub fn total_count(&self) -> u64 {
        self.records()
            .fold(0u64, |acc, (_, r)| acc.saturating_add(r.count))
    }

    /// All records in merged order, paired with their source.
    pub fn records(&self) -> impl Iterator<Item = (SourceId, &DetailRecord)> {
        self.sources
            .iter()
            .flat_map(|s| s.records.iter().map(move |r| (s.source, r)))
    }
}

/// One row of the flat table view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub camera_id: SourceId,
    pub vehicle_type_name: String,
    pub direction_type_name: String,
    pub count: u64,
}

/// Per-source state after a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceState {
    Active { records: usize },
    NoData,
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub source: SourceId,
    pub state: SourceState,
}

impl SourceStatus {
    pub fn is_active(&self) -> bool {
        matches!(self.state, SourceState::Active { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(parse_day("2024-05-01").unwrap(), day(2024, 5, 1));
    }

    #[test]
    fn test_parse_truncates_rfc3339_to_utc_day() {
        assert_eq!(
            parse_day("2024-05-01T23:30:00Z").unwrap(),
            day(2024, 5, 1)
        );
        // 01:00 at +07:00 is still the previous day in UTC
        assert_eq!(
            parse_day("2024-05-02T01:00:00+07:00").unwrap(),
            day(2024, 5, 1)
        );
    }

    #[test]
    fn test_parse_naive_datetime() {
        assert_eq!(
            parse_day("2024-05-01T08:15:00").unwrap(),
            day(2024, 5, 1)
        );
    }

    #[test]
    fn test_parse_garbage_is_pipeline_error() {
        let err = parse_day("yesterday").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDate { ref input, .. } if input == "yesterday"));
    }

    #[test]
    fn test_reversed_range_is_kept() {
        let range = DateRange::parse("2024-05-10", "2024-05-01").unwrap();
        assert_eq!(range.start_param(), "2024-05-10");
        assert_eq!(range.stop_param(), "2024-05-01");
    }

    #[test]
    fn test_source_id_orders_numerically() {
        let mut ids: Vec<SourceId> = ["10", "2", "1"].iter().map(|s| s.parse().unwrap()).collect();
        ids.sort();
        assert_eq!(ids, vec![SourceId(1), SourceId(2), SourceId(10)]);
    }

    #[test]
    fn test_dataset_empty_when_sources_have_no_records() {
        let dataset = AggregateDataset {
            sources: vec![SourceResult {
                source: SourceId(1),
                records: vec![],
            }],
        };
        assert!(dataset.is_empty());
        assert_eq!(dataset.total_count(), 0);
    }

    #[test]
    fn test_detail_record_defaults_missing_fields() {
        let record: DetailRecord = serde_json::from_str(r#"{"vehicle_type_name":"car"}"#).unwrap();
        assert_eq!(record, DetailRecord::new("car", "", 0));
    }
}
