//! Vehicle category × direction cross-tabulation.

use serde::Serialize;

use crate::model::{AggregateDataset, DetailRecord, SourceId};

/// Summed counts keyed by (category, direction).
///
/// Categories and directions keep first-seen order from the input. Every
/// pair has a cell; pairs without a matching record hold 0. Sums saturate at
/// `u64::MAX`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossTab {
    pub categories: Vec<String>,
    pub directions: Vec<String>,
    /// `cells[direction][category]`, one series per direction.
    cells: Vec<Vec<u64>>,
}

impl CrossTab {
    /// Cross-tab over every record in the dataset.
    pub fn from_dataset(dataset: &AggregateDataset) -> Self {
        Self::from_records(dataset.records().map(|(_, r)| r))
    }

    /// Cross-tab restricted to the records of one source.
    pub fn for_source(dataset: &AggregateDataset, source: SourceId) -> Self {
        Self::from_records(
            dataset
                .records()
                .filter(|(id, _)| *id == source)
                .map(|(_, r)| r),
        )
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a DetailRecord>) -> Self {
        let records: Vec<&DetailRecord> = records.into_iter().collect();
        let mut categories: Vec<String> = Vec::new();
        let mut directions: Vec<String> = Vec::new();

        for r in &records {
            if !categories.contains(&r.vehicle_type_name) {
                categories.push(r.vehicle_type_name.clone());
            }
            if !directions.contains(&r.direction_type_name) {
                directions.push(r.direction_type_name.clone());
            }
        }

        let mut cells = vec![vec![0u64; categories.len()]; directions.len()];

        for r in records {
            let c = position(&categories, &r.vehicle_type_name);
            let d = position(&directions, &r.direction_type_name);
            if let (Some(c), Some(d)) = (c, d) {
                cells[d][c] = cells[d][c].saturating_add(r.count);
            }
        }

        Self {
            categories,
            directions,
            cells,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Summed count for a pair; 0 for pairs never seen.
    pub fn get(&self, category: &str, direction: &str) -> u64 {
        match (
            position(&self.categories, category),
            position(&self.directions, direction),
        ) {
            (Some(c), Some(d)) => self.cells[d][c],
            _ => 0,
        }
    }

    /// One `(direction, counts per category)` series per direction.
    pub fn series(&self) -> impl Iterator<Item = (&str, &[u64])> {
        self.directions
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter().map(Vec::as_slice))
    }

    pub fn total(&self) -> u64 {
        self.cells
            .iter()
            .flatten()
            .fold(0u64, |acc, &n| acc.saturating_add(n))
    }

    pub fn max_cell(&self) -> u64 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }
}

fn position(values: &[String], needle: &str) -> Option<usize> {
    values.iter().position(|v| v == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceResult;

    fn dataset() -> AggregateDataset {
        AggregateDataset {
            sources: vec![
                SourceResult {
                    source: SourceId(2),
                    records: vec![
                        DetailRecord::new("truck", "out", 4),
                        DetailRecord::new("car", "in", 3),
                    ],
                },
                SourceResult {
                    source: SourceId(1),
                    records: vec![
                        DetailRecord::new("car", "in", 5),
                        DetailRecord::new("bus", "in", 1),
                        DetailRecord::new("car", "in", 2),
                    ],
                },
            ],
        }
    }

    #[test]
    fn test_first_seen_ordering() {
        let tab = CrossTab::from_dataset(&dataset());
        assert_eq!(tab.categories, vec!["truck", "car", "bus"]);
        assert_eq!(tab.directions, vec!["out", "in"]);
    }

    #[test]
    fn test_sums_every_matching_record() {
        let tab = CrossTab::from_dataset(&dataset());
        // includes the duplicate (car, in) inside source 1
        assert_eq!(tab.get("car", "in"), 10);
        assert_eq!(tab.get("truck", "out"), 4);
    }

    #[test]
    fn test_missing_pairs_are_zero() {
        let tab = CrossTab::from_dataset(&dataset());
        assert_eq!(tab.get("bus", "out"), 0);
        assert_eq!(tab.get("bicycle", "in"), 0);

        let (_, out_series) = tab.series().next().unwrap();
        assert_eq!(out_series, &[4, 0, 0]);
    }

    #[test]
    fn test_sum_invariant() {
        let data = dataset();
        let tab = CrossTab::from_dataset(&data);
        assert_eq!(tab.total(), data.total_count());
        assert_eq!(tab.total(), 15);
    }

    #[test]
    fn test_recompute_is_identical() {
        let data = dataset();
        assert_eq!(CrossTab::from_dataset(&data), CrossTab::from_dataset(&data));
    }

    #[test]
    fn test_for_source_filters_records() {
        let data = dataset();
        let tab = CrossTab::for_source(&data, SourceId(1));
        assert_eq!(tab.categories, vec!["car", "bus"]);
        assert_eq!(tab.directions, vec!["in"]);
        assert_eq!(tab.get("car", "in"), 7);
        assert_eq!(tab.total(), 8);

        assert!(CrossTab::for_source(&data, SourceId(9)).is_empty());
    }

    #[test]
    fn test_sums_saturate_instead_of_overflowing() {
        let data = AggregateDataset {
            sources: vec![
                SourceResult {
                    source: SourceId(1),
                    records: vec![DetailRecord::new("car", "in", u64::MAX)],
                },
                SourceResult {
                    source: SourceId(2),
                    records: vec![
                        DetailRecord::new("car", "in", 1),
                        DetailRecord::new("bus", "out", 7),
                    ],
                },
            ],
        };

        let tab = CrossTab::from_dataset(&data);
        assert_eq!(tab.get("car", "in"), u64::MAX);
        assert_eq!(tab.get("bus", "out"), 7);
        assert_eq!(tab.total(), u64::MAX);
        assert_eq!(tab.total(), data.total_count());
        assert_eq!(tab.max_cell(), u64::MAX);
    }

    #[test]
    fn test_empty_dataset() {
        let tab = CrossTab::from_dataset(&AggregateDataset::default());
        assert!(tab.is_empty());
        assert!(tab.directions.is_empty());
        assert_eq!(tab.total(), 0);
        assert_eq!(tab.max_cell(), 0);
    }
}
