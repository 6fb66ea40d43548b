//! Folds settled fan-out outcomes into a fresh [`AggregateDataset`].

use crate::model::{AggregateDataset, SourceOutcome, SourceState, SourceStatus};

/// Builds the new dataset and a status per source.
///
/// Unavailable sources are dropped. Sources that answered with no records are
/// kept out of the dataset too, but reported as [`SourceState::NoData`].
/// Outcome order is preserved.
pub fn merge_outcomes(outcomes: Vec<SourceOutcome>) -> (AggregateDataset, Vec<SourceStatus>) {
    let mut dataset = AggregateDataset::default();
    let mut statuses = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        let state = match outcome.result {
            Ok(result) if result.records.is_empty() => SourceState::NoData,
            Ok(result) => {
                let records = result.records.len();
                dataset.sources.push(result);
                SourceState::Active { records }
            }
            Err(e) => SourceState::Unavailable { reason: e.badge() },
        };

        statuses.push(SourceStatus {
            source: outcome.source,
            state,
        });
    }

    (dataset, statuses)
}
