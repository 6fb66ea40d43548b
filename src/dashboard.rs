//! Search session: owns the current dataset and runs the
//! fetch → merge pipeline that replaces it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info};

use crate::config::Config;
use crate::crosstab::CrossTab;
use crate::error::PipelineError;
use crate::fetch::{Endpoint, HttpClient, fetch_all};
use crate::merge::merge_outcomes;
use crate::model::{AggregateDataset, DateRange, SourceId, SourceOutcome, SourceStatus, TableRow};

/// Observable "search in flight" flag for busy indicators.
#[derive(Debug, Clone, Default)]
pub struct LoadingState(Arc<AtomicBool>);

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Raises the flag until the returned guard is dropped.
    pub fn begin(&self) -> LoadingGuard {
        self.0.store(true, Ordering::Release);
        LoadingGuard(self.0.clone())
    }
}

/// Clears the loading flag on drop, including during unwinding.
#[must_use = "the loading flag is cleared as soon as the guard is dropped"]
pub struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// User-visible notice raised by a search. At most one per search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    NoData,
    Failed,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::NoData => "No data found for the selected date range",
            Notice::Failed => "Something went wrong while fetching data",
        }
    }
}

/// How a search ended.
#[derive(Debug)]
pub enum SearchOutcome {
    /// At least one source returned records.
    Loaded { statuses: Vec<SourceStatus> },
    /// Every source was unavailable or returned nothing.
    NoData { statuses: Vec<SourceStatus> },
    /// The search itself could not run; the dataset was reset.
    Failed(PipelineError),
}

impl SearchOutcome {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            SearchOutcome::Loaded { .. } => None,
            SearchOutcome::NoData { .. } => Some(Notice::NoData),
            SearchOutcome::Failed(_) => Some(Notice::Failed),
        }
    }

    pub fn statuses(&self) -> &[SourceStatus] {
        match self {
            SearchOutcome::Loaded { statuses } | SearchOutcome::NoData { statuses } => statuses,
            SearchOutcome::Failed(_) => &[],
        }
    }
}

pub struct Dashboard<C> {
    client: C,
    config: Config,
    dataset: AggregateDataset,
    loading: LoadingState,
}

impl<C: HttpClient> Dashboard<C> {
    pub fn new(client: C, config: Config) -> Self {
        Self {
            client,
            config,
            dataset: AggregateDataset::default(),
            loading: LoadingState::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle to the loading flag, for a spinner or similar.
    pub fn loading(&self) -> LoadingState {
        self.loading.clone()
    }

    pub fn dataset(&self) -> &AggregateDataset {
        &self.dataset
    }

    /// Runs a full search for the given date inputs and replaces the dataset.
    ///
    /// Per-source failures only show up in the returned statuses. Invalid
    /// dates or an invalid endpoint URL fail the whole search and leave an
    /// empty dataset behind.
    #[tracing::instrument(skip(self))]
    pub async fn search(&mut self, start: &str, end: &str) -> SearchOutcome {
        let _loading = self.loading.begin();

        match self.fan_out(start, end).await {
            Ok(outcomes) => {
                let (dataset, statuses) = merge_outcomes(outcomes);
                self.dataset = dataset;

                let active = statuses.iter().filter(|s| s.is_active()).count();
                info!(
                    sources = statuses.len(),
                    active,
                    records = self.dataset.record_count(),
                    "Search complete"
                );

                if self.dataset.is_empty() {
                    SearchOutcome::NoData { statuses }
                } else {
                    SearchOutcome::Loaded { statuses }
                }
            }
            Err(e) => {
                error!(error = %e, "Search failed");
                self.dataset = AggregateDataset::default();
                SearchOutcome::Failed(e)
            }
        }
    }

    async fn fan_out(&self, start: &str, end: &str) -> Result<Vec<SourceOutcome>, PipelineError> {
        let range = DateRange::parse(start, end)?;
        let endpoint = Endpoint::parse(&self.config.base_url, &self.config.source_type)?;

        Ok(fetch_all(&self.client, &endpoint, &self.config.sources, &range).await)
    }
}

impl<C> Dashboard<C> {
    /// Combined cross-tab over all sources. Recomputed on every call.
    pub fn crosstab(&self) -> CrossTab {
        CrossTab::from_dataset(&self.dataset)
    }

    /// Cross-tab for a single source. Recomputed on every call.
    pub fn source_crosstab(&self, source: SourceId) -> CrossTab {
        CrossTab::for_source(&self.dataset, source)
    }

    /// Flat rows ordered by camera id; records keep their order within a camera.
    pub fn table(&self) -> Vec<TableRow> {
        let mut sources: Vec<_> = self.dataset.sources.iter().collect();
        sources.sort_by_key(|s| s.source);

        sources
            .into_iter()
            .flat_map(|s| {
                s.records.iter().map(move |r| TableRow {
                    camera_id: s.source,
                    vehicle_type_name: r.vehicle_type_name.clone(),
                    direction_type_name: r.direction_type_name.clone(),
                    count: r.count,
                })
            })
            .collect()
    }

    /// Distinct cameras present in the dataset, ascending.
    pub fn active_sources(&self) -> Vec<SourceId> {
        let mut ids: Vec<SourceId> = self.dataset.sources.iter().map(|s| s.source).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
