//! Reconciliation engine orchestrator
//!
//! Runs the full pipeline over an in-memory snapshot: screen the input,
//! partition it into batches, freeze the global prior index, then classify
//! and aggregate each batch in first-seen order.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::config::EngineConfig;
use crate::engine::grouper::BatchGroups;
use crate::engine::matcher::MatchEngine;
use crate::engine::metrics::BatchMetricsAggregator;
use crate::engine::prior_index::PriorIndex;
use crate::traits::ReportSink;
use crate::types::{BatchMetrics, MatchResult, ReconError, ReconResult, TransactionRecord};
use crate::utils::{screen_records, ScreeningReport};

/// Everything one reconciliation run produced.
///
/// `match_results` is grouped by batch in first-seen batch order, with
/// negatives in their original per-batch order; `batch_metrics` follows
/// the same batch order. Apart from `run_id` and `executed_at`, two runs
/// over identical input and configuration produce identical reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Identity of this run
    pub run_id: Uuid,
    /// When the run executed (UTC)
    pub executed_at: NaiveDateTime,
    /// Configuration the run used
    pub config: EngineConfig,
    /// One entry per classified negative, across all batches
    pub match_results: Vec<MatchResult>,
    /// One entry per batch key
    pub batch_metrics: Vec<BatchMetrics>,
    /// Counts of records screened out before matching
    pub screening: ScreeningReport,
}

impl RunReport {
    /// Metrics for every batch flagged suspicious, in batch order
    pub fn suspicious_batches(&self) -> impl Iterator<Item = &BatchMetrics> {
        self.batch_metrics.iter().filter(|m| m.suspicious)
    }

    /// Match results belonging to one batch, in original negative order
    pub fn results_for_batch<'a>(
        &'a self,
        batch_key: &'a str,
    ) -> impl Iterator<Item = &'a MatchResult> {
        self.match_results
            .iter()
            .filter(move |r| r.batch_key == batch_key)
    }
}

/// The reconciliation engine.
///
/// Construction validates the configuration; a constructed engine can run
/// any number of snapshots. Each run is a pure function of its input:
/// the engine holds no mutable state and performs no I/O.
pub struct ReconciliationEngine {
    config: EngineConfig,
}

impl ReconciliationEngine {
    /// Create an engine after validating `config`
    pub fn new(config: EngineConfig) -> ReconResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create an engine with the default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// The configuration this engine runs with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full reconciliation pipeline over one snapshot.
    ///
    /// Fails fast with [`ReconError::EmptyInput`] when no records survive
    /// screening; there is nothing meaningful to reconcile. The prior
    /// index is built from the complete screened set and frozen before the
    /// first batch is processed, so per-batch work never touches shared
    /// mutable state.
    pub fn reconcile(&self, records: &[TransactionRecord]) -> ReconResult<RunReport> {
        let (screened, screening) = screen_records(records);
        if screened.is_empty() {
            return Err(ReconError::EmptyInput);
        }

        let groups = BatchGroups::partition(&screened, self.config.limit_batches);
        let prior_index = PriorIndex::build(&screened);

        let matcher = MatchEngine::new(&self.config, &prior_index);
        let aggregator = BatchMetricsAggregator::new(&self.config);

        let mut match_results = Vec::new();
        let mut batch_metrics = Vec::with_capacity(groups.len());

        for (batch_key, batch_records) in groups.iter() {
            let results = matcher.match_batch(batch_key, batch_records);
            batch_metrics.push(aggregator.aggregate(batch_key, batch_records, &results));
            match_results.extend(results);
        }

        Ok(RunReport {
            run_id: Uuid::new_v4(),
            executed_at: chrono::Utc::now().naive_utc(),
            config: self.config.clone(),
            match_results,
            batch_metrics,
            screening,
        })
    }

    /// Run the pipeline and hand the report to a sink
    pub async fn reconcile_into<S: ReportSink>(
        &self,
        records: &[TransactionRecord],
        sink: &mut S,
    ) -> ReconResult<RunReport> {
        let report = self.reconcile(records)?;
        sink.publish(&report).await?;
        Ok(report)
    }
}
