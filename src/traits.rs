//! Traits for the engine's external collaborators
//!
//! The engine itself is a pure in-process computation; acquiring records
//! and delivering reports belong to the caller. These seams let the core
//! work with any store or exporter without knowing about it.

use async_trait::async_trait;

use crate::engine::RunReport;
use crate::types::{ReconResult, TransactionRecord};

/// Source of the transaction snapshot handed to the engine.
///
/// Implementations (SQL query, CSV parse, API pull) must return a finite,
/// fully materialized sequence; the engine builds its global prior index
/// from the complete set before processing any batch.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch every record for one reconciliation run
    async fn fetch_records(&self) -> ReconResult<Vec<TransactionRecord>>;
}

/// Destination for a finished run.
///
/// The engine's only output obligation is handing over the two result
/// collections in their stable order; rendering (CSV, Markdown,
/// dashboards) is entirely the sink's concern.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Publish one run report
    async fn publish(&mut self, report: &RunReport) -> ReconResult<()>;
}
