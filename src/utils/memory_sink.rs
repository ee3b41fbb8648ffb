//! In-memory report sink for tests and examples

use async_trait::async_trait;

use crate::engine::RunReport;
use crate::traits::ReportSink;
use crate::types::ReconResult;

/// A [`ReportSink`] that simply collects every published report.
///
/// Useful in tests and demos; a production sink would render the report
/// to its output format instead.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Vec<RunReport>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports published so far, oldest first
    pub fn reports(&self) -> &[RunReport] {
        &self.reports
    }

    /// The most recently published report, if any
    pub fn last_report(&self) -> Option<&RunReport> {
        self.reports.last()
    }
}

#[async_trait]
impl ReportSink for MemorySink {
    async fn publish(&mut self, report: &RunReport) -> ReconResult<()> {
        self.reports.push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ReconciliationEngine;
    use crate::types::TransactionRecord;
    use bigdecimal::BigDecimal;

    #[tokio::test]
    async fn test_sink_collects_published_reports() {
        let records = vec![TransactionRecord::new(
            "1",
            "B1",
            BigDecimal::from(-50),
        )];

        let engine = ReconciliationEngine::with_defaults();
        let mut sink = MemorySink::new();
        let report = engine.reconcile_into(&records, &mut sink).await.unwrap();

        assert_eq!(sink.reports().len(), 1);
        assert_eq!(sink.last_report().unwrap().run_id, report.run_id);
    }
}
