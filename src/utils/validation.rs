//! Upstream record screening
//!
//! Malformed records must never reach grouping, indexing, or matching,
//! and every skip must be observable so a batch's totals are never
//! silently corrupted.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::TransactionRecord;

/// Observable counts of records skipped before matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningReport {
    /// Records with a zero amount
    pub zero_amount: usize,
    /// Records with an empty or blank batch key
    pub missing_batch_key: usize,
}

impl ScreeningReport {
    /// Total records excluded from the run
    pub fn total_skipped(&self) -> usize {
        self.zero_amount + self.missing_batch_key
    }
}

/// Partition raw input into records fit for matching and a skip report.
///
/// A record is screened out when its amount is zero or its batch key is
/// blank. The relative order of retained records is preserved; it is the
/// order the grouper and prior index see.
pub fn screen_records(records: &[TransactionRecord]) -> (Vec<TransactionRecord>, ScreeningReport) {
    let mut retained = Vec::with_capacity(records.len());
    let mut report = ScreeningReport::default();

    for record in records {
        if record.amount == BigDecimal::from(0) {
            report.zero_amount += 1;
            continue;
        }
        if record.batch_key.trim().is_empty() {
            report.missing_batch_key += 1;
            continue;
        }
        retained.push(record.clone());
    }

    (retained, report)
}
