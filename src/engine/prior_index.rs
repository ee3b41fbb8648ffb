//! Global read-only index of positive records for cross-batch lookups

use std::collections::HashMap;

use crate::types::TransactionRecord;

/// Index of every cross-batch match candidate in the dataset, keyed by
/// effective correlation key.
///
/// Built exactly once from the full screened input, before any batch is
/// processed, and never written to afterwards. Per-batch processing shares
/// it by reference, so batches stay independent of one another.
///
/// Only positive, non-penny, dated records are indexed: an undated positive
/// can never satisfy the cross-batch chronology predicate, and pennies are
/// never match candidates. Candidates for a key are ordered by posting date
/// ascending, ties broken by input position.
#[derive(Debug, Clone, Default)]
pub struct PriorIndex {
    index: HashMap<String, Vec<TransactionRecord>>,
}

impl PriorIndex {
    /// Build the index from the full screened record set
    pub fn build(records: &[TransactionRecord]) -> Self {
        let mut staging: HashMap<String, Vec<(usize, TransactionRecord)>> = HashMap::new();

        for (position, record) in records.iter().enumerate() {
            if !record.is_positive() || record.is_penny() || record.date.is_none() {
                continue;
            }
            if let Some(key) = record.effective_correlation() {
                staging
                    .entry(key.to_string())
                    .or_default()
                    .push((position, record.clone()));
            }
        }

        let mut index = HashMap::with_capacity(staging.len());
        for (key, mut candidates) in staging {
            candidates.sort_by_key(|(position, record)| (record.date, *position));
            index.insert(
                key,
                candidates.into_iter().map(|(_, record)| record).collect(),
            );
        }

        Self { index }
    }

    /// Cross-batch candidates for a correlation key, in date order.
    ///
    /// An absent key means no candidate positives exist for that key
    /// anywhere in the dataset.
    pub fn candidates(&self, correlation_key: &str) -> Option<&[TransactionRecord]> {
        self.index.get(correlation_key).map(Vec::as_slice)
    }

    /// Number of distinct correlation keys indexed
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the index holds no candidates at all
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
