//! Partitioning of the input sequence into batches

use std::collections::HashMap;

use crate::types::TransactionRecord;

/// Records partitioned by batch key, in first-seen key order.
///
/// The relative order of records within each batch is the original input
/// order; it is the deterministic iteration order used by the match engine.
#[derive(Debug, Clone, Default)]
pub struct BatchGroups {
    order: Vec<String>,
    groups: HashMap<String, Vec<TransactionRecord>>,
}

impl BatchGroups {
    /// Partition `records` by batch key.
    ///
    /// With `limit = Some(n)`, only the first `n` distinct batch keys (in
    /// first-seen order) are retained; records for later keys are dropped
    /// from grouping (they still participate in the global prior index,
    /// which is built separately from the full record set).
    pub fn partition(records: &[TransactionRecord], limit: Option<usize>) -> Self {
        let mut order = Vec::new();
        let mut groups: HashMap<String, Vec<TransactionRecord>> = HashMap::new();

        for record in records {
            if !groups.contains_key(&record.batch_key) {
                if let Some(max) = limit {
                    if order.len() >= max {
                        continue;
                    }
                }
                order.push(record.batch_key.clone());
            }
            groups
                .entry(record.batch_key.clone())
                .or_default()
                .push(record.clone());
        }

        Self { order, groups }
    }

    /// Number of distinct batches retained
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no batches were retained
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Batch keys in first-seen order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Records for one batch, in original input order
    pub fn records(&self, batch_key: &str) -> Option<&[TransactionRecord]> {
        self.groups.get(batch_key).map(Vec::as_slice)
    }

    /// Iterate batches in first-seen key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TransactionRecord])> {
        self.order.iter().map(move |key| {
            let records = self
                .groups
                .get(key)
                .map(Vec::as_slice)
                .unwrap_or_default();
            (key.as_str(), records)
        })
    }
}
