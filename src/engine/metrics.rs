//! Per-batch metrics aggregation and suspicion flagging

use bigdecimal::BigDecimal;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::engine::config::EngineConfig;
use crate::types::{BatchMetrics, MatchResult, ReasonCode, TransactionRecord};

/// Net-zero tolerance for reason code R3: `abs(net) <= 0.005 * total_positive`
fn net_zero_fraction() -> BigDecimal {
    BigDecimal::from(5) / BigDecimal::from(1000)
}

/// Negative-entry ratio at or above which a batch is flagged R4
const HIGH_NEGATIVE_RATIO: f64 = 0.4;

/// Computes one [`BatchMetrics`] from a batch's raw records plus the match
/// results produced for it.
pub struct BatchMetricsAggregator<'a> {
    config: &'a EngineConfig,
}

impl<'a> BatchMetricsAggregator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Aggregate one batch. `results` must be the match results emitted for
    /// this same batch; their reason codes are folded into the batch union.
    pub fn aggregate(
        &self,
        batch_key: &str,
        records: &[TransactionRecord],
        results: &[MatchResult],
    ) -> BatchMetrics {
        let total_records = records.len();
        let penny_count = records.iter().filter(|r| r.is_penny()).count();
        let negative_count = records
            .iter()
            .filter(|r| r.is_negative() && !(self.config.exclude_pennies && r.is_penny()))
            .count();

        let mut correlation_counts: HashMap<&str, usize> = HashMap::new();
        for record in records {
            if let Some(key) = record.effective_correlation() {
                *correlation_counts.entry(key).or_default() += 1;
            }
        }
        let distinct_correlation_count = correlation_counts.len();
        let repeat_correlation_count: usize = correlation_counts
            .values()
            .map(|count| count.saturating_sub(1))
            .sum();

        let distinct_secondary_group_count = records
            .iter()
            .filter_map(|r| r.secondary_correlation_id.as_deref())
            .collect::<HashSet<_>>()
            .len();

        let mut total_positive = BigDecimal::from(0);
        let mut total_negative = BigDecimal::from(0);
        for record in records {
            if record.is_positive() {
                total_positive += &record.amount;
            } else {
                total_negative += &record.amount;
            }
        }
        let net_amount = &total_positive + &total_negative;

        let negative_ratio = if total_records > 0 {
            negative_count as f64 / total_records as f64
        } else {
            0.0
        };

        let dated: Vec<_> = records.iter().filter_map(|r| r.date).collect();
        let span_days = match (dated.iter().min(), dated.iter().max()) {
            (Some(earliest), Some(latest)) => (*latest - *earliest).num_days(),
            _ => 0,
        };

        let mut reason_codes: BTreeSet<ReasonCode> = results
            .iter()
            .flat_map(|result| result.reason_codes.iter().copied())
            .collect();

        if repeat_correlation_count > 0 || distinct_correlation_count != total_records {
            reason_codes.insert(ReasonCode::RepeatedCorrelation);
        }

        if negative_count > 0
            && total_positive > BigDecimal::from(0)
            && net_amount.abs() <= &total_positive * net_zero_fraction()
        {
            reason_codes.insert(ReasonCode::NetZeroMixedSign);
        }

        if negative_count >= 2 && negative_ratio >= HIGH_NEGATIVE_RATIO {
            reason_codes.insert(ReasonCode::HighNegativeRatio);
        }

        let suspicious = !reason_codes.is_empty();

        BatchMetrics {
            batch_key: batch_key.to_string(),
            total_records,
            negative_count,
            penny_count,
            distinct_correlation_count,
            repeat_correlation_count,
            distinct_secondary_group_count,
            total_positive,
            total_negative,
            net_amount,
            negative_ratio,
            span_days,
            reason_codes,
            suspicious,
        }
    }
}
