//! Tiered match engine for classifying negative records
//!
//! For each qualifying negative in a batch the engine tries, in order:
//! an intra-batch exact amount match, an intra-batch aggregate
//! (subset-sum) match, a cross-batch windowed match against the global
//! prior index, and finally `Unmatched`. The first tier that succeeds is
//! terminal for that negative.

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use std::collections::{BTreeSet, HashMap};

use crate::engine::config::EngineConfig;
use crate::engine::prior_index::PriorIndex;
use crate::types::{MatchResult, MatchType, ReasonCode, TransactionRecord};

/// Maximum number of contributing negatives considered by the aggregate
/// (subset-sum) tier. Bounds the reachable-sum state to 2^15 entries;
/// beyond the cap the tier is skipped for that negative.
pub const AGGREGATE_CANDIDATE_CAP: usize = 15;

/// Absolute amount tolerance: $0.01
fn abs_tolerance() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}

/// Relative amount tolerance: 1e-4 of the larger magnitude
fn rel_tolerance() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(10_000)
}

/// Whether two amounts are equal within the engine tolerance
pub(crate) fn amounts_match(a: &BigDecimal, b: &BigDecimal) -> bool {
    let diff = (a - b).abs();
    if diff <= abs_tolerance() {
        return true;
    }
    let larger = a.abs().max(b.abs());
    diff <= larger * rel_tolerance()
}

/// Round an amount to whole cents for subset-sum arithmetic
fn to_cents(amount: &BigDecimal) -> Option<i64> {
    (amount * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
}

/// Cent-domain equivalent of [`amounts_match`]: one cent absolute, or
/// 1e-4 of the larger magnitude relative
fn cents_match(a: i64, b: i64) -> bool {
    let diff = (a - b).abs();
    if diff <= 1 {
        return true;
    }
    let larger = a.abs().max(b.abs());
    diff.saturating_mul(10_000) <= larger
}

/// Classifies every qualifying negative of one batch.
///
/// Holds only shared references; the prior index is frozen before any
/// matcher is constructed, so matchers for different batches are fully
/// independent of each other.
pub struct MatchEngine<'a> {
    config: &'a EngineConfig,
    prior_index: &'a PriorIndex,
}

impl<'a> MatchEngine<'a> {
    /// Create a matcher over a frozen prior index
    pub fn new(config: &'a EngineConfig, prior_index: &'a PriorIndex) -> Self {
        Self {
            config,
            prior_index,
        }
    }

    /// Classify every effective negative of `records` (one batch, in
    /// original input order), emitting exactly one result per negative in
    /// that same order.
    pub fn match_batch(&self, batch_key: &str, records: &[TransactionRecord]) -> Vec<MatchResult> {
        // Penny positives are never candidates, so the local index only
        // ever sees non-penny positives.
        let mut local_index: HashMap<&str, Vec<&TransactionRecord>> = HashMap::new();
        for record in records {
            if record.is_positive() && !record.is_penny() {
                if let Some(key) = record.effective_correlation() {
                    local_index.entry(key).or_default().push(record);
                }
            }
        }

        let effective_negatives: Vec<&TransactionRecord> = records
            .iter()
            .filter(|r| r.is_negative() && !(self.config.exclude_pennies && r.is_penny()))
            .collect();

        let mut results = Vec::with_capacity(effective_negatives.len());
        for &negative in &effective_negatives {
            results.push(self.classify(batch_key, negative, &effective_negatives, &local_index));
        }
        results
    }

    /// Run the tiers for one negative
    fn classify(
        &self,
        batch_key: &str,
        negative: &TransactionRecord,
        effective_negatives: &[&TransactionRecord],
        local_index: &HashMap<&str, Vec<&TransactionRecord>>,
    ) -> MatchResult {
        // A penny negative kept in the effective set is still never a
        // match source: it resolves straight to Unmatched with no tier
        // attempted and no threshold flag.
        if negative.is_penny() {
            return build_result(batch_key, negative, MatchType::Unmatched, None, None);
        }

        if let Some(key) = negative.effective_correlation() {
            let target = negative.amount.abs();
            let local: &[&TransactionRecord] =
                local_index.get(key).map(Vec::as_slice).unwrap_or_default();

            if let Some(&positive) = local.iter().find(|p| amounts_match(&p.amount, &target)) {
                return build_result(
                    batch_key,
                    negative,
                    MatchType::IntraExact,
                    Some(positive),
                    Some(ReasonCode::IntraExactRefund),
                );
            }

            if let Some(positive) = self.aggregate_match(negative, key, effective_negatives, local)
            {
                return build_result(
                    batch_key,
                    negative,
                    MatchType::IntraAggregate,
                    Some(positive),
                    Some(ReasonCode::AggregateRefund),
                );
            }

            if let Some(positive) = self.cross_batch_match(negative, key) {
                return build_result(
                    batch_key,
                    negative,
                    MatchType::CrossBatch,
                    Some(positive),
                    Some(ReasonCode::CrossBatchRefund),
                );
            }
        }

        let over_threshold = negative.amount.abs() >= self.config.min_negative_threshold;
        build_result(
            batch_key,
            negative,
            MatchType::Unmatched,
            None,
            over_threshold.then_some(ReasonCode::UnmatchedOverThreshold),
        )
    }

    /// Subset-sum tier: can `abs(negative)` plus some subset of the other
    /// same-key negatives' absolute amounts reach a local positive's amount?
    ///
    /// The reachable-sum set is computed once per negative as a dynamic
    /// program over cent-rounded values. Among qualifying positives the
    /// smallest id wins, keeping the choice deterministic.
    fn aggregate_match<'r>(
        &self,
        negative: &TransactionRecord,
        correlation_key: &str,
        effective_negatives: &[&'r TransactionRecord],
        local_candidates: &[&'r TransactionRecord],
    ) -> Option<&'r TransactionRecord> {
        if local_candidates.is_empty() {
            return None;
        }

        let contributors: Vec<&TransactionRecord> = effective_negatives
            .iter()
            .filter(|peer| {
                peer.id != negative.id
                    && !peer.is_penny()
                    && peer.effective_correlation() == Some(correlation_key)
            })
            .copied()
            .collect();

        if contributors.is_empty() || contributors.len() > AGGREGATE_CANDIDATE_CAP {
            return None;
        }

        let base = to_cents(&negative.amount.abs())?;
        let mut reachable = BTreeSet::from([base]);
        for contributor in &contributors {
            let Some(cents) = to_cents(&contributor.amount.abs()) else {
                continue;
            };
            let additions: Vec<i64> = reachable
                .iter()
                .filter_map(|sum| sum.checked_add(cents))
                .collect();
            reachable.extend(additions);
        }

        local_candidates
            .iter()
            .filter(|positive| {
                to_cents(&positive.amount)
                    .map(|target| reachable.iter().any(|sum| cents_match(*sum, target)))
                    .unwrap_or(false)
            })
            .min_by(|a, b| a.id.cmp(&b.id))
            .copied()
    }

    /// Cross-batch tier: first prior-index candidate strictly earlier than
    /// the negative, within the lookback window, with a matching amount.
    /// The window boundary is inclusive: a gap of exactly `lookback_days`
    /// is eligible.
    fn cross_batch_match(
        &self,
        negative: &TransactionRecord,
        correlation_key: &str,
    ) -> Option<&TransactionRecord> {
        let negative_date = negative.date?;
        let candidates = self.prior_index.candidates(correlation_key)?;
        let target = negative.amount.abs();

        candidates.iter().find(|positive| {
            let Some(positive_date) = positive.date else {
                return false;
            };
            positive_date < negative_date
                && (negative_date - positive_date).num_days() <= self.config.lookback_days
                && amounts_match(&positive.amount, &target)
        })
    }
}

/// Assemble one result for a classified negative
fn build_result(
    batch_key: &str,
    negative: &TransactionRecord,
    match_type: MatchType,
    matched: Option<&TransactionRecord>,
    reason: Option<ReasonCode>,
) -> MatchResult {
    let mut reason_codes = BTreeSet::new();
    if let Some(code) = reason {
        reason_codes.insert(code);
    }

    MatchResult {
        batch_key: batch_key.to_string(),
        negative_record_id: negative.id.clone(),
        negative_amount: negative.amount.clone(),
        negative_correlation_id: negative.effective_correlation().map(String::from),
        negative_date: negative.date,
        match_type,
        matched_positive_id: matched.map(|p| p.id.clone()),
        matched_positive_amount: matched.map(|p| p.amount.clone()),
        matched_positive_correlation_id: matched
            .and_then(|p| p.effective_correlation().map(String::from)),
        matched_positive_date: matched.and_then(|p| p.date),
        reason_codes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn run_batch(
        config: &EngineConfig,
        all_records: &[TransactionRecord],
        batch_key: &str,
    ) -> Vec<MatchResult> {
        let prior_index = PriorIndex::build(all_records);
        let engine = MatchEngine::new(config, &prior_index);
        let batch: Vec<TransactionRecord> = all_records
            .iter()
            .filter(|r| r.batch_key == batch_key)
            .cloned()
            .collect();
        engine.match_batch(batch_key, &batch)
    }

    #[test]
    fn test_amount_tolerance() {
        assert!(amounts_match(&dec("100.00"), &dec("100.00")));
        assert!(amounts_match(&dec("100.00"), &dec("100.01")));
        assert!(amounts_match(&dec("100.00"), &dec("99.99")));
        // Relative tolerance carries large amounts past the cent
        assert!(amounts_match(&dec("50000.00"), &dec("50002.00")));
        assert!(!amounts_match(&dec("100.00"), &dec("100.50")));
        assert!(!amounts_match(&dec("100.00"), &dec("200.00")));
    }

    #[test]
    fn test_intra_exact_picks_first_candidate() {
        let records = vec![
            TransactionRecord::new("1", "B1", dec("500.00")).with_correlation("R100"),
            TransactionRecord::new("2", "B1", dec("500.00")).with_correlation("R100"),
            TransactionRecord::new("3", "B1", dec("-500.00")).with_correlation("R100"),
        ];

        let results = run_batch(&EngineConfig::default(), &records, "B1");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_type, MatchType::IntraExact);
        assert_eq!(results[0].matched_positive_id.as_deref(), Some("1"));
        assert!(results[0].reason_codes.contains(&ReasonCode::IntraExactRefund));
    }

    #[test]
    fn test_aggregate_match_splits_refund() {
        let records = vec![
            TransactionRecord::new("3", "B1", dec("300.00")).with_correlation("R200"),
            TransactionRecord::new("4", "B1", dec("-120.00")).with_correlation("R200"),
            TransactionRecord::new("5", "B1", dec("-180.00")).with_correlation("R200"),
        ];

        let results = run_batch(&EngineConfig::default(), &records, "B1");
        assert_eq!(results.len(), 2);
        for result in &results {
            assert_eq!(result.match_type, MatchType::IntraAggregate);
            assert_eq!(result.matched_positive_id.as_deref(), Some("3"));
            assert!(result.reason_codes.contains(&ReasonCode::AggregateRefund));
        }
    }

    #[test]
    fn test_aggregate_prefers_smallest_positive_id() {
        // Both positives carry the reachable amount 300.00
        let records = vec![
            TransactionRecord::new("9", "B1", dec("300.00")).with_correlation("R200"),
            TransactionRecord::new("2", "B1", dec("300.00")).with_correlation("R200"),
            TransactionRecord::new("4", "B1", dec("-120.00")).with_correlation("R200"),
            TransactionRecord::new("5", "B1", dec("-180.00")).with_correlation("R200"),
        ];

        let results = run_batch(&EngineConfig::default(), &records, "B1");
        // Exact tier does not apply (no positive equals 120 or 180)
        assert_eq!(results[0].match_type, MatchType::IntraAggregate);
        assert_eq!(results[0].matched_positive_id.as_deref(), Some("2"));
    }

    #[test]
    fn test_aggregate_tier_skipped_over_cap() {
        let mut records =
            vec![TransactionRecord::new("pos", "B1", dec("1000.00")).with_correlation("R1")];
        // 17 negatives of 10.00 each: 16 contributors for the first one,
        // which exceeds the cap, so no aggregate match may occur.
        for i in 0..17 {
            records.push(
                TransactionRecord::new(format!("n{i}"), "B1", dec("-10.00"))
                    .with_correlation("R1"),
            );
        }

        let results = run_batch(&EngineConfig::default(), &records, "B1");
        assert_eq!(results.len(), 17);
        assert!(results
            .iter()
            .all(|r| r.match_type == MatchType::Unmatched));
    }

    #[test]
    fn test_cross_batch_within_window() {
        let records = vec![
            TransactionRecord::new("7", "B2", dec("75.00"))
                .with_correlation("R300")
                .with_date(date(2024, 1, 25)),
            TransactionRecord::new("6", "B1", dec("-75.00"))
                .with_correlation("R300")
                .with_date(date(2024, 2, 10)),
        ];

        let results = run_batch(&EngineConfig::default(), &records, "B1");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_type, MatchType::CrossBatch);
        assert_eq!(results[0].matched_positive_id.as_deref(), Some("7"));
        assert!(results[0].reason_codes.contains(&ReasonCode::CrossBatchRefund));
    }

    #[test]
    fn test_lookback_boundary_inclusive() {
        let config = EngineConfig {
            lookback_days: 30,
            ..EngineConfig::default()
        };

        // Exactly 30 days earlier: eligible
        let inside = vec![
            TransactionRecord::new("1", "B2", dec("75.00"))
                .with_correlation("R1")
                .with_date(date(2024, 1, 11)),
            TransactionRecord::new("2", "B1", dec("-75.00"))
                .with_correlation("R1")
                .with_date(date(2024, 2, 10)),
        ];
        let results = run_batch(&config, &inside, "B1");
        assert_eq!(results[0].match_type, MatchType::CrossBatch);

        // 31 days earlier: outside the window
        let outside = vec![
            TransactionRecord::new("1", "B2", dec("75.00"))
                .with_correlation("R1")
                .with_date(date(2024, 1, 10)),
            TransactionRecord::new("2", "B1", dec("-75.00"))
                .with_correlation("R1")
                .with_date(date(2024, 2, 10)),
        ];
        let results = run_batch(&config, &outside, "B1");
        assert_eq!(results[0].match_type, MatchType::Unmatched);
    }

    #[test]
    fn test_intra_exact_beats_cross_batch() {
        let records = vec![
            TransactionRecord::new("earlier", "B2", dec("75.00"))
                .with_correlation("R1")
                .with_date(date(2024, 2, 1)),
            TransactionRecord::new("local", "B1", dec("75.00"))
                .with_correlation("R1")
                .with_date(date(2024, 2, 9)),
            TransactionRecord::new("neg", "B1", dec("-75.00"))
                .with_correlation("R1")
                .with_date(date(2024, 2, 10)),
        ];

        let results = run_batch(&EngineConfig::default(), &records, "B1");
        assert_eq!(results[0].match_type, MatchType::IntraExact);
        assert_eq!(results[0].matched_positive_id.as_deref(), Some("local"));
    }

    #[test]
    fn test_no_correlation_resolves_unmatched() {
        let records = vec![
            TransactionRecord::new("1", "B1", dec("50.00")).with_correlation("R1"),
            TransactionRecord::new("2", "B1", dec("-50.00")),
        ];

        let results = run_batch(&EngineConfig::default(), &records, "B1");
        assert_eq!(results[0].match_type, MatchType::Unmatched);
        assert!(results[0]
            .reason_codes
            .contains(&ReasonCode::UnmatchedOverThreshold));
    }

    #[test]
    fn test_unmatched_below_threshold_carries_no_flag() {
        let records = vec![TransactionRecord::new("1", "B1", dec("-4.99"))];
        let results = run_batch(&EngineConfig::default(), &records, "B1");
        assert_eq!(results[0].match_type, MatchType::Unmatched);
        assert!(results[0].reason_codes.is_empty());
    }

    #[test]
    fn test_penny_negative_excluded_when_configured() {
        let config = EngineConfig {
            exclude_pennies: true,
            ..EngineConfig::default()
        };
        let records = vec![
            TransactionRecord::new("1", "B1", dec("-0.01")).with_correlation("R1"),
            TransactionRecord::new("2", "B1", dec("-20.00")).with_correlation("R1"),
        ];

        let results = run_batch(&config, &records, "B1");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].negative_record_id, "2");
    }

    #[test]
    fn test_penny_negative_never_matches_when_kept() {
        // Penny kept in the effective set, but no tier is attempted for it
        let records = vec![
            TransactionRecord::new("1", "B1", dec("0.01")).with_correlation("R1"),
            TransactionRecord::new("2", "B1", dec("-0.01")).with_correlation("R1"),
        ];

        let results = run_batch(&EngineConfig::default(), &records, "B1");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_type, MatchType::Unmatched);
        assert!(results[0].reason_codes.is_empty());
    }

    #[test]
    fn test_positive_not_consumed_by_earlier_match() {
        // Two negatives both exactly match the single positive; the source
        // behavior never marks positives as consumed, so both cite it.
        let records = vec![
            TransactionRecord::new("1", "B1", dec("100.00")).with_correlation("R1"),
            TransactionRecord::new("2", "B1", dec("-100.00")).with_correlation("R1"),
            TransactionRecord::new("3", "B1", dec("-100.00")).with_correlation("R1"),
        ];

        let results = run_batch(&EngineConfig::default(), &records, "B1");
        assert_eq!(results.len(), 2);
        for result in &results {
            assert_eq!(result.match_type, MatchType::IntraExact);
            assert_eq!(result.matched_positive_id.as_deref(), Some("1"));
        }
    }
}
