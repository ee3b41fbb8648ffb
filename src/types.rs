//! Core types and data structures for the reconciliation engine

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One financial ledger line fed into the engine.
///
/// Records are immutable once constructed; the engine never mutates its
/// input. Positive amounts are inflows, negative amounts are
/// refund/reversal candidates. A zero amount is invalid and is screened
/// out before matching (see [`crate::utils::screen_records`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique identifier within the full input set
    pub id: String,
    /// Shared grouping key (e.g. a payment-processor batch token); non-empty
    pub batch_key: String,
    /// Primary relation key (e.g. a reservation/order number)
    pub correlation_id: Option<String>,
    /// Alternate relation key (e.g. an account number), used only when the
    /// primary key is absent
    pub secondary_correlation_id: Option<String>,
    /// Signed amount; positive = inflow, negative = reversal/refund candidate
    pub amount: BigDecimal,
    /// Posting date; required only for cross-batch matching and chronology
    pub date: Option<NaiveDate>,
    /// Free-text payment channel (informational only)
    pub method: Option<String>,
}

impl TransactionRecord {
    /// Create a new record with the mandatory fields
    pub fn new(id: impl Into<String>, batch_key: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            id: id.into(),
            batch_key: batch_key.into(),
            correlation_id: None,
            secondary_correlation_id: None,
            amount,
            date: None,
            method: None,
        }
    }

    /// Set the primary correlation id
    pub fn with_correlation(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Set the secondary correlation id
    pub fn with_secondary_correlation(mut self, secondary: impl Into<String>) -> Self {
        self.secondary_correlation_id = Some(secondary.into());
        self
    }

    /// Set the posting date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the payment channel
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// The correlation key used for all index lookups: the primary
    /// correlation id when present, otherwise the secondary one.
    pub fn effective_correlation(&self) -> Option<&str> {
        self.correlation_id
            .as_deref()
            .or(self.secondary_correlation_id.as_deref())
    }

    /// Whether this record is a penny (`abs(amount) <= 0.01`).
    ///
    /// Pennies are never eligible to be a match target or source; they are
    /// only counted in [`BatchMetrics::penny_count`].
    pub fn is_penny(&self) -> bool {
        self.amount.abs() <= penny_limit()
    }

    /// Whether the amount is strictly positive (an inflow)
    pub fn is_positive(&self) -> bool {
        self.amount > BigDecimal::from(0)
    }

    /// Whether the amount is strictly negative (a reversal candidate)
    pub fn is_negative(&self) -> bool {
        self.amount < BigDecimal::from(0)
    }
}

/// Upper bound for a penny record: $0.01
pub(crate) fn penny_limit() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}

/// How a negative record was resolved against the positive candidates.
///
/// This is a closed set: a result is produced exactly once per qualifying
/// negative and carries exactly one of these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchType {
    /// Exact amount match against a positive in the same batch
    IntraExact,
    /// Several same-batch negatives jointly sum to a positive's amount
    IntraAggregate,
    /// Amount match against an earlier positive in another batch, within
    /// the configured lookback window
    CrossBatch,
    /// No tier produced a match
    Unmatched,
}

/// Audit reason codes attached to batches and match results.
///
/// The registry is fixed and exhaustive; codes order as R1 through R7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReasonCode {
    /// R1 - intra-batch exact refund match
    IntraExactRefund,
    /// R2 - cross-batch refund match within the lookback window
    CrossBatchRefund,
    /// R3 - net amount approximately zero with mixed signs
    NetZeroMixedSign,
    /// R4 - high negative-entry ratio in the batch
    HighNegativeRatio,
    /// R5 - multiple negatives aggregate-match a positive
    AggregateRefund,
    /// R6 - unmatched negative at or above the configured threshold
    UnmatchedOverThreshold,
    /// R7 - repeated correlation id within the batch
    RepeatedCorrelation,
}

impl ReasonCode {
    /// The short tag used in audit reports ("R1" .. "R7")
    pub fn code(&self) -> &'static str {
        match self {
            ReasonCode::IntraExactRefund => "R1",
            ReasonCode::CrossBatchRefund => "R2",
            ReasonCode::NetZeroMixedSign => "R3",
            ReasonCode::HighNegativeRatio => "R4",
            ReasonCode::AggregateRefund => "R5",
            ReasonCode::UnmatchedOverThreshold => "R6",
            ReasonCode::RepeatedCorrelation => "R7",
        }
    }

    /// Human-readable explanation of the code
    pub fn description(&self) -> &'static str {
        match self {
            ReasonCode::IntraExactRefund => "intra-batch exact refund match",
            ReasonCode::CrossBatchRefund => "cross-batch refund match within lookback window",
            ReasonCode::NetZeroMixedSign => "net amount approximately zero with mixed signs",
            ReasonCode::HighNegativeRatio => "high negative-entry ratio in batch",
            ReasonCode::AggregateRefund => "multiple negatives aggregate-match a positive",
            ReasonCode::UnmatchedOverThreshold => "unmatched negative at/above threshold",
            ReasonCode::RepeatedCorrelation => "repeated correlation id within batch",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The classification of exactly one negative record.
///
/// One result is emitted per effective negative, in the negative's original
/// batch order. A positive record is never marked as consumed, so the same
/// positive may legitimately appear as the matched side of several results;
/// audit consumers must not assume matched positives are distinct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Batch the negative belongs to
    pub batch_key: String,
    /// Id of the classified negative record
    pub negative_record_id: String,
    /// Signed amount of the negative record
    pub negative_amount: BigDecimal,
    /// Effective correlation key of the negative, if any
    pub negative_correlation_id: Option<String>,
    /// Posting date of the negative, if any
    pub negative_date: Option<NaiveDate>,
    /// How the negative was resolved
    pub match_type: MatchType,
    /// Id of the matched positive (absent when unmatched)
    pub matched_positive_id: Option<String>,
    /// Amount of the matched positive (absent when unmatched)
    pub matched_positive_amount: Option<BigDecimal>,
    /// Effective correlation key of the matched positive
    pub matched_positive_correlation_id: Option<String>,
    /// Posting date of the matched positive
    pub matched_positive_date: Option<NaiveDate>,
    /// Codes triggered while resolving this negative
    pub reason_codes: BTreeSet<ReasonCode>,
}

impl MatchResult {
    /// Whether any tier produced a match
    pub fn is_matched(&self) -> bool {
        self.match_type != MatchType::Unmatched
    }
}

/// Per-batch summary computed once per batch key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMetrics {
    /// The batch grouping key
    pub batch_key: String,
    /// All records in the batch (after upstream screening)
    pub total_records: usize,
    /// Effective negatives (penny negatives excluded when configured)
    pub negative_count: usize,
    /// Records with `abs(amount) <= 0.01`, of either sign
    pub penny_count: usize,
    /// Distinct effective correlation keys present in the batch
    pub distinct_correlation_count: usize,
    /// Occurrences of an effective correlation key beyond its first
    pub repeat_correlation_count: usize,
    /// Distinct secondary correlation ids present in the batch
    pub distinct_secondary_group_count: usize,
    /// Sum of all positive amounts
    pub total_positive: BigDecimal,
    /// Sum of all negative amounts (a non-positive value)
    pub total_negative: BigDecimal,
    /// Sum of all signed amounts
    pub net_amount: BigDecimal,
    /// `negative_count / total_records`
    pub negative_ratio: f64,
    /// Days between the earliest and latest dated record (0 if fewer than
    /// two records carry dates)
    pub span_days: i64,
    /// Union of every code triggered for this batch
    pub reason_codes: BTreeSet<ReasonCode>,
    /// True iff any reason code was triggered
    pub suspicious: bool,
}

/// Errors that can occur in the reconciliation engine
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("no transaction records to reconcile")]
    EmptyInput,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("record source error: {0}")]
    Source(String),
    #[error("report sink error: {0}")]
    Sink(String),
}

/// Result type for engine operations
pub type ReconResult<T> = Result<T, ReconError>;
