//! Engine configuration

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::{ReconError, ReconResult};

/// Configuration for a reconciliation run.
///
/// All options have working defaults; construct with
/// `EngineConfig::default()` and override the fields that matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum allowed gap, in days, between a cross-batch positive and the
    /// matching negative. The boundary is inclusive: a gap of exactly
    /// `lookback_days` is eligible.
    pub lookback_days: i64,
    /// Minimum `abs(amount)` for an unmatched negative to be flagged with
    /// reason code R6
    pub min_negative_threshold: BigDecimal,
    /// Whether penny-sized negatives (`abs(amount) <= 0.01`) are excluded
    /// from matching entirely. They remain counted in `penny_count` either
    /// way.
    pub exclude_pennies: bool,
    /// Caps the number of distinct batch keys processed, in first-seen
    /// order. Intended for bounded test/preview runs.
    pub limit_batches: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            min_negative_threshold: BigDecimal::from(5),
            exclude_pennies: false,
            limit_batches: None,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration before a run
    pub fn validate(&self) -> ReconResult<()> {
        if self.lookback_days < 0 {
            return Err(ReconError::InvalidConfig(format!(
                "lookback_days must be non-negative, got {}",
                self.lookback_days
            )));
        }

        if self.min_negative_threshold < BigDecimal::from(0) {
            return Err(ReconError::InvalidConfig(format!(
                "min_negative_threshold must be non-negative, got {}",
                self.min_negative_threshold
            )));
        }

        if self.limit_batches == Some(0) {
            return Err(ReconError::InvalidConfig(
                "limit_batches must be at least 1 when set".to_string(),
            ));
        }

        Ok(())
    }
}
