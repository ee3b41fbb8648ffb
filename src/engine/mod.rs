//! Reconciliation engine: configuration, grouping, indexing, matching,
//! metrics, and the run orchestrator

pub mod config;
pub mod core;
pub mod grouper;
pub mod matcher;
pub mod metrics;
pub mod prior_index;

pub use self::config::*;
pub use self::core::*;
pub use self::grouper::*;
pub use self::matcher::*;
pub use self::metrics::*;
pub use self::prior_index::*;
