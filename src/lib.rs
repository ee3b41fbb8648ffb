//! # Reconcile Core
//!
//! A reconciliation engine that classifies refund/reversal entries in
//! transaction batches and flags suspicious batches for human audit.
//!
//! ## Features
//!
//! - **Tiered matching**: intra-batch exact, intra-batch aggregate
//!   (bounded subset-sum), and cross-batch windowed matching, in that
//!   order, with explicit tie-break rules
//! - **Global prior index**: a read-only cross-batch index built once from
//!   the full dataset before any batch is processed
//! - **Batch risk metrics**: negative ratios, net balances, and repeated
//!   correlation detection with explainable reason codes (R1-R7)
//! - **Deterministic output**: identical input and configuration always
//!   produce identical result collections, in a stable order
//! - **Collaborator seams**: trait-based record sources and report sinks;
//!   the engine itself performs no I/O
//!
//! ## Quick Start
//!
//! ```rust
//! use reconcile_core::{EngineConfig, ReconciliationEngine, TransactionRecord};
//! use bigdecimal::BigDecimal;
//! use std::str::FromStr;
//!
//! let records = vec![
//!     TransactionRecord::new("1", "B1", BigDecimal::from_str("500.00").unwrap())
//!         .with_correlation("R100"),
//!     TransactionRecord::new("2", "B1", BigDecimal::from_str("-500.00").unwrap())
//!         .with_correlation("R100"),
//! ];
//!
//! let engine = ReconciliationEngine::with_defaults();
//! let report = engine.reconcile(&records).unwrap();
//! assert_eq!(report.match_results.len(), 1);
//! ```

pub mod engine;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use engine::*;
pub use traits::*;
pub use types::*;
