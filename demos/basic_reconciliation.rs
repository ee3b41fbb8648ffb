//! Basic reconciliation example
//!
//! Run with: cargo run --example basic_reconciliation

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use reconcile_core::{EngineConfig, ReconciliationEngine, TransactionRecord};
use std::str::FromStr;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).expect("valid decimal literal")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn main() {
    let records = vec![
        // Batch B1: a charge and its exact same-batch refund
        TransactionRecord::new("1", "B1", dec("500.00"))
            .with_correlation("R100")
            .with_date(date(2024, 1, 1))
            .with_method("card"),
        TransactionRecord::new("2", "B1", dec("-500.00"))
            .with_correlation("R100")
            .with_date(date(2024, 1, 3))
            .with_method("card"),
        // Batch B1: a charge refunded in two parts
        TransactionRecord::new("3", "B1", dec("300.00"))
            .with_correlation("R200")
            .with_date(date(2024, 1, 5)),
        TransactionRecord::new("4", "B1", dec("-120.00"))
            .with_correlation("R200")
            .with_date(date(2024, 1, 8)),
        TransactionRecord::new("5", "B1", dec("-180.00"))
            .with_correlation("R200")
            .with_date(date(2024, 1, 8)),
        // Batch B2: a reversal whose original charge settled in batch B3
        TransactionRecord::new("6", "B2", dec("-75.00"))
            .with_correlation("R300")
            .with_date(date(2024, 2, 10)),
        TransactionRecord::new("7", "B3", dec("75.00"))
            .with_correlation("R300")
            .with_date(date(2024, 1, 25)),
        // Batch B2: an unmatched reversal over the audit threshold
        TransactionRecord::new("8", "B2", dec("-42.50"))
            .with_correlation("R400")
            .with_date(date(2024, 2, 11)),
    ];

    let engine = ReconciliationEngine::new(EngineConfig::default())
        .expect("default configuration is valid");
    let report = engine.reconcile(&records).expect("records to reconcile");

    println!("=== Match Results ===");
    for result in &report.match_results {
        let matched = result
            .matched_positive_id
            .as_deref()
            .unwrap_or("-");
        println!(
            "batch {} negative {} ({}) -> {:?}, positive {}",
            result.batch_key, result.negative_record_id, result.negative_amount,
            result.match_type, matched
        );
    }

    println!("\n=== Batch Metrics ===");
    for metrics in &report.batch_metrics {
        let codes: Vec<String> = metrics.reason_codes.iter().map(|c| c.to_string()).collect();
        println!(
            "batch {}: {} records, {} negatives, net {}, suspicious={} [{}]",
            metrics.batch_key,
            metrics.total_records,
            metrics.negative_count,
            metrics.net_amount,
            metrics.suspicious,
            codes.join(", ")
        );
    }

    println!(
        "\nscreened out: {} record(s)",
        report.screening.total_skipped()
    );
}
