//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Account lookups
//! - Transaction submissions and rejections per operation kind
//! - Asset issuance progress

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec, Encoder, TextEncoder};

lazy_static! {
    pub static ref ACCOUNT_LOOKUPS: CounterVec = register_counter_vec!(
        "diam_account_lookups_total",
        "Account lookups by outcome",
        &["outcome"]
    ).expect("metric registration");

    pub static ref TX_SUBMITTED: CounterVec = register_counter_vec!(
        "diam_transactions_submitted_total",
        "Transactions accepted by the network",
        &["operation"]
    ).expect("metric registration");

    pub static ref TX_REJECTED: CounterVec = register_counter_vec!(
        "diam_transactions_rejected_total",
        "Transactions rejected by the network",
        &["operation"]
    ).expect("metric registration");

    pub static ref ISSUANCE_STEPS: CounterVec = register_counter_vec!(
        "diam_issuance_steps_total",
        "Asset issuance steps by outcome",
        &["step", "outcome"]
    ).expect("metric registration");
}

/// Current metrics in the Prometheus text format
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

// Helper functions to record metrics

pub fn record_account_lookup(success: bool) {
    ACCOUNT_LOOKUPS
        .with_label_values(&[if success { "ok" } else { "error" }])
        .inc();
}

pub fn record_tx_submitted(operation: &str) {
    TX_SUBMITTED.with_label_values(&[operation]).inc();
}

pub fn record_tx_rejected(operation: &str) {
    TX_REJECTED.with_label_values(&[operation]).inc();
}

pub fn record_issuance_step(step: &str, success: bool) {
    ISSUANCE_STEPS
        .with_label_values(&[step, if success { "ok" } else { "error" }])
        .inc();
}
