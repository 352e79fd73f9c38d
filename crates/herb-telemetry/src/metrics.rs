//! Prometheus metrics for the ledger client.
//!
//! All metrics follow the naming convention: `herb_ledger_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: submissions and queries by operation and outcome
//! - **Histogram**: time from submission to a mined receipt

use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Registry holding every ledger metric
    pub static ref REGISTRY: Registry = Registry::new();

    /// Contract writes by operation and outcome
    pub static ref SUBMISSIONS: CounterVec = CounterVec::new(
        Opts::new("herb_ledger_submissions_total", "Transactions submitted to the contract"),
        &["operation", "outcome"]  // outcome: success/reverted/unauthorized/unavailable/invalid
    ).expect("static metric definition");

    /// Contract reads by operation and outcome
    pub static ref QUERIES: CounterVec = CounterVec::new(
        Opts::new("herb_ledger_queries_total", "Read-only calls against the contract"),
        &["operation", "outcome"]  // outcome: success/not_found/unavailable/decode
    ).expect("static metric definition");

    /// Time between submission and a mined receipt
    pub static ref RECEIPT_WAIT: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "herb_ledger_receipt_wait_seconds",
            "Time spent waiting for a transaction receipt"
        ).buckets(exponential_buckets(0.05, 2.0, 12).expect("valid bucket layout"))
    ).expect("static metric definition");

    /// Receipt polls issued
    pub static ref RECEIPT_POLLS: Counter = Counter::new(
        "herb_ledger_receipt_polls_total",
        "eth_getTransactionReceipt calls issued while waiting for receipts"
    ).expect("static metric definition");
}

/// Add the ledger metrics to [`REGISTRY`].
///
/// Metrics that are already present are left alone, so repeated calls succeed.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let collectors: [Box<dyn Collector>; 4] = [
        Box::new(SUBMISSIONS.clone()),
        Box::new(QUERIES.clone()),
        Box::new(RECEIPT_WAIT.clone()),
        Box::new(RECEIPT_POLLS.clone()),
    ];
    collectors
        .into_iter()
        .try_for_each(|collector| match REGISTRY.register(collector) {
            Err(prometheus::Error::AlreadyReg) => Ok(()),
            other => other.map_err(|e| TelemetryError::Metrics(e.to_string())),
        })
}

/// Render [`REGISTRY`] as Prometheus exposition text.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    TextEncoder::new()
        .encode_to_string(&REGISTRY.gather())
        .map_err(|e| TelemetryError::Metrics(e.to_string()))
}

/// Start a receipt-wait style timer on a histogram; the sample is recorded
/// when the returned guard drops.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $histogram.start_timer()
    };
}
