pub mod buckets;
pub mod errors;
pub mod metrics;
pub mod percentile;
pub mod transactions;

pub use buckets::{build_chart_buckets, ChartBucket};
pub use errors::{analyze_errors, top_errors, ErrorCategory, ErrorGroup};
pub use metrics::{calculate_metrics, MetricsOutcome, PerformanceMetrics};
pub use percentile::{percentile, ElapsedStats};
pub use transactions::{summarize_transactions, TransactionSummary};

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of the values, 0 when there are none.
pub(crate) fn mean_of(values: impl Iterator<Item = i64>) -> f64 {
    let (sum, count) = values.fold((0i128, 0u64), |(sum, count), v| {
        (sum + i128::from(v), count + 1)
    });
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::ingest::Record;

    /// Build a record with the fields most views look at.
    pub fn record(timestamp: i64, elapsed: i64, label: &str, code: &str, success: bool) -> Record {
        Record {
            timestamp,
            elapsed,
            label: label.to_string(),
            response_code: code.to_string(),
            success,
            thread_name: "Thread-1".to_string(),
            failure_message: None,
            response_message: None,
            bytes: None,
            sent_bytes: None,
            latency: None,
            connect: None,
            all_threads: None,
            url: None,
        }
    }
}
