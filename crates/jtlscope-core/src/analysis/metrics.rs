use serde::{Deserialize, Serialize};

use super::percentile::ElapsedStats;
use super::{mean_of, round2};
use crate::ingest::Record;

// ---------------------------------------------------------------------------
// PerformanceMetrics
// ---------------------------------------------------------------------------

/// Whole-run summary of a record collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PerformanceMetrics {
    pub avg_response_time: f64,
    pub min_response_time: i64,
    pub max_response_time: i64,
    pub p50: i64,
    pub p90: i64,
    pub p95: i64,
    pub p99: i64,
    /// Requests per second over the observed time span.
    pub throughput: f64,
    /// Failed share of all requests, in percent.
    pub error_rate: f64,
    pub total_requests: u64,
    pub success_requests: u64,
    pub failed_requests: u64,
    /// Mean of the `latency` column, reported as connect time.
    pub avg_connect_time: f64,
    pub test_duration_secs: f64,
    pub total_bytes_received: i64,
    pub total_bytes_sent: i64,
}

// ---------------------------------------------------------------------------
// MetricsOutcome
// ---------------------------------------------------------------------------

/// Result of [`calculate_metrics`]. The two degenerate cases are kept apart
/// because displays key off `error_rate` and `total_requests` separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricsOutcome {
    /// No records at all.
    Empty,
    /// Records exist but none carries a usable elapsed time.
    NoValidElapsed { total_requests: u64 },
    Computed(PerformanceMetrics),
}

impl MetricsOutcome {
    /// Flatten into a plain snapshot.
    ///
    /// `Empty` becomes all zeros. `NoValidElapsed` becomes all zeros with a
    /// 100% error rate and the full record count.
    pub fn to_metrics(&self) -> PerformanceMetrics {
        match self {
            MetricsOutcome::Empty => PerformanceMetrics::default(),
            MetricsOutcome::NoValidElapsed { total_requests } => PerformanceMetrics {
                error_rate: 100.0,
                total_requests: *total_requests,
                ..PerformanceMetrics::default()
            },
            MetricsOutcome::Computed(metrics) => metrics.clone(),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, MetricsOutcome::Computed(_))
    }
}

// ---------------------------------------------------------------------------
// calculate_metrics
// ---------------------------------------------------------------------------

/// Compute the run summary over all records.
pub fn calculate_metrics(records: &[Record]) -> MetricsOutcome {
    if records.is_empty() {
        return MetricsOutcome::Empty;
    }
    let total = records.len() as u64;

    let mut elapsed: Vec<i64> = records
        .iter()
        .map(|r| r.elapsed)
        .filter(|&ms| ms >= 0)
        .collect();
    let Some(stats) = ElapsedStats::from_values(&mut elapsed) else {
        tracing::debug!(records = records.len(), "no usable elapsed values");
        return MetricsOutcome::NoValidElapsed {
            total_requests: total,
        };
    };

    let success = records.iter().filter(|r| r.success).count() as u64;
    let failed = total - success;
    let duration_secs = test_duration_secs(records);

    MetricsOutcome::Computed(PerformanceMetrics {
        avg_response_time: round2(stats.mean),
        min_response_time: stats.min,
        max_response_time: stats.max,
        p50: stats.p50,
        p90: stats.p90,
        p95: stats.p95,
        p99: stats.p99,
        throughput: round2(total as f64 / duration_secs),
        error_rate: round2(failed as f64 / total as f64 * 100.0),
        total_requests: total,
        success_requests: success,
        failed_requests: failed,
        avg_connect_time: round2(mean_of(records.iter().filter_map(|r| r.latency))),
        test_duration_secs: round2(duration_secs),
        total_bytes_received: records
            .iter()
            .filter_map(|r| r.bytes)
            .fold(0i64, i64::saturating_add),
        total_bytes_sent: records
            .iter()
            .filter_map(|r| r.sent_bytes)
            .fold(0i64, i64::saturating_add),
    })
}

/// Span between the earliest and latest positive timestamps, in seconds.
///
/// Falls back to one second when fewer than two timestamps qualify or the
/// span is empty, so throughput stays finite.
pub fn test_duration_secs(records: &[Record]) -> f64 {
    let mut valid = records.iter().map(|r| r.timestamp).filter(|&ts| ts > 0);
    let Some(first) = valid.next() else {
        return 1.0;
    };
    let (mut min, mut max, mut count) = (first, first, 1usize);
    for ts in valid {
        min = min.min(ts);
        max = max.max(ts);
        count += 1;
    }

    let span_ms = max - min;
    if count < 2 || span_ms <= 0 {
        return 1.0;
    }
    span_ms as f64 / 1000.0
}
