use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::percentile::ElapsedStats;
use super::{mean_of, round2};
use crate::config::BucketWidth;
use crate::ingest::Record;

/// Window count that is always gap-filled, whatever the record count.
pub const MIN_FILL_LIMIT: i64 = 100_000;

/// Extra filled windows allowed per valid record above [`MIN_FILL_LIMIT`].
pub const FILL_WINDOWS_PER_RECORD: i64 = 64;

// ---------------------------------------------------------------------------
// ChartBucket — one time window of the chart series
// ---------------------------------------------------------------------------

/// Aggregated statistics for one fixed-width time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChartBucket {
    /// Window start, epoch milliseconds.
    pub timestamp: i64,
    /// Window start rendered as RFC 3339 UTC. Sorts like `timestamp` for
    /// years 0001 through 9999.
    pub label: String,
    pub count: u64,
    pub avg_response_time: f64,
    pub min_response_time: i64,
    pub max_response_time: i64,
    pub p90: i64,
    pub p95: i64,
    pub p99: i64,
    pub error_count: u64,
    /// Successful share of the window, in percent.
    pub success_rate: f64,
    pub avg_latency: f64,
    /// Received bytes per second over the window, in KB/s.
    pub bandwidth_kbps: f64,
    /// Requests per second over the window.
    pub throughput: f64,
    /// Highest `all_threads` value seen in the window.
    pub max_active_threads: i64,
}

impl ChartBucket {
    fn empty(timestamp: i64) -> Self {
        Self {
            timestamp,
            label: render_label(timestamp),
            count: 0,
            avg_response_time: 0.0,
            min_response_time: 0,
            max_response_time: 0,
            p90: 0,
            p95: 0,
            p99: 0,
            error_count: 0,
            success_rate: 0.0,
            avg_latency: 0.0,
            bandwidth_kbps: 0.0,
            throughput: 0.0,
            max_active_threads: 0,
        }
    }

    fn from_records(timestamp: i64, records: &[&Record], width: BucketWidth) -> Self {
        let mut elapsed: Vec<i64> = records.iter().map(|r| r.elapsed).collect();
        let Some(stats) = ElapsedStats::from_values(&mut elapsed) else {
            return Self::empty(timestamp);
        };

        let count = records.len() as u64;
        let successes = records.iter().filter(|r| r.success).count() as u64;
        let width_secs = f64::from(width.secs());
        let bytes = records
            .iter()
            .filter_map(|r| r.bytes)
            .fold(0i64, i64::saturating_add);

        Self {
            timestamp,
            label: render_label(timestamp),
            count,
            avg_response_time: round2(stats.mean),
            min_response_time: stats.min,
            max_response_time: stats.max,
            p90: stats.p90,
            p95: stats.p95,
            p99: stats.p99,
            error_count: count - successes,
            success_rate: round2(successes as f64 / count as f64 * 100.0),
            avg_latency: round2(mean_of(records.iter().filter_map(|r| r.latency))),
            bandwidth_kbps: round2(bytes as f64 / width_secs / 1024.0),
            throughput: round2(count as f64 / width_secs),
            max_active_threads: records
                .iter()
                .filter_map(|r| r.all_threads)
                .max()
                .unwrap_or(0),
        }
    }
}

fn render_label(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| timestamp.to_string())
}

// ---------------------------------------------------------------------------
// build_chart_buckets
// ---------------------------------------------------------------------------

/// Partition records into fixed-width windows anchored at the earliest
/// positive timestamp.
///
/// Records with a non-positive timestamp are left out. When every valid
/// record shares one timestamp a single bucket is produced. Empty windows
/// between populated ones are emitted as zeroed buckets so the series is
/// contiguous and `len() * width` covers the whole span.
///
/// Buckets come out in window order (ascending `timestamp`). For dates the
/// RFC 3339 label can render (years up to 9999) this is also label order.
///
/// Gap filling is skipped only for pathological spans, needing more windows
/// than `max(MIN_FILL_LIMIT, valid records * FILL_WINDOWS_PER_RECORD)`. That
/// happens when synthetic wall-clock timestamps are mixed with near-epoch
/// values; the result then holds only the populated windows.
pub fn build_chart_buckets(records: &[Record], width: BucketWidth) -> Vec<ChartBucket> {
    let valid: Vec<&Record> = records.iter().filter(|r| r.timestamp > 0).collect();
    let (Some(min_ts), Some(max_ts)) = (
        valid.iter().map(|r| r.timestamp).min(),
        valid.iter().map(|r| r.timestamp).max(),
    ) else {
        return Vec::new();
    };

    if max_ts - min_ts <= 0 {
        return vec![ChartBucket::from_records(min_ts, &valid, width)];
    }

    let record_count = valid.len();
    let width_ms = width.millis();
    let mut windows: BTreeMap<i64, Vec<&Record>> = BTreeMap::new();
    for record in valid {
        let index = (record.timestamp - min_ts) / width_ms;
        windows.entry(index).or_default().push(record);
    }

    let last_index = (max_ts - min_ts) / width_ms;
    if last_index >= fill_limit(record_count) {
        tracing::warn!(
            windows = last_index + 1,
            records = record_count,
            "time span too wide to fill gaps, emitting populated windows only"
        );
        return windows
            .iter()
            .map(|(index, members)| {
                ChartBucket::from_records(min_ts + index * width_ms, members, width)
            })
            .collect();
    }

    (0..=last_index)
        .map(|index| {
            let start = min_ts + index * width_ms;
            match windows.get(&index) {
                Some(members) => ChartBucket::from_records(start, members, width),
                None => ChartBucket::empty(start),
            }
        })
        .collect()
}

fn fill_limit(record_count: usize) -> i64 {
    let per_record = i64::try_from(record_count)
        .unwrap_or(i64::MAX)
        .saturating_mul(FILL_WINDOWS_PER_RECORD);
    per_record.max(MIN_FILL_LIMIT)
}
