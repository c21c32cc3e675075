use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::percentile::percentile;
use super::round2;
use crate::ingest::Record;

/// Per-label rollup row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransactionSummary {
    pub label: String,
    pub count: u64,
    /// Running mean, rounded to two decimals.
    pub avg_response_time: f64,
    pub min_response_time: i64,
    pub max_response_time: i64,
    pub p90: i64,
    pub error_count: u64,
    /// Failed share in percent, not rounded.
    pub error_rate: f64,
}

/// Running state for one label.
struct Rollup {
    label: String,
    count: u64,
    avg: f64,
    errors: u64,
    elapsed: Vec<i64>,
}

impl Rollup {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            count: 0,
            avg: 0.0,
            errors: 0,
            elapsed: Vec::new(),
        }
    }

    fn push(&mut self, record: &Record) {
        self.count += 1;
        let n = self.count as f64;
        self.avg = (self.avg * (n - 1.0) + record.elapsed as f64) / n;
        if !record.success {
            self.errors += 1;
        }
        self.elapsed.push(record.elapsed);
    }

    fn finish(mut self) -> TransactionSummary {
        self.elapsed.sort_unstable();
        TransactionSummary {
            avg_response_time: round2(self.avg),
            min_response_time: self.elapsed.first().copied().unwrap_or(0),
            max_response_time: self.elapsed.last().copied().unwrap_or(0),
            p90: percentile(&self.elapsed, 90.0).unwrap_or(0),
            error_rate: if self.count > 0 {
                self.errors as f64 / self.count as f64 * 100.0
            } else {
                0.0
            },
            label: self.label,
            count: self.count,
            error_count: self.errors,
        }
    }
}

/// Group records by label, in order of first appearance.
pub fn summarize_transactions(records: &[Record]) -> Vec<TransactionSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rollups: Vec<Rollup> = Vec::new();

    for record in records {
        let slot = *index.entry(record.label.as_str()).or_insert_with(|| {
            rollups.push(Rollup::new(&record.label));
            rollups.len() - 1
        });
        rollups[slot].push(record);
    }

    rollups.into_iter().map(Rollup::finish).collect()
}
