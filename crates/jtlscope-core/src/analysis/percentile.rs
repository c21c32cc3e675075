/// Nearest-rank percentile of an ascending slice.
///
/// The rank is `ceil(p / 100 * n) - 1`, clamped to the slice, so `p <= 0`
/// gives the minimum and `p >= 100` the maximum. No interpolation.
/// Returns `None` for an empty slice.
pub fn percentile(sorted: &[i64], p: f64) -> Option<i64> {
    let last = sorted.len().checked_sub(1)?;
    // NaN lands here too.
    if !(p > 0.0) {
        return sorted.first().copied();
    }
    if p >= 100.0 {
        return sorted.get(last).copied();
    }
    let rank = (p / 100.0 * sorted.len() as f64).ceil() as usize;
    sorted.get(rank.saturating_sub(1).min(last)).copied()
}

// ---------------------------------------------------------------------------
// ElapsedStats — summary of one group of elapsed values
// ---------------------------------------------------------------------------

/// Distribution summary over a set of elapsed times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElapsedStats {
    pub count: usize,
    pub mean: f64,
    pub min: i64,
    pub max: i64,
    pub p50: i64,
    pub p90: i64,
    pub p95: i64,
    pub p99: i64,
}

impl ElapsedStats {
    /// Sorts `values` in place. `None` when there is nothing to summarize.
    pub fn from_values(values: &mut [i64]) -> Option<Self> {
        values.sort_unstable();
        let min = *values.first()?;
        let max = *values.last()?;
        let sum: i128 = values.iter().map(|&v| i128::from(v)).sum();
        Some(Self {
            count: values.len(),
            mean: sum as f64 / values.len() as f64,
            min,
            max,
            p50: percentile(values, 50.0)?,
            p90: percentile(values, 90.0)?,
            p95: percentile(values, 95.0)?,
            p99: percentile(values, 99.0)?,
        })
    }
}
