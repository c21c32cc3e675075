use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::JtlError;

/// Default width of a chart bucket, in seconds.
pub const DEFAULT_BUCKET_SECONDS: u32 = 30;

/// Default number of error groups shown by consumers.
pub const DEFAULT_TOP_ERRORS: usize = 5;

// ---------------------------------------------------------------------------
// AnalysisConfig
// ---------------------------------------------------------------------------

/// Tunables for the aggregation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisConfig {
    /// Width of each time bucket in the chart series.
    #[serde(default = "default_bucket_seconds")]
    pub bucket_seconds: u32,
    /// How many error groups a report keeps.
    #[serde(default = "default_top_errors")]
    pub top_errors: usize,
}

fn default_bucket_seconds() -> u32 {
    DEFAULT_BUCKET_SECONDS
}

fn default_top_errors() -> usize {
    DEFAULT_TOP_ERRORS
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bucket_seconds: DEFAULT_BUCKET_SECONDS,
            top_errors: DEFAULT_TOP_ERRORS,
        }
    }
}

impl AnalysisConfig {
    /// Resolve the configured bucket width, rejecting zero.
    pub fn bucket_width(&self) -> Result<BucketWidth, JtlError> {
        BucketWidth::from_secs(self.bucket_seconds)
    }
}

/// Validate an [`AnalysisConfig`] and return a list of problems.
///
/// An empty `Vec` means the config is usable.
pub fn validate_config(config: &AnalysisConfig) -> Vec<JtlError> {
    let mut errors = Vec::new();

    if config.bucket_seconds == 0 {
        errors.push(JtlError::Config(
            "bucket_seconds must be a positive integer".to_string(),
        ));
    }

    if config.top_errors == 0 {
        errors.push(JtlError::Config(
            "top_errors must be at least 1".to_string(),
        ));
    }

    errors
}

// ---------------------------------------------------------------------------
// BucketWidth
// ---------------------------------------------------------------------------

/// A strictly positive bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketWidth(NonZeroU32);

impl BucketWidth {
    pub fn from_secs(secs: u32) -> Result<Self, JtlError> {
        NonZeroU32::new(secs).map(Self).ok_or_else(|| {
            JtlError::Config("bucket width must be greater than zero seconds".to_string())
        })
    }

    pub fn secs(self) -> u32 {
        self.0.get()
    }

    pub fn millis(self) -> i64 {
        i64::from(self.0.get()) * 1000
    }
}

impl Default for BucketWidth {
    fn default() -> Self {
        Self(NonZeroU32::MIN.saturating_add(DEFAULT_BUCKET_SECONDS - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = AnalysisConfig::default();
        assert_eq!(config.bucket_seconds, 30);
        assert_eq!(config.top_errors, 5);
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn deserialize_empty_object_uses_defaults() {
        let config: AnalysisConfig = serde_json::from_str("{}").expect("should parse");
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn deserialize_partial_object() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"bucket_seconds": 10}"#).expect("should parse");
        assert_eq!(config.bucket_seconds, 10);
        assert_eq!(config.top_errors, 5);
    }

    #[test]
    fn zero_bucket_seconds_is_invalid() {
        let config = AnalysisConfig {
            bucket_seconds: 0,
            ..AnalysisConfig::default()
        };
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("bucket_seconds"));
        assert!(config.bucket_width().is_err());
    }

    #[test]
    fn zero_top_errors_is_invalid() {
        let config = AnalysisConfig {
            top_errors: 0,
            ..AnalysisConfig::default()
        };
        assert_eq!(validate_config(&config).len(), 1);
    }

    #[test]
    fn bucket_width_default_is_thirty_seconds() {
        let width = BucketWidth::default();
        assert_eq!(width.secs(), 30);
        assert_eq!(width.millis(), 30_000);
    }

    #[test]
    fn bucket_width_from_secs() {
        let width = BucketWidth::from_secs(5).expect("5s is valid");
        assert_eq!(width.millis(), 5_000);
        assert!(BucketWidth::from_secs(0).is_err());
    }
}
