use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{ChartBucket, ErrorGroup, MetricsOutcome, PerformanceMetrics, TransactionSummary};
use crate::config::BucketWidth;
use crate::ingest::ParseDiagnostics;
use crate::session::Dataset;

// ---------------------------------------------------------------------------
// AnalysisReport — every view of one dataset, ready for rendering
// ---------------------------------------------------------------------------

/// All derived views of a loaded result log, suitable for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisReport {
    pub dataset_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub diagnostics: ParseDiagnostics,
    /// Tells the two "no data" shapes apart from a real summary.
    pub metrics_status: MetricsOutcome,
    /// Flat snapshot, zeroed for the degenerate cases.
    pub metrics: PerformanceMetrics,
    pub bucket_seconds: u32,
    pub chart: Vec<ChartBucket>,
    pub transactions: Vec<TransactionSummary>,
    pub top_errors: Vec<ErrorGroup>,
}

impl AnalysisReport {
    pub fn from_dataset(dataset: &Dataset, width: BucketWidth, top_errors: usize) -> Self {
        let outcome = dataset.metrics().clone();
        Self {
            dataset_id: dataset.id(),
            generated_at: Utc::now(),
            diagnostics: dataset.diagnostics().clone(),
            metrics: outcome.to_metrics(),
            metrics_status: outcome,
            bucket_seconds: width.secs(),
            chart: dataset.chart(width),
            transactions: dataset.transactions().to_vec(),
            top_errors: dataset.top_errors(top_errors),
        }
    }
}

/// Export a report as pretty-printed JSON.
pub fn export_json(report: &AnalysisReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::ingest::{FixedClock, JtlParser};
    use crate::session::LogSession;

    const LOG: &str = "timeStamp\telapsed\tlabel\tresponseCode\tsuccess\tfailureMessage\n\
                       1700000000000\t120\tHome\t200\ttrue\t\n\
                       1700000001000\t340\tSearch\t500\tfalse\tdb down\n\
                       1700000040000\t90\tHome\t404\tfalse\tmissing\n";

    fn loaded_session(top_errors: usize) -> LogSession {
        let mut s = LogSession::with_parser(
            JtlParser::with_clock(FixedClock(0)),
            AnalysisConfig {
                bucket_seconds: 30,
                top_errors,
            },
        );
        s.load(LOG).expect("log should load");
        s
    }

    #[test]
    fn report_contains_every_view() {
        let report = loaded_session(5).report().expect("report");
        assert_eq!(report.diagnostics.rows_retained, 3);
        assert!(report.metrics_status.is_computed());
        assert_eq!(report.metrics.total_requests, 3);
        assert_eq!(report.bucket_seconds, 30);
        assert_eq!(report.chart.len(), 2);
        assert_eq!(report.transactions.len(), 2);
        assert_eq!(report.top_errors.len(), 2);
    }

    #[test]
    fn report_respects_top_errors_limit() {
        let report = loaded_session(1).report().expect("report");
        assert_eq!(report.top_errors.len(), 1);
    }

    #[test]
    fn export_json_is_valid_json() {
        let report = loaded_session(5).report().expect("report");
        let json_str = export_json(&report).expect("export_json should not fail");
        let parsed: serde_json::Value =
            serde_json::from_str(&json_str).expect("output should be valid JSON");
        assert!(parsed.get("dataset_id").is_some());
        assert_eq!(parsed["metrics_status"]["status"], "computed");
        assert_eq!(parsed["transactions"][0]["label"], "Home");
        assert_eq!(parsed["top_errors"][0]["category"], "server_error");
    }

    #[test]
    fn export_json_is_pretty() {
        let report = loaded_session(5).report().expect("report");
        let json_str = export_json(&report).expect("export");
        assert!(json_str.contains('\n'));
        assert!(json_str.contains("  "));
    }
}
