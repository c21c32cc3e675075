use std::path::Path;

use crate::config::{validate_config, AnalysisConfig};
use crate::error::JtlError;
use crate::report::{export_json, AnalysisReport};

/// Read a result log from disk as UTF-8 text.
pub async fn read_log(path: impl AsRef<Path>) -> Result<String, JtlError> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    Ok(content)
}

/// Read an [`AnalysisConfig`] from a JSON file and validate it.
///
/// Only the first validation problem is returned.
pub async fn read_config(path: impl AsRef<Path>) -> Result<AnalysisConfig, JtlError> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    let config: AnalysisConfig = serde_json::from_str(&content)?;
    if let Some(err) = validate_config(&config).into_iter().next() {
        return Err(err);
    }
    Ok(config)
}

/// Write an [`AnalysisReport`] to disk as pretty-printed JSON.
pub async fn write_report(report: &AnalysisReport, path: impl AsRef<Path>) -> Result<(), JtlError> {
    let content = export_json(report)?;
    tokio::fs::write(path.as_ref(), content).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{FixedClock, JtlParser};
    use crate::session::LogSession;

    const LOG: &str = "timeStamp,elapsed,label,responseCode,success\n\
                       1700000000000,120,Home,200,true\n\
                       1700000002000,480,Search,503,false\n";

    #[tokio::test]
    async fn read_log_returns_file_text() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("results.jtl");
        tokio::fs::write(&path, LOG).await.expect("write log");

        let text = read_log(&path).await.expect("read_log should succeed");
        assert_eq!(text, LOG);
    }

    #[tokio::test]
    async fn read_log_error_for_nonexistent_file() {
        let result = read_log("/nonexistent/path/results.jtl").await;
        assert!(matches!(result, Err(JtlError::Io(_))));
    }

    #[tokio::test]
    async fn read_config_applies_defaults() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, br#"{"bucket_seconds": 5}"#)
            .await
            .expect("write config");

        let config = read_config(&path).await.expect("config should load");
        assert_eq!(config.bucket_seconds, 5);
        assert_eq!(config.top_errors, 5);
    }

    #[tokio::test]
    async fn read_config_rejects_zero_bucket() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, br#"{"bucket_seconds": 0}"#)
            .await
            .expect("write config");

        let result = read_config(&path).await;
        assert!(matches!(result, Err(JtlError::Config(_))));
    }

    #[tokio::test]
    async fn read_config_error_for_invalid_json() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, b"not valid json at all")
            .await
            .expect("write config");

        let result = read_config(&path).await;
        assert!(matches!(result, Err(JtlError::Serde(_))));
    }

    #[tokio::test]
    async fn load_analyze_and_write_report() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let log_path = dir.path().join("results.csv");
        let report_path = dir.path().join("report.json");
        tokio::fs::write(&log_path, LOG).await.expect("write log");

        let text = read_log(&log_path).await.expect("read log");
        let mut session = LogSession::with_parser(
            JtlParser::with_clock(FixedClock(0)),
            AnalysisConfig::default(),
        );
        session.load(&text).expect("log should parse");
        let report = session.report().expect("report");
        write_report(&report, &report_path).await.expect("write report");

        let written = tokio::fs::read_to_string(&report_path)
            .await
            .expect("report should be readable");
        let parsed: serde_json::Value = serde_json::from_str(&written).expect("valid JSON");
        assert_eq!(parsed["metrics"]["total_requests"], 2);
        assert_eq!(parsed["metrics"]["error_rate"], 50.0);
        assert_eq!(parsed["top_errors"][0]["response_code"], "503");
    }
}
