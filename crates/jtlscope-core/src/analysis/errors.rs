use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::round2;
use crate::ingest::Record;

/// Message used when no failed sample in a group carried one.
pub const NO_ERROR_MESSAGE: &str = "No error message";

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Coarse classification of a failure by its response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// 4xx
    ClientError,
    /// 5xx
    ServerError,
    /// 3xx
    Redirect,
    /// A successful HTTP status on a failed sample, i.e. an assertion failure.
    Assertion,
    /// Not an HTTP status at all, e.g. JMeter's "Non HTTP response code: ...".
    NonHttp,
}

impl ErrorCategory {
    pub fn from_response_code(code: &str) -> Self {
        match code.trim().parse::<u16>() {
            Ok(100..=299) => ErrorCategory::Assertion,
            Ok(300..=399) => ErrorCategory::Redirect,
            Ok(400..=499) => ErrorCategory::ClientError,
            Ok(500..=599) => ErrorCategory::ServerError,
            _ => ErrorCategory::NonHttp,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::ClientError => "client error",
            ErrorCategory::ServerError => "server error",
            ErrorCategory::Redirect => "redirect",
            ErrorCategory::Assertion => "assertion",
            ErrorCategory::NonHttp => "non-http",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// ErrorGroup
// ---------------------------------------------------------------------------

/// Failed samples sharing one response code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorGroup {
    pub response_code: String,
    pub category: ErrorCategory,
    pub count: u64,
    /// Share of all failed samples, in percent.
    pub percentage: f64,
    pub message: String,
    /// Distinct labels, in order of first failure.
    pub affected_transactions: Vec<String>,
}

struct GroupBuilder {
    code: String,
    count: u64,
    failure_message: Option<String>,
    response_message: Option<String>,
    labels: Vec<String>,
}

impl GroupBuilder {
    fn push(&mut self, record: &Record) {
        self.count += 1;
        if self.failure_message.is_none() {
            self.failure_message = record.failure_message.clone().filter(|m| !m.is_empty());
        }
        if self.response_message.is_none() {
            self.response_message = record.response_message.clone().filter(|m| !m.is_empty());
        }
        if !self.labels.iter().any(|l| l == &record.label) {
            self.labels.push(record.label.clone());
        }
    }

    fn finish(self, failed_total: u64) -> ErrorGroup {
        ErrorGroup {
            category: ErrorCategory::from_response_code(&self.code),
            percentage: round2(self.count as f64 / failed_total as f64 * 100.0),
            message: self
                .failure_message
                .or(self.response_message)
                .unwrap_or_else(|| NO_ERROR_MESSAGE.to_string()),
            response_code: self.code,
            count: self.count,
            affected_transactions: self.labels,
        }
    }
}

/// Group failed records by response code, most frequent first.
///
/// Ties keep the order in which the codes first failed.
pub fn analyze_errors(records: &[Record]) -> Vec<ErrorGroup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<GroupBuilder> = Vec::new();

    for record in records.iter().filter(|r| !r.success) {
        let slot = *index.entry(record.response_code.as_str()).or_insert_with(|| {
            groups.push(GroupBuilder {
                code: record.response_code.clone(),
                count: 0,
                failure_message: None,
                response_message: None,
                labels: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].push(record);
    }

    let failed_total: u64 = groups.iter().map(|g| g.count).sum();
    let mut result: Vec<ErrorGroup> = groups
        .into_iter()
        .map(|g| g.finish(failed_total))
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count));
    result
}

/// The `n` most frequent error groups.
pub fn top_errors(records: &[Record], n: usize) -> Vec<ErrorGroup> {
    let mut groups = analyze_errors(records);
    groups.truncate(n);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::record;

    fn failed(code: &str, label: &str, message: Option<&str>) -> Record {
        let mut r = record(1000, 10, label, code, false);
        r.failure_message = message.map(str::to_string);
        r
    }

    #[test]
    fn no_failures_gives_no_groups() {
        let records = vec![record(1000, 10, "A", "200", true)];
        assert!(analyze_errors(&records).is_empty());
        assert!(analyze_errors(&[]).is_empty());
    }

    #[test]
    fn login_scenario_errors() {
        let records = vec![
            record(1000, 100, "Login", "200", true),
            record(2000, 200, "Login", "500", false),
        ];
        let groups = analyze_errors(&records);
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.response_code, "500");
        assert_eq!(g.count, 1);
        assert_eq!(g.percentage, 100.0);
        assert_eq!(g.affected_transactions, vec!["Login"]);
        assert_eq!(g.category, ErrorCategory::ServerError);
        assert_eq!(g.message, NO_ERROR_MESSAGE);
    }

    #[test]
    fn percentage_is_of_failed_records_only() {
        let mut records = vec![
            failed("500", "A", None),
            failed("500", "B", None),
            failed("404", "A", None),
        ];
        records.extend((0..97).map(|_| record(1000, 10, "A", "200", true)));
        let groups = analyze_errors(&records);
        assert_eq!(groups[0].response_code, "500");
        assert_eq!(groups[0].percentage, 66.67);
        assert_eq!(groups[1].percentage, 33.33);
    }

    #[test]
    fn sorted_by_count_with_stable_ties() {
        let records = vec![
            failed("404", "A", None),
            failed("503", "A", None),
            failed("500", "A", None),
            failed("500", "B", None),
            failed("503", "C", None),
        ];
        let codes: Vec<String> = analyze_errors(&records)
            .into_iter()
            .map(|g| g.response_code)
            .collect();
        assert_eq!(codes, vec!["503", "500", "404"]);
    }

    #[test]
    fn first_non_empty_message_wins() {
        let mut with_response = failed("500", "A", None);
        with_response.response_message = Some("Internal Server Error".to_string());
        let records = vec![
            failed("500", "A", Some("")),
            with_response,
            failed("500", "B", Some("db timeout")),
            failed("500", "C", Some("later message")),
        ];
        let groups = analyze_errors(&records);
        assert_eq!(groups[0].message, "db timeout");
        assert_eq!(groups[0].affected_transactions, vec!["A", "B", "C"]);
    }

    #[test]
    fn response_message_is_fallback() {
        let mut r = failed("503", "A", None);
        r.response_message = Some("Service Unavailable".to_string());
        let groups = analyze_errors(&[r]);
        assert_eq!(groups[0].message, "Service Unavailable");
    }

    #[test]
    fn affected_labels_are_distinct() {
        let records = vec![
            failed("500", "B", None),
            failed("500", "A", None),
            failed("500", "B", None),
        ];
        let groups = analyze_errors(&records);
        assert_eq!(groups[0].affected_transactions, vec!["B", "A"]);
    }

    #[test]
    fn top_errors_truncates() {
        let records: Vec<Record> = (0..8)
            .map(|i| failed(&format!("5{i:02}"), "A", None))
            .collect();
        assert_eq!(top_errors(&records, 5).len(), 5);
        assert_eq!(top_errors(&records, 20).len(), 8);
    }

    #[test]
    fn categories_from_codes() {
        assert_eq!(ErrorCategory::from_response_code("200"), ErrorCategory::Assertion);
        assert_eq!(ErrorCategory::from_response_code("302"), ErrorCategory::Redirect);
        assert_eq!(ErrorCategory::from_response_code("404"), ErrorCategory::ClientError);
        assert_eq!(ErrorCategory::from_response_code("502"), ErrorCategory::ServerError);
        assert_eq!(
            ErrorCategory::from_response_code("Non HTTP response code: java.net.SocketTimeoutException"),
            ErrorCategory::NonHttp
        );
        assert_eq!(ErrorCategory::from_response_code("999"), ErrorCategory::NonHttp);
    }

    #[test]
    fn category_display() {
        assert_eq!(ErrorCategory::ClientError.to_string(), "client error");
        assert_eq!(ErrorCategory::NonHttp.to_string(), "non-http");
    }
}
