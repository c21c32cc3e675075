use serde::{Deserialize, Serialize};

use super::fields::{parse_int_lenient, parse_int_or_zero, parse_success, parse_timestamp, FieldKind};

pub const DEFAULT_LABEL: &str = "Unknown";
pub const DEFAULT_RESPONSE_CODE: &str = "200";
pub const DEFAULT_THREAD_NAME: &str = "Thread-1";
/// Elapsed time assumed for rows that only carry a timestamp.
pub const DEFAULT_ELAPSED_MS: i64 = 100;
/// Spacing between synthesized timestamps.
pub const SYNTHETIC_STEP_MS: i64 = 1000;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One normalized sample from a result log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Record {
    /// Sample start, epoch milliseconds.
    pub timestamp: i64,
    /// Sample duration in milliseconds.
    pub elapsed: i64,
    pub label: String,
    pub response_code: String,
    pub success: bool,
    pub thread_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_bytes: Option<i64>,
    /// Time to first byte; used as the connect-time proxy in reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect: Option<i64>,
    /// Active threads across all groups when the sample finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_threads: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// Clock — source of synthetic timestamps
// ---------------------------------------------------------------------------

/// Wall-clock source used when a log has no timestamp column.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Always reports the same instant, for reproducible parses.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// RecordDraft — a row after field mapping, before validation
// ---------------------------------------------------------------------------

/// Fields collected from one row. Anything still `None` after mapping is
/// either defaulted or causes the row to be rejected in [`RecordDraft::finish`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDraft {
    pub timestamp: Option<i64>,
    pub elapsed: Option<i64>,
    pub label: Option<String>,
    pub response_code: Option<String>,
    pub success: Option<bool>,
    pub thread_name: Option<String>,
    pub failure_message: Option<String>,
    pub response_message: Option<String>,
    pub bytes: Option<i64>,
    pub sent_bytes: Option<i64>,
    pub latency: Option<i64>,
    pub connect: Option<i64>,
    pub all_threads: Option<i64>,
    pub url: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl RecordDraft {
    /// Store one cell into the slot for `field`.
    pub fn set(&mut self, field: FieldKind, value: &str) {
        match field {
            FieldKind::Timestamp => self.timestamp = parse_timestamp(value),
            FieldKind::Elapsed => self.elapsed = parse_int_lenient(value),
            FieldKind::Label => self.label = non_empty(value),
            FieldKind::ResponseCode => self.response_code = non_empty(value),
            FieldKind::Success => self.success = Some(parse_success(value)),
            FieldKind::ThreadName => self.thread_name = non_empty(value),
            FieldKind::FailureMessage => self.failure_message = non_empty(value),
            FieldKind::ResponseMessage => self.response_message = non_empty(value),
            FieldKind::Bytes => self.bytes = Some(parse_int_or_zero(value)),
            FieldKind::SentBytes => self.sent_bytes = Some(parse_int_or_zero(value)),
            FieldKind::Latency => self.latency = Some(parse_int_or_zero(value)),
            FieldKind::Connect => self.connect = Some(parse_int_or_zero(value)),
            FieldKind::AllThreads => self.all_threads = Some(parse_int_or_zero(value)),
            FieldKind::Url => self.url = non_empty(value),
        }
    }

    /// A row is worth keeping when it has time data and something that
    /// identifies the sample.
    pub fn is_acceptable(&self) -> bool {
        let has_time = self.timestamp.is_some() || self.elapsed.is_some();
        let has_identity =
            self.label.is_some() || self.response_code.is_some() || self.success.is_some();
        has_time && has_identity
    }

    /// Validate and fill defaults.
    ///
    /// `accepted` is the number of records already retained from this input;
    /// synthesized timestamps step back one second per retained record so they
    /// stay strictly decreasing in input order.
    pub fn finish(self, accepted: usize, clock: &dyn Clock) -> Option<Record> {
        if !self.is_acceptable() {
            return None;
        }

        let timestamp = match self.timestamp {
            Some(ts) => ts,
            None => {
                let offset = i64::try_from(accepted)
                    .unwrap_or(i64::MAX)
                    .saturating_mul(SYNTHETIC_STEP_MS);
                clock.now_ms().saturating_sub(offset)
            }
        };
        let elapsed = self.elapsed.unwrap_or(DEFAULT_ELAPSED_MS);

        Some(Record {
            timestamp,
            elapsed,
            label: self.label.unwrap_or_else(|| DEFAULT_LABEL.to_string()),
            response_code: self
                .response_code
                .unwrap_or_else(|| DEFAULT_RESPONSE_CODE.to_string()),
            success: self.success.unwrap_or(true),
            thread_name: self
                .thread_name
                .unwrap_or_else(|| DEFAULT_THREAD_NAME.to_string()),
            failure_message: self.failure_message,
            response_message: self.response_message,
            bytes: self.bytes,
            sent_bytes: self.sent_bytes,
            latency: self.latency,
            connect: self.connect,
            all_threads: self.all_threads,
            url: self.url,
        })
    }
}
