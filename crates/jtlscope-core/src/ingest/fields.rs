use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FieldKind — canonical record fields
// ---------------------------------------------------------------------------

/// Canonical record field a log column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Timestamp,
    Elapsed,
    Label,
    ResponseCode,
    Success,
    ThreadName,
    FailureMessage,
    ResponseMessage,
    Bytes,
    SentBytes,
    Latency,
    Connect,
    AllThreads,
    Url,
}

/// Normalized header spellings, per canonical field.
const SYNONYMS: &[(FieldKind, &[&str])] = &[
    (
        FieldKind::Timestamp,
        &["timestamp", "time", "ts", "starttime", "datetime", "date"],
    ),
    (
        FieldKind::Elapsed,
        &["elapsed", "elapsedtime", "elapsedms", "responsetime", "duration", "rt"],
    ),
    (
        FieldKind::Label,
        &[
            "label",
            "name",
            "samplername",
            "sampler",
            "transaction",
            "transactionname",
            "requestname",
            "request",
        ],
    ),
    (
        FieldKind::ResponseCode,
        &["responsecode", "statuscode", "status", "code", "rc", "httpcode"],
    ),
    (
        FieldKind::Success,
        &["success", "successful", "issuccess", "ok", "passed"],
    ),
    (
        FieldKind::ThreadName,
        &["threadname", "thread", "threadgroup", "tn"],
    ),
    (
        FieldKind::FailureMessage,
        &["failuremessage", "errormessage", "error", "failure"],
    ),
    (FieldKind::ResponseMessage, &["responsemessage", "message"]),
    (
        FieldKind::Bytes,
        &["bytes", "receivedbytes", "bytesreceived", "responsebytes", "size"],
    ),
    (FieldKind::SentBytes, &["sentbytes", "bytessent"]),
    (FieldKind::Latency, &["latency", "ttfb"]),
    (FieldKind::Connect, &["connect", "connecttime"]),
    (
        FieldKind::AllThreads,
        &["allthreads", "activethreads", "threads", "vusers"],
    ),
    (FieldKind::Url, &["url", "uri", "endpoint", "path"]),
];

fn synonym_table() -> &'static HashMap<&'static str, FieldKind> {
    static TABLE: OnceLock<HashMap<&'static str, FieldKind>> = OnceLock::new();
    TABLE.get_or_init(|| {
        SYNONYMS
            .iter()
            .flat_map(|(kind, names)| names.iter().map(move |name| (*name, *kind)))
            .collect()
    })
}

/// Lower-case a header and drop everything that is not ASCII alphanumeric.
pub fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolve a raw header cell to its canonical field, if any.
pub fn resolve_header(raw: &str) -> Option<FieldKind> {
    synonym_table().get(normalize_header(raw).as_str()).copied()
}

// ---------------------------------------------------------------------------
// Value coercion
// ---------------------------------------------------------------------------

/// Lenient integer parse: optional sign followed by the leading digits.
///
/// `"12.7"` reads as 12 and `"42ms"` as 42; a value without leading digits
/// yields `None`.
pub fn parse_int_lenient(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Supplementary numeric fields read as 0 when unparsable.
pub fn parse_int_or_zero(raw: &str) -> i64 {
    parse_int_lenient(raw).unwrap_or(0)
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a timestamp cell into epoch milliseconds.
///
/// Plain integers are taken as epoch milliseconds. Anything else is tried
/// as an RFC 3339 or JMeter-style calendar datetime (UTC) before falling back
/// to the lenient integer prefix.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(ms) = s.parse::<i64>() {
        return Some(ms);
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
        }
    }

    parse_int_lenient(s)
}

/// `"true"` (any case) and `"1"` are successes; everything else is not.
pub fn parse_success(raw: &str) -> bool {
    let s = raw.trim();
    s.eq_ignore_ascii_case("true") || s == "1"
}
