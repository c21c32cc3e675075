pub mod delimiter;
pub mod fields;
pub mod record;

use serde::{Deserialize, Serialize};

use crate::error::JtlError;

pub use delimiter::{detect_delimiter, split_row, Delimiter};
pub use fields::{normalize_header, resolve_header, FieldKind};
pub use record::{Clock, FixedClock, Record, RecordDraft, SystemClock};

/// Rows shorter than `min(header_count, MIN_ROW_CELLS)` are not attempted.
pub const MIN_ROW_CELLS: usize = 3;

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// How one header column was interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HeaderMapping {
    pub header: String,
    /// `None` when the column is not recognised and is ignored.
    pub field: Option<FieldKind>,
}

/// Troubleshooting counters for a parse. Not needed for correctness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ParseDiagnostics {
    /// Non-blank lines, header included.
    pub total_lines: usize,
    pub headers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<Delimiter>,
    pub header_mappings: Vec<HeaderMapping>,
    /// Data rows long enough to go through field mapping.
    pub rows_attempted: usize,
    pub rows_retained: usize,
    /// Data rows dropped, whether too short or failing validation.
    pub rows_rejected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_record: Option<Record>,
}

// ---------------------------------------------------------------------------
// ParsedLog / ParseOutcome
// ---------------------------------------------------------------------------

/// Successful parse: the retained records plus diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLog {
    pub records: Vec<Record>,
    pub diagnostics: ParseDiagnostics,
}

/// Flat, serializable view of a parse attempt for a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ParseOutcome {
    pub success: bool,
    pub records: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub diagnostics: ParseDiagnostics,
}

impl ParseOutcome {
    /// Flatten a parse result. A failure carries empty records and the error
    /// text; `total_lines` is the only diagnostic known at that point.
    pub fn from_result(result: Result<ParsedLog, JtlError>, total_lines: usize) -> Self {
        match result {
            Ok(parsed) => Self {
                success: true,
                records: parsed.records,
                error: None,
                diagnostics: parsed.diagnostics,
            },
            Err(e) => Self {
                success: false,
                records: Vec::new(),
                error: Some(e.to_string()),
                diagnostics: ParseDiagnostics {
                    total_lines,
                    ..ParseDiagnostics::default()
                },
            },
        }
    }
}

// ---------------------------------------------------------------------------
// JtlParser
// ---------------------------------------------------------------------------

/// Tolerant result-log parser.
///
/// Detects the delimiter and header on the first line, splits every following
/// line with quote awareness, maps cells to fields through the synonym table,
/// then validates and defaults each row. Only a file without data rows fails
/// outright; rejected rows are counted in [`ParseDiagnostics`].
pub struct JtlParser {
    clock: Box<dyn Clock + Send + Sync>,
}

impl JtlParser {
    /// Parser that synthesizes missing timestamps from the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Parser with a caller-supplied clock, e.g. [`FixedClock`] for
    /// reproducible output.
    pub fn with_clock(clock: impl Clock + Send + Sync + 'static) -> Self {
        Self {
            clock: Box::new(clock),
        }
    }

    /// Parse a whole log in one pass.
    pub fn parse(&self, text: &str) -> Result<ParsedLog, JtlError> {
        let lines = content_lines(text);
        if lines.len() < 2 {
            tracing::warn!(lines = lines.len(), "result log has no data rows");
            return Err(JtlError::Structure(format!(
                "File must contain a header line and at least one data row (found {} non-empty line{})",
                lines.len(),
                if lines.len() == 1 { "" } else { "s" }
            )));
        }

        let (delimiter, headers) = detect_delimiter(lines[0]);
        let mapping: Vec<Option<FieldKind>> = headers.iter().map(|h| resolve_header(h)).collect();
        tracing::debug!(
            %delimiter,
            columns = headers.len(),
            mapped = mapping.iter().filter(|m| m.is_some()).count(),
            "detected result log layout"
        );

        let min_cells = headers.len().min(MIN_ROW_CELLS);
        let mut records: Vec<Record> = Vec::new();
        let mut attempted = 0usize;

        for line in &lines[1..] {
            let cells = split_row(line, delimiter);
            if cells.len() < min_cells {
                continue;
            }
            attempted += 1;

            let mut draft = RecordDraft::default();
            for (field, value) in mapping.iter().zip(cells.iter()) {
                if let Some(field) = field {
                    draft.set(*field, value);
                }
            }

            if let Some(record) = draft.finish(records.len(), &*self.clock) {
                records.push(record);
            }
        }

        let data_rows = lines.len() - 1;
        let rejected = data_rows - records.len();
        if rejected > 0 {
            tracing::warn!(rejected, data_rows, "skipped unusable rows in result log");
        }
        tracing::debug!(retained = records.len(), attempted, "parsed result log");

        let diagnostics = ParseDiagnostics {
            total_lines: lines.len(),
            header_mappings: headers
                .iter()
                .zip(mapping.iter())
                .map(|(header, field)| HeaderMapping {
                    header: header.clone(),
                    field: *field,
                })
                .collect(),
            headers,
            delimiter: Some(delimiter),
            rows_attempted: attempted,
            rows_retained: records.len(),
            rows_rejected: rejected,
            sample_record: records.first().cloned(),
        };

        Ok(ParsedLog {
            records,
            diagnostics,
        })
    }

    /// Parse and flatten into a [`ParseOutcome`].
    pub fn parse_outcome(&self, text: &str) -> ParseOutcome {
        ParseOutcome::from_result(self.parse(text), content_lines(text).len())
    }
}

impl Default for JtlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-blank lines with trailing whitespace (including `\r`) removed.
pub(crate) fn content_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect()
}
