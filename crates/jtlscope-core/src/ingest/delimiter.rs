use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Delimiter
// ---------------------------------------------------------------------------

/// Column separators recognised in result logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Tab,
    Comma,
    Semicolon,
    Pipe,
}

impl Delimiter {
    /// Detection order. Earlier entries win ties.
    pub const CANDIDATES: [Delimiter; 4] = [
        Delimiter::Tab,
        Delimiter::Comma,
        Delimiter::Semicolon,
        Delimiter::Pipe,
    ];

    pub fn as_char(self) -> char {
        match self {
            Delimiter::Tab => '\t',
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
            Delimiter::Pipe => '|',
        }
    }
}

impl std::fmt::Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Delimiter::Tab => "\\t",
            Delimiter::Comma => ",",
            Delimiter::Semicolon => ";",
            Delimiter::Pipe => "|",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Pick the delimiter that splits `header_line` into the most fields and
/// return it together with the cleaned header cells.
pub fn detect_delimiter(header_line: &str) -> (Delimiter, Vec<String>) {
    let mut best = Delimiter::CANDIDATES[0];
    let mut best_cells = split_row(header_line, best);

    for candidate in Delimiter::CANDIDATES.into_iter().skip(1) {
        let cells = split_row(header_line, candidate);
        if cells.len() > best_cells.len() {
            best = candidate;
            best_cells = cells;
        }
    }

    (best, best_cells)
}

// ---------------------------------------------------------------------------
// Row splitting
// ---------------------------------------------------------------------------

/// Split one line into cells, honouring double-quoted sections.
///
/// A `"` only opens a quoted section at the start of the line or right after
/// a delimiter; inside a quoted section every `"` toggles the state. Quote
/// characters stay in the cell until [`clean_cell`] strips the outer pair, so
/// unbalanced quoting yields a best-effort split instead of an error.
pub fn split_row(line: &str, delimiter: Delimiter) -> Vec<String> {
    let sep = delimiter.as_char();
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut prev: Option<char> = None;

    for ch in line.chars() {
        if ch == '"' && (in_quotes || prev.is_none() || prev == Some(sep)) {
            in_quotes = !in_quotes;
            current.push(ch);
        } else if ch == sep && !in_quotes {
            cells.push(clean_cell(&current));
            current.clear();
        } else {
            current.push(ch);
        }
        prev = Some(ch);
    }
    cells.push(clean_cell(&current));

    cells
}

/// Trim a cell and remove one pair of wrapping double quotes.
fn clean_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.to_string()
}
