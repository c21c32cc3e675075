use std::cell::{OnceCell, RefCell};
use std::collections::BTreeMap;

use uuid::Uuid;

use crate::analysis::{
    analyze_errors, build_chart_buckets, calculate_metrics, summarize_transactions, ChartBucket,
    ErrorGroup, MetricsOutcome, TransactionSummary,
};
use crate::config::{AnalysisConfig, BucketWidth};
use crate::error::JtlError;
use crate::ingest::{content_lines, JtlParser, ParseDiagnostics, ParseOutcome, ParsedLog, Record};
use crate::report::AnalysisReport;

// ---------------------------------------------------------------------------
// Dataset — one loaded record collection and its memoized views
// ---------------------------------------------------------------------------

/// Records from a single load. Views are computed on first use and live as
/// long as the dataset, so replacing the dataset drops them with it.
pub struct Dataset {
    id: Uuid,
    revision: u64,
    records: Vec<Record>,
    diagnostics: ParseDiagnostics,
    metrics: OnceCell<MetricsOutcome>,
    transactions: OnceCell<Vec<TransactionSummary>>,
    errors: OnceCell<Vec<ErrorGroup>>,
    charts: RefCell<BTreeMap<BucketWidth, Vec<ChartBucket>>>,
}

impl Dataset {
    fn new(parsed: ParsedLog, revision: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            revision,
            records: parsed.records,
            diagnostics: parsed.diagnostics,
            metrics: OnceCell::new(),
            transactions: OnceCell::new(),
            errors: OnceCell::new(),
            charts: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn diagnostics(&self) -> &ParseDiagnostics {
        &self.diagnostics
    }

    pub fn metrics(&self) -> &MetricsOutcome {
        self.metrics.get_or_init(|| calculate_metrics(&self.records))
    }

    pub fn transactions(&self) -> &[TransactionSummary] {
        self.transactions
            .get_or_init(|| summarize_transactions(&self.records))
    }

    /// All error groups, most frequent first.
    pub fn errors(&self) -> &[ErrorGroup] {
        self.errors.get_or_init(|| analyze_errors(&self.records))
    }

    pub fn top_errors(&self, n: usize) -> Vec<ErrorGroup> {
        self.errors().iter().take(n).cloned().collect()
    }

    /// Chart series for `width`, memoized per width.
    pub fn chart(&self, width: BucketWidth) -> Vec<ChartBucket> {
        self.charts
            .borrow_mut()
            .entry(width)
            .or_insert_with(|| build_chart_buckets(&self.records, width))
            .clone()
    }
}

// ---------------------------------------------------------------------------
// LogSession — owner of the current dataset
// ---------------------------------------------------------------------------

/// Holds at most one loaded dataset. Every load replaces it wholesale.
pub struct LogSession {
    parser: JtlParser,
    config: AnalysisConfig,
    dataset: Option<Dataset>,
    revision: u64,
}

impl LogSession {
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_parser(JtlParser::new(), config)
    }

    pub fn with_parser(parser: JtlParser, config: AnalysisConfig) -> Self {
        Self {
            parser,
            config,
            dataset: None,
            revision: 0,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Parse `text` and make it the current dataset.
    ///
    /// The previous dataset is dropped before parsing, so a failed load
    /// leaves the session empty rather than showing stale results.
    pub fn load(&mut self, text: &str) -> Result<&Dataset, JtlError> {
        self.dataset = None;
        let parsed = self.parser.parse(text)?;
        self.revision += 1;
        tracing::debug!(
            revision = self.revision,
            records = parsed.records.len(),
            "loaded result log"
        );
        Ok(self.dataset.insert(Dataset::new(parsed, self.revision)))
    }

    /// Like [`LogSession::load`], flattened for a presentation layer.
    pub fn load_outcome(&mut self, text: &str) -> ParseOutcome {
        match self.load(text) {
            Ok(dataset) => ParseOutcome {
                success: true,
                records: dataset.records().to_vec(),
                error: None,
                diagnostics: dataset.diagnostics().clone(),
            },
            Err(e) => ParseOutcome::from_result(Err(e), content_lines(text).len()),
        }
    }

    /// Forget the current dataset.
    pub fn clear(&mut self) {
        self.dataset = None;
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    fn current(&self) -> Result<&Dataset, JtlError> {
        self.dataset.as_ref().ok_or(JtlError::NoDataset)
    }

    pub fn metrics(&self) -> Result<&MetricsOutcome, JtlError> {
        Ok(self.current()?.metrics())
    }

    /// Chart series at the configured bucket width.
    pub fn chart(&self) -> Result<Vec<ChartBucket>, JtlError> {
        let width = self.config.bucket_width()?;
        Ok(self.current()?.chart(width))
    }

    pub fn transactions(&self) -> Result<&[TransactionSummary], JtlError> {
        Ok(self.current()?.transactions())
    }

    /// The configured number of most frequent error groups.
    pub fn top_errors(&self) -> Result<Vec<ErrorGroup>, JtlError> {
        Ok(self.current()?.top_errors(self.config.top_errors))
    }

    /// Bundle every view of the current dataset.
    pub fn report(&self) -> Result<AnalysisReport, JtlError> {
        let dataset = self.current()?;
        let width = self.config.bucket_width()?;
        Ok(AnalysisReport::from_dataset(
            dataset,
            width,
            self.config.top_errors,
        ))
    }
}

impl Default for LogSession {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
