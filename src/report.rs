use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::conflict::ConflictPolicy;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Severity, Suggestion};
use crate::source::line_col;

/// Metadata for a diagnostic report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Version of the report format
    pub version: String,

    /// Timestamp when the report was generated
    pub generated_at: DateTime<Utc>,

    /// Number of files scanned
    pub files_scanned: usize,

    /// Conflict policy the files were checked with
    pub conflict_policy: ConflictPolicy,

    /// Analyzer version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer_version: Option<String>,
}

/// One diagnostic with its position in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,

    /// Source text under the diagnostic
    pub text: String,

    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,
}

impl ReportEntry {
    /// Locate `diagnostic` inside `source`.
    pub fn from_diagnostic(source: &str, diagnostic: Diagnostic) -> Self {
        let (line, column) = line_col(source, diagnostic.range.start);
        let (end_line, end_column) = line_col(source, diagnostic.range.end);
        let text = source
            .get(diagnostic.range.clone())
            .unwrap_or_default()
            .to_string();
        Self {
            line,
            column,
            end_line,
            end_column,
            text,
            kind: diagnostic.kind,
            severity: diagnostic.severity,
            message: diagnostic.message,
            suggestion: diagnostic.suggestion,
        }
    }
}

/// Complete report structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,

    /// Diagnostics per file, in scan order
    pub files: IndexMap<String, Vec<ReportEntry>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ReportStatistics>,
}

/// Totals over the whole report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStatistics {
    pub errors: usize,
    pub warnings: usize,

    /// Number of files with at least one diagnostic
    pub files_with_diagnostics: usize,

    pub by_kind: BTreeMap<DiagnosticKind, usize>,

    /// Processing time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,

    /// Most frequent unknown variants and class names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_unknown: Option<Vec<TopToken>>,
}

/// A frequently reported unknown token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopToken {
    pub text: String,
    pub count: usize,
    pub file_count: usize,
}

impl Report {
    pub fn new() -> Self {
        Self {
            metadata: ReportMetadata {
                version: "1.0.0".to_string(),
                generated_at: Utc::now(),
                files_scanned: 0,
                conflict_policy: ConflictPolicy::default(),
                analyzer_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            },
            files: IndexMap::new(),
            statistics: None,
        }
    }

    /// Record the diagnostics of one file. Files without findings are not listed.
    pub fn add_file(&mut self, path: String, source: &str, diagnostics: Vec<Diagnostic>) {
        if diagnostics.is_empty() {
            return;
        }
        let entries = diagnostics
            .into_iter()
            .map(|d| ReportEntry::from_diagnostic(source, d));
        self.files.entry(path).or_default().extend(entries);
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &ReportEntry)> {
        self.files
            .iter()
            .flat_map(|(path, entries)| entries.iter().map(move |e| (path.as_str(), e)))
    }

    pub fn error_count(&self) -> usize {
        self.entries().filter(|(_, e)| e.severity == Severity::Error).count()
    }

    pub fn has_errors(&self) -> bool {
        self.entries().any(|(_, e)| e.severity == Severity::Error)
    }

    /// Calculate and set statistics
    pub fn calculate_statistics(&mut self, processing_time_ms: Option<u64>) {
        let mut errors = 0;
        let mut warnings = 0;
        let mut by_kind = BTreeMap::new();
        let mut unknown: IndexMap<&str, (usize, HashSet<&str>)> = IndexMap::new();

        for (path, entry) in self.entries() {
            match entry.severity {
                Severity::Error => errors += 1,
                Severity::Warning => warnings += 1,
            }
            *by_kind.entry(entry.kind).or_insert(0) += 1;
            if matches!(entry.kind, DiagnosticKind::UnknownVariant | DiagnosticKind::UnknownClassName) {
                let slot = unknown.entry(entry.text.as_str()).or_default();
                slot.0 += 1;
                slot.1.insert(path);
            }
        }

        let mut top: Vec<TopToken> = unknown
            .into_iter()
            .map(|(text, (count, files))| TopToken {
                text: text.to_string(),
                count,
                file_count: files.len(),
            })
            .collect();
        top.sort_by(|a, b| b.count.cmp(&a.count));
        top.truncate(10);

        self.statistics = Some(ReportStatistics {
            errors,
            warnings,
            files_with_diagnostics: self.files.len(),
            by_kind,
            processing_time_ms,
            top_unknown: Some(top),
        });
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }

    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder pattern for creating reports
pub struct ReportBuilder {
    report: Report,
    start_time: Option<std::time::Instant>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            report: Report::new(),
            start_time: Some(std::time::Instant::now()),
        }
    }

    pub fn with_files_scanned(mut self, count: usize) -> Self {
        self.report.metadata.files_scanned = count;
        self
    }

    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.report.metadata.conflict_policy = policy;
        self
    }

    pub fn with_file(mut self, path: String, source: &str, diagnostics: Vec<Diagnostic>) -> Self {
        self.report.add_file(path, source, diagnostics);
        self
    }

    /// Build the final report with statistics
    pub fn build(mut self) -> Report {
        let processing_time = self.start_time.map(|t| t.elapsed().as_millis() as u64);
        self.report.calculate_statistics(processing_time);
        self.report
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
