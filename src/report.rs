use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reason a row was excluded from the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RejectReason {
    /// A required field was absent or blank
    MissingRequiredField,
    /// A field was present but failed its format rule
    InvalidFormat,
    /// An exact duplicate of a row already seen this run
    DuplicateRow,
    /// A foreign-key reference did not resolve, or a primary key collided
    ConstraintViolation,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            RejectReason::InvalidFormat => "INVALID_FORMAT",
            RejectReason::DuplicateRow => "DUPLICATE_ROW",
            RejectReason::ConstraintViolation => "CONSTRAINT_VIOLATION",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row excluded from the load, with enough context to find it again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    /// 1-based line in the source file (line 1 is the header)
    pub line: usize,
    pub reason: RejectReason,
    /// Field that triggered the rejection, when one did
    pub field: Option<String>,
    pub detail: String,
}

impl Rejection {
    pub fn new(line: usize, reason: RejectReason, field: Option<&str>, detail: String) -> Self {
        Self {
            line,
            reason,
            field: field.map(|f| f.to_string()),
            detail,
        }
    }
}

/// Per-dataset accounting for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub name: String,
    pub rows_read: usize,
    pub duplicates_removed: usize,
    /// Missing optional values filled with a default, keyed by column
    pub filled: BTreeMap<String, usize>,
    pub rows_cleaned: usize,
    pub rows_loaded: usize,
    pub rejections: Vec<Rejection>,
}

impl DatasetSummary {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows_read: 0,
            duplicates_removed: 0,
            filled: BTreeMap::new(),
            rows_cleaned: 0,
            rows_loaded: 0,
            rejections: Vec::new(),
        }
    }

    pub fn record_read(&mut self) {
        self.rows_read += 1;
    }

    pub fn record_filled(&mut self, column: &str) {
        *self.filled.entry(column.to_string()).or_insert(0) += 1;
    }

    pub fn record_cleaned(&mut self) {
        self.rows_cleaned += 1;
    }

    pub fn record_loaded(&mut self) {
        self.rows_loaded += 1;
    }

    pub fn record_rejection(&mut self, rejection: Rejection) {
        if rejection.reason == RejectReason::DuplicateRow {
            self.duplicates_removed += 1;
        }
        self.rejections.push(rejection);
    }

    pub fn rejected_count(&self) -> usize {
        self.rejections.len()
    }

    /// Rejection counts keyed by reason code.
    pub fn rejections_by_reason(&self) -> BTreeMap<RejectReason, usize> {
        let mut counts = BTreeMap::new();
        for rejection in &self.rejections {
            *counts.entry(rejection.reason).or_insert(0) += 1;
        }
        counts
    }

    fn filled_summary(&self) -> String {
        if self.filled.is_empty() {
            return "No Nulls".to_string();
        }
        self.filled
            .iter()
            .map(|(col, cnt)| format!("{}: {}", col, cnt))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn rejection_summary(&self) -> String {
        if self.rejections.is_empty() {
            return "None".to_string();
        }
        self.rejections_by_reason()
            .iter()
            .map(|(reason, cnt)| format!("{}: {}", reason, cnt))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Aggregate quality report for one run. Built up stage by stage and
/// rendered once at the end; nothing here persists between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub datasets: Vec<DatasetSummary>,
}

impl QualityReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            datasets: Vec::new(),
        }
    }

    pub fn push_dataset(&mut self, summary: DatasetSummary) {
        self.datasets.push(summary);
    }

    pub fn total_loaded(&self) -> usize {
        self.datasets.iter().map(|d| d.rows_loaded).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.datasets.iter().map(|d| d.rejected_count()).sum()
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);
        let divider = "-".repeat(60);

        writeln!(out, "DATA QUALITY REPORT").unwrap();
        writeln!(out, "{}", rule).unwrap();
        writeln!(out, "Generated On: {}", self.started_at).unwrap();
        writeln!(out, "Run Id: {}", self.run_id).unwrap();
        writeln!(out).unwrap();

        for (idx, dataset) in self.datasets.iter().enumerate() {
            writeln!(out, "Dataset #{}: {}", idx + 1, dataset.name).unwrap();
            writeln!(out, "Records Processed      : {}", dataset.rows_read).unwrap();
            writeln!(out, "Duplicates Removed     : {}", dataset.duplicates_removed).unwrap();
            writeln!(out, "Missing Values Handled : {}", dataset.filled_summary()).unwrap();
            writeln!(out, "Records Cleaned        : {}", dataset.rows_cleaned).unwrap();
            writeln!(out, "Rejections             : {}", dataset.rejection_summary()).unwrap();
            writeln!(out, "Records Loaded         : {}", dataset.rows_loaded).unwrap();
            writeln!(out, "{}", divider).unwrap();
        }

        out
    }
}

impl Default for QualityReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_with_counts() -> DatasetSummary {
        let mut summary = DatasetSummary::new("Customers");
        for _ in 0..5 {
            summary.record_read();
        }
        summary.record_filled("email");
        summary.record_filled("email");
        summary.record_rejection(Rejection::new(
            3,
            RejectReason::MissingRequiredField,
            Some("name"),
            "name is missing".to_string(),
        ));
        summary.record_rejection(Rejection::new(
            5,
            RejectReason::DuplicateRow,
            None,
            "duplicate of an earlier row".to_string(),
        ));
        for _ in 0..3 {
            summary.record_cleaned();
            summary.record_loaded();
        }
        summary
    }

    #[test]
    fn read_count_equals_loaded_plus_rejected() {
        let summary = summary_with_counts();
        assert_eq!(
            summary.rows_read,
            summary.rows_loaded + summary.rejected_count()
        );
    }

    #[test]
    fn duplicate_rejections_are_counted_as_duplicates_removed() {
        let summary = summary_with_counts();
        assert_eq!(summary.duplicates_removed, 1);
    }

    #[test]
    fn text_report_has_one_section_per_dataset() {
        let mut report = QualityReport::new();
        report.push_dataset(summary_with_counts());
        report.push_dataset(DatasetSummary::new("Products"));

        let text = report.render_text();
        assert!(text.starts_with("DATA QUALITY REPORT"));
        assert!(text.contains("Dataset #1: Customers"));
        assert!(text.contains("Dataset #2: Products"));
        assert!(text.contains("Records Processed      : 5"));
        assert!(text.contains("Missing Values Handled : email: 2"));
        assert!(text.contains("Rejections             : MISSING_REQUIRED_FIELD: 1, DUPLICATE_ROW: 1"));
        assert!(text.contains("Records Loaded         : 3"));
    }

    #[test]
    fn empty_dataset_reports_no_nulls() {
        let mut report = QualityReport::new();
        report.push_dataset(DatasetSummary::new("Products"));
        let text = report.render_text();
        assert!(text.contains("Missing Values Handled : No Nulls"));
        assert!(text.contains("Rejections             : None"));
    }
}
