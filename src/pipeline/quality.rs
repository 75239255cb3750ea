//! Run-level quality assessment.
//!
//! Folds what reconciliation and normalization reported into a flat issue
//! list with severities, so the run report and the logs agree on what went
//! wrong and how much it matters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pipeline::normalize::NormalizeReport;
use crate::pipeline::reconcile::SchemaReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Routine coercion, counted but not worth a warning.
    Info,
    /// The run proceeded on an approximation the operator should know about.
    Warning,
    /// Output is structurally suspect (required data was absent).
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,
    /// Column the issue is about, when there is one.
    pub column: Option<String>,
    pub description: String,
}

impl QualityIssue {
    fn new(severity: Severity, column: Option<&str>, description: String) -> Self {
        QualityIssue {
            severity,
            column: column.map(str::to_string),
            description,
        }
    }
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

/// Assess one run from its stage reports.
pub fn assess(
    prices_schema: &SchemaReport,
    revenue_schema: &SchemaReport,
    normalize: &NormalizeReport,
) -> Vec<QualityIssue> {
    let mut issues = Vec::new();
    schema_issues(&mut issues, "price", prices_schema);
    schema_issues(&mut issues, "revenue", revenue_schema);

    for warning in &normalize.warnings {
        issues.push(QualityIssue::new(Severity::Warning, None, warning.clone()));
    }
    if normalize.currency_fallbacks > 0 {
        issues.push(QualityIssue::new(
            Severity::Info,
            None,
            format!(
                "{} currency cells failed to parse and were read as 0",
                normalize.currency_fallbacks
            ),
        ));
    }
    if normalize.rank_fallbacks > 0 {
        issues.push(QualityIssue::new(
            Severity::Info,
            None,
            format!(
                "{} rank cells failed to parse and were read as the out-of-range sentinel",
                normalize.rank_fallbacks
            ),
        ));
    }

    issues
}

fn schema_issues(issues: &mut Vec<QualityIssue>, sheet: &str, report: &SchemaReport) {
    for column in &report.missing_required {
        issues.push(QualityIssue::new(
            Severity::Error,
            Some(column),
            format!(
                "{} sheet: required column '{}' missing after reconciliation; filled with defaults",
                sheet, column
            ),
        ));
    }
    for column in &report.synthesized {
        if report.missing_required.contains(column) {
            continue;
        }
        issues.push(QualityIssue::new(
            Severity::Warning,
            Some(column),
            format!(
                "{} sheet: optional column '{}' synthesized with defaults",
                sheet, column
            ),
        ));
    }
    for (alias, canonical) in &report.renamed {
        issues.push(QualityIssue::new(
            Severity::Info,
            Some(canonical),
            format!("{} sheet: column '{}' read as '{}'", sheet, alias, canonical),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_column_is_an_error() {
        let schema = SchemaReport {
            missing_required: vec!["Sku".to_string()],
            synthesized: vec!["Sku".to_string()],
            ..SchemaReport::default()
        };
        let issues = assess(&schema, &SchemaReport::default(), &NormalizeReport::default());

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].column.as_deref(), Some("Sku"));
    }

    #[test]
    fn synthesized_optional_column_is_a_warning() {
        let schema = SchemaReport {
            synthesized: vec!["Rank".to_string()],
            ..SchemaReport::default()
        };
        let issues = assess(&schema, &SchemaReport::default(), &NormalizeReport::default());
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn fallback_counts_map_to_info() {
        let normalize = NormalizeReport {
            records_in: 10,
            currency_fallbacks: 3,
            rank_fallbacks: 1,
            ..NormalizeReport::default()
        };
        let issues = assess(&SchemaReport::default(), &SchemaReport::default(), &normalize);

        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == Severity::Info));
        assert!(issues[0].description.contains("3 currency cells"));
    }

    #[test]
    fn date_fallback_warning_passes_through() {
        let normalize = NormalizeReport {
            warnings: vec!["price sheet has no date column".to_string()],
            ..NormalizeReport::default()
        };
        let issues = assess(&SchemaReport::default(), &SchemaReport::default(), &normalize);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn severities_order_for_filtering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }
}
