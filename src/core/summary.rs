//! Aggregate counts over a violation list.

use super::violation::{ConnascenceType, Severity, Violation};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Summary of a set of violations, grouped by type and severity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationSummary {
    pub total: usize,
    pub by_type: BTreeMap<ConnascenceType, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub total_weight: f64,
    pub average_weight: f64,
    pub files_affected: usize,
    /// Files that could not be analyzed (parse or processing errors)
    pub failed_files: Vec<String>,
}

impl ViolationSummary {
    pub fn from_violations(violations: &[Violation]) -> Self {
        let mut by_type: BTreeMap<ConnascenceType, usize> = BTreeMap::new();
        let mut by_severity: BTreeMap<Severity, usize> = BTreeMap::new();
        let mut files = BTreeSet::new();
        let mut failed = BTreeSet::new();

        for violation in violations {
            *by_type.entry(violation.kind()).or_insert(0) += 1;
            *by_severity.entry(violation.severity()).or_insert(0) += 1;
            files.insert(violation.file_path());
            if violation.kind().is_failure() {
                failed.insert(violation.file_path());
            }
        }

        let total = violations.len();
        let total_weight: f64 = violations.iter().map(Violation::weight).sum();
        let average_weight = if total == 0 {
            0.0
        } else {
            total_weight / total as f64
        };

        Self {
            total,
            by_type,
            by_severity,
            total_weight,
            average_weight,
            files_affected: files.len(),
            failed_files: failed.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn count_of(&self, kind: ConnascenceType) -> usize {
        self.by_type.get(&kind).copied().unwrap_or(0)
    }

    pub fn count_of_severity(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    pub fn report(&self) -> String {
        let mut report = format!(
            "{} violation(s) in {} file(s), average weight {:.2}\n",
            self.total, self.files_affected, self.average_weight
        );

        report.push_str("\nBy severity:\n");
        for (severity, count) in &self.by_severity {
            report.push_str(&format!("  {severity}: {count}\n"));
        }

        report.push_str("\nBy type:\n");
        for (kind, count) in &self.by_type {
            report.push_str(&format!("  {kind}: {count}\n"));
        }

        if !self.failed_files.is_empty() {
            report.push_str("\nNot analyzed:\n");
            for path in self.failed_files.iter().take(3) {
                report.push_str(&format!("    - {path}\n"));
            }
            if self.failed_files.len() > 3 {
                report.push_str(&format!(
                    "    ... and {} more\n",
                    self.failed_files.len() - 3
                ));
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::violation::Location;

    fn violation(kind: ConnascenceType, severity: Severity, path: &str, weight: f64) -> Violation {
        Violation::builder(kind, severity, Location::new(path, 1, 0))
            .weight(weight)
            .build()
    }

    #[test]
    fn test_empty_summary() {
        let summary = ViolationSummary::from_violations(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_weight, 0.0);
        assert!(summary.failed_files.is_empty());
    }

    #[test]
    fn test_counts_match_input() {
        let violations = vec![
            violation(ConnascenceType::Meaning, Severity::High, "a.py", 1.0),
            violation(ConnascenceType::Meaning, Severity::Low, "a.py", 2.0),
            violation(ConnascenceType::ParseError, Severity::Critical, "b.py", 3.0),
        ];
        let summary = ViolationSummary::from_violations(&violations);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.count_of(ConnascenceType::Meaning), 2);
        assert_eq!(summary.count_of(ConnascenceType::Name), 0);
        assert_eq!(summary.count_of_severity(Severity::Critical), 1);
        assert_eq!(summary.total_weight, 6.0);
        assert_eq!(summary.average_weight, 2.0);
        assert_eq!(summary.files_affected, 2);
        assert_eq!(summary.failed_files, vec!["b.py".to_string()]);
        assert!(summary.report().contains("b.py"));
    }
}
