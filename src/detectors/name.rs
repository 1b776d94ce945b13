//! Connascence of Name: identifiers many places depend on.

use crate::config::ConnascenceThresholds;
use crate::core::{ConnascenceType, Location, Severity, Violation};
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::Node;

/// References to one name: how many, and where the first one sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameUsage {
    pub count: usize,
    pub line: usize,
    pub column: usize,
}

impl NameUsage {
    pub fn first(line: usize, column: usize) -> Self {
        Self {
            count: 1,
            line,
            column,
        }
    }
}

/// Names that never count as coupling.
const IGNORED_NAMES: [&str; 2] = ["self", "cls"];

/// True when an `identifier` node is a use of a name rather than a
/// definition, parameter, attribute member, keyword or import.
pub fn is_reference(node: &Node) -> bool {
    if node.kind() != "identifier" {
        return false;
    }
    let Some(parent) = node.parent() else {
        return true;
    };
    let is_field = |field: &str| parent.child_by_field_name(field) == Some(*node);

    match parent.kind() {
        "function_definition" | "class_definition" => !is_field("name"),
        "parameters" | "lambda_parameters" | "typed_parameter" => false,
        "default_parameter" | "typed_default_parameter" => !is_field("name"),
        "list_splat_pattern" | "dictionary_splat_pattern" => !parent
            .parent()
            .is_some_and(|p| matches!(p.kind(), "parameters" | "lambda_parameters" | "typed_parameter")),
        "attribute" => !is_field("attribute"),
        "keyword_argument" => !is_field("name"),
        "dotted_name" | "aliased_import" | "global_statement" | "nonlocal_statement" => false,
        _ => true,
    }
}

/// One violation per name used more often than the threshold, sorted by name
/// and reported at the name's first reference.
pub fn check_name_usage(
    usage: &HashMap<String, NameUsage>,
    path: &Path,
    thresholds: &ConnascenceThresholds,
) -> Vec<Violation> {
    let mut heavy: Vec<(&String, &NameUsage)> = usage
        .iter()
        .filter(|(name, usage)| {
            usage.count > thresholds.high_name_usage_threshold
                && !IGNORED_NAMES.contains(&name.as_str())
                && !name.starts_with('_')
        })
        .collect();
    heavy.sort_by(|a, b| a.0.cmp(b.0));

    heavy
        .into_iter()
        .map(|(name, usage)| {
            let count = usage.count;
            Violation::builder(
                ConnascenceType::Name,
                Severity::Medium,
                Location::new(path, usage.line, usage.column),
            )
            .description(format!("Name '{name}' used {count} times (high coupling)"))
            .recommendation("Consider refactoring to reduce name dependencies")
            .context("name", name.clone())
            .context("usage_count", count)
            .build()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::{nodes_of_kind, parse};

    fn references(code: &str) -> Vec<String> {
        let parsed = parse(code);
        nodes_of_kind(&parsed, "identifier")
            .iter()
            .filter(|node| is_reference(node))
            .map(|node| parsed.text(node).to_string())
            .collect()
    }

    #[test]
    fn test_definitions_are_not_references() {
        let refs = references(
            "import os.path as p\nfrom x import y\ndef f(a, b=c, *args, **kw):\n    global g\n    return obj.attr(key=a)\n",
        );
        assert_eq!(refs, vec!["c", "obj", "a"]);
    }

    #[test]
    fn test_assignment_targets_are_references() {
        let refs = references("total = 0\ntotal += step\n");
        assert_eq!(refs, vec!["total", "total", "step"]);
    }

    #[test]
    fn test_threshold_and_exclusions() {
        let thresholds = ConnascenceThresholds::default();
        let usage: HashMap<String, NameUsage> = [
            ("zeta", 16, 4),
            ("alpha", 20, 2),
            ("self", 99, 1),
            ("_private", 99, 1),
            ("exact", 15, 1),
        ]
        .into_iter()
        .map(|(name, count, line)| {
            let usage = NameUsage {
                count,
                line,
                column: 0,
            };
            (name.to_string(), usage)
        })
        .collect();

        let violations = check_name_usage(&usage, Path::new("n.py"), &thresholds);
        let names: Vec<_> = violations
            .iter()
            .map(|v| v.context_value("name").unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        let lines: Vec<_> = violations.iter().map(|v| v.line()).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn test_names_sharing_a_long_prefix_keep_distinct_ids() {
        let thresholds = ConnascenceThresholds::default();
        let prefix = "configuration_parameter_registry_lookup_table";
        let usage: HashMap<String, NameUsage> = [
            (format!("{prefix}_alpha"), NameUsage { count: 16, line: 1, column: 0 }),
            (format!("{prefix}_omega"), NameUsage { count: 16, line: 2, column: 0 }),
        ]
        .into_iter()
        .collect();

        let violations = check_name_usage(&usage, Path::new("n.py"), &thresholds);
        assert_eq!(violations.len(), 2);
        assert_ne!(violations[0].id(), violations[1].id());
    }
}
