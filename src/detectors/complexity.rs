//! Connascence of Algorithm through complexity: cyclomatic complexity and
//! nesting depth, both accumulated with counters during the single tree
//! traversal.

use crate::config::ConnascenceThresholds;
use crate::core::{ConnascenceType, Location, ParsedSource, Severity, Violation};
use tree_sitter::Node;

/// Running complexity counters for one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionComplexity {
    pub name: String,
    pub line: usize,
    pub column: usize,
    pub cyclomatic: usize,
    pub depth: usize,
    pub max_depth: usize,
}

impl FunctionComplexity {
    pub fn new(name: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            name: name.into(),
            line,
            column,
            cyclomatic: 1,
            depth: 0,
            max_depth: 0,
        }
    }

    pub fn enter_block(&mut self) {
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
    }

    pub fn leave_block(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// Decision points a node adds to the enclosing functions.
///
/// Each `boolean_operator` node joins exactly two operands, so an N-way
/// `and`/`or` chain contributes N-1.
pub fn complexity_increment(node: &Node) -> usize {
    match node.kind() {
        "if_statement" | "elif_clause" | "for_statement" | "while_statement"
        | "except_clause" | "except_group_clause" | "case_clause" | "boolean_operator" => 1,
        // Comprehension filters: `[x for x in xs if x]`
        "if_clause" => 1,
        _ => 0,
    }
}

/// Statements that open a new nesting level.
pub fn is_nesting_node(node: &Node) -> bool {
    matches!(
        node.kind(),
        "if_statement"
            | "for_statement"
            | "while_statement"
            | "try_statement"
            | "with_statement"
            | "match_statement"
    )
}

/// Violations for a function whose body has been fully traversed.
pub fn check_function(
    function: &FunctionComplexity,
    parsed: &ParsedSource,
    thresholds: &ConnascenceThresholds,
) -> Vec<Violation> {
    let location = || Location::new(parsed.path(), function.line, function.column);
    let mut violations = Vec::new();

    if function.cyclomatic > thresholds.max_cyclomatic_complexity {
        let complexity = function.cyclomatic;
        violations.push(
            Violation::builder(
                ConnascenceType::Algorithm,
                complexity_severity(complexity),
                location(),
            )
            .description(format!(
                "Function '{}' has high cyclomatic complexity ({})",
                function.name, complexity
            ))
            .recommendation(complexity_recommendation(complexity))
            .context("function_name", function.name.clone())
            .context("complexity", complexity)
            .context("threshold", thresholds.max_cyclomatic_complexity)
            .context("issue_type", "cyclomatic_complexity")
            .build(),
        );
    }

    if function.max_depth > thresholds.max_nesting_depth {
        violations.push(
            Violation::builder(ConnascenceType::Algorithm, Severity::High, location())
                .description(format!(
                    "Function '{}' has excessive nesting depth ({})",
                    function.name, function.max_depth
                ))
                .recommendation(
                    "Break down nested logic into smaller functions or use early returns",
                )
                .context("function_name", function.name.clone())
                .context("nesting_depth", function.max_depth)
                .context("threshold", thresholds.max_nesting_depth)
                .context("issue_type", "nesting_depth")
                .build(),
        );
    }

    violations
}

fn complexity_severity(complexity: usize) -> Severity {
    if complexity > 20 {
        Severity::Critical
    } else if complexity > 15 {
        Severity::High
    } else {
        Severity::Medium
    }
}

fn complexity_recommendation(complexity: usize) -> &'static str {
    if complexity > 20 {
        "This function is extremely complex. Consider major refactoring into multiple smaller functions"
    } else if complexity > 15 {
        "Break down function into smaller, focused functions with clear responsibilities"
    } else {
        "Simplify conditional logic and reduce branching complexity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::{nodes_of_kind, parse};

    fn total_increment(code: &str) -> usize {
        let parsed = parse(code);
        let kinds = [
            "if_statement",
            "elif_clause",
            "for_statement",
            "while_statement",
            "except_clause",
            "case_clause",
            "boolean_operator",
            "if_clause",
            "conditional_expression",
            "for_in_clause",
        ];
        kinds
            .iter()
            .flat_map(|kind| nodes_of_kind(&parsed, kind))
            .map(|node| complexity_increment(&node))
            .sum()
    }

    #[test]
    fn test_branch_counting() {
        let code = concat!(
            "def f(x):\n",
            "    if x and y and z:\n",
            "        pass\n",
            "    elif x:\n",
            "        pass\n",
            "    for i in x:\n",
            "        pass\n",
            "    try:\n",
            "        pass\n",
            "    except ValueError:\n",
            "        pass\n",
            "    return [a for a in x if a] or (1 if x else 2)\n",
        );
        // if, 2 x and, elif, for, except, comprehension if, or
        assert_eq!(total_increment(code), 8);
    }

    #[test]
    fn test_nesting_counters() {
        let mut function = FunctionComplexity::new("f", 1, 0);
        function.enter_block();
        function.enter_block();
        function.leave_block();
        function.enter_block();
        assert_eq!(function.depth, 2);
        assert_eq!(function.max_depth, 2);
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let parsed = parse("pass\n");
        let thresholds = ConnascenceThresholds::default();
        let mut function = FunctionComplexity::new("f", 1, 0);
        function.cyclomatic = thresholds.max_cyclomatic_complexity;
        function.max_depth = thresholds.max_nesting_depth;
        assert!(check_function(&function, &parsed, &thresholds).is_empty());

        function.cyclomatic += 1;
        function.max_depth += 1;
        let violations = check_function(&function, &parsed, &thresholds);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].severity(), Severity::Medium);
        assert_eq!(violations[1].severity(), Severity::High);
    }

    #[test]
    fn test_complexity_severity_bands() {
        assert_eq!(complexity_severity(16), Severity::High);
        assert_eq!(complexity_severity(21), Severity::Critical);
    }
}
