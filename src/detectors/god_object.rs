//! God object detection for class definitions.
//!
//! Size is the exact span of the class node (end line minus start line).
//! tree-sitter always records spans, so no estimate is ever needed; the
//! violation context says so through `loc_source = "span"`.

use crate::config::ConnascenceThresholds;
use crate::core::ast::{node_column, node_line, node_span_lines};
use crate::core::{ConnascenceType, Location, ParsedSource, Severity, Violation};
use tree_sitter::Node;

/// Methods defined directly in the class body, decorated ones included.
pub fn count_methods(class: &Node) -> usize {
    let Some(body) = class.child_by_field_name("body") else {
        return 0;
    };

    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|child| match child.kind() {
            "function_definition" => true,
            "decorated_definition" => child
                .child_by_field_name("definition")
                .is_some_and(|def| def.kind() == "function_definition"),
            _ => false,
        })
        .count()
}

/// Check a `class_definition` node.
pub fn check_class(
    class: &Node,
    parsed: &ParsedSource,
    thresholds: &ConnascenceThresholds,
) -> Option<Violation> {
    let method_count = count_methods(class);
    let lines_of_code = node_span_lines(class);
    if method_count <= thresholds.god_class_methods && lines_of_code <= thresholds.god_class_lines
    {
        return None;
    }

    let name = class
        .child_by_field_name("name")
        .map(|n| parsed.text(&n))
        .unwrap_or("<anonymous>");

    Some(
        Violation::builder(
            ConnascenceType::GodObject,
            Severity::Critical,
            Location::new(parsed.path(), node_line(class), node_column(class)),
        )
        .description(format!(
            "God Object: class '{name}' has {method_count} methods and {lines_of_code} lines"
        ))
        .recommendation(
            "Split into smaller, focused classes following Single Responsibility Principle",
        )
        .context("class_name", name)
        .context("method_count", method_count)
        .context("lines_of_code", lines_of_code)
        .context("loc_source", "span")
        .context("method_threshold", thresholds.god_class_methods)
        .context("loc_threshold", thresholds.god_class_lines)
        .build(),
    )
}
