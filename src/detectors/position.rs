//! Connascence of Position: callers must agree on argument order.

use crate::config::ConnascenceThresholds;
use crate::core::ast::{node_column, node_line};
use crate::core::{
    ConnascenceType, FunctionSignature, Location, Parameter, ParsedSource, Severity, Violation,
};
use serde_json::Value;
use tree_sitter::Node;

/// Positional parameter count above which a violation is critical.
const CRITICAL_PARAMETER_COUNT: usize = 7;

/// Signature checks for one function definition.
///
/// `in_class` tells whether the innermost enclosing scope is a class, in
/// which case the first positional parameter is the implicit receiver
/// (unless the function is a `@staticmethod`).
pub fn check_signature(
    signature: &FunctionSignature,
    in_class: bool,
    parsed: &ParsedSource,
    thresholds: &ConnascenceThresholds,
) -> Vec<Violation> {
    let is_method = signature.is_method(in_class);
    let receiver_skip = usize::from(is_method);
    let positional: Vec<&Parameter> = signature.positional().skip(receiver_skip).collect();

    let mut violations = Vec::new();
    violations.extend(check_parameter_count(
        signature,
        &positional,
        is_method,
        parsed,
        thresholds,
    ));
    violations.extend(check_flag_arguments(signature, &positional, parsed));
    violations.extend(check_parameter_names(signature, parsed, thresholds));
    violations.extend(check_parameter_order(signature, &positional, parsed));
    violations
}

fn check_parameter_count(
    signature: &FunctionSignature,
    positional: &[&Parameter],
    is_method: bool,
    parsed: &ParsedSource,
    thresholds: &ConnascenceThresholds,
) -> Option<Violation> {
    let count = positional.len();
    if count <= thresholds.max_positional_params {
        return None;
    }

    let severity = if count > CRITICAL_PARAMETER_COUNT {
        Severity::Critical
    } else {
        Severity::High
    };
    let names: Vec<Value> = positional
        .iter()
        .map(|p| Value::from(p.name.clone()))
        .collect();

    Some(
        Violation::builder(
            ConnascenceType::Position,
            severity,
            Location::new(parsed.path(), signature.line, signature.column),
        )
        .description(format!(
            "Function '{}' has {} positional parameters (>{})",
            signature.name, count, thresholds.max_positional_params
        ))
        .recommendation(count_recommendation(count))
        .context("function_name", signature.name.clone())
        .context("parameter_count", count)
        .context("parameter_names", names)
        .context("is_method", is_method)
        .context("has_varargs", signature.has_varargs())
        .context("has_kwargs", signature.has_kwargs())
        .build(),
    )
}

fn count_recommendation(count: usize) -> &'static str {
    if count > 6 {
        "Consider using a data class, named tuple, or configuration object to group related parameters"
    } else if count > 4 {
        "Use keyword arguments or consider parameter objects for better maintainability"
    } else {
        "Consider using keyword arguments or grouping related parameters"
    }
}

fn check_flag_arguments(
    signature: &FunctionSignature,
    positional: &[&Parameter],
    parsed: &ParsedSource,
) -> Vec<Violation> {
    positional
        .iter()
        .filter(|p| p.bool_default)
        .map(|p| {
            Violation::builder(
                ConnascenceType::Position,
                Severity::Medium,
                Location::new(parsed.path(), p.line, p.column),
            )
            .description(format!(
                "Boolean parameter '{}' in function '{}' creates positional coupling",
                p.name, signature.name
            ))
            .recommendation("Consider using keyword-only arguments or enum/string constants")
            .context("function_name", signature.name.clone())
            .context("parameter_name", p.name.clone())
            .context("issue_type", "boolean_flag")
            .build()
        })
        .collect()
}

fn check_parameter_names(
    signature: &FunctionSignature,
    parsed: &ParsedSource,
    thresholds: &ConnascenceThresholds,
) -> Vec<Violation> {
    signature
        .parameters
        .iter()
        .filter(|p| p.name.chars().count() > thresholds.max_param_name_length)
        .map(|p| {
            let length = p.name.chars().count();
            Violation::builder(
                ConnascenceType::Position,
                Severity::Low,
                Location::new(parsed.path(), p.line, p.column),
            )
            .description(format!(
                "Parameter '{}' has excessive name length ({} chars)",
                p.name, length
            ))
            .recommendation("Use shorter, more concise parameter names")
            .context("function_name", signature.name.clone())
            .context("parameter_name", p.name.clone())
            .context("name_length", length)
            .context("issue_type", "long_name")
            .build()
        })
        .collect()
}

fn check_parameter_order(
    signature: &FunctionSignature,
    positional: &[&Parameter],
    parsed: &ParsedSource,
) -> Vec<Violation> {
    let Some(first_optional) = positional.iter().position(|p| p.has_default) else {
        return Vec::new();
    };

    positional[first_optional..]
        .iter()
        .filter(|p| !p.has_default)
        .map(|p| {
            Violation::builder(
                ConnascenceType::Position,
                Severity::Medium,
                Location::new(parsed.path(), p.line, p.column),
            )
            .description(format!(
                "Required parameter '{}' follows optional parameters in '{}'",
                p.name, signature.name
            ))
            .recommendation("Place required parameters before optional ones")
            .context("function_name", signature.name.clone())
            .context("parameter_name", p.name.clone())
            .context("issue_type", "parameter_ordering")
            .build()
        })
        .collect()
}

/// Check a `call` node for too many positional arguments.
pub fn check_call(
    node: &Node,
    parsed: &ParsedSource,
    thresholds: &ConnascenceThresholds,
) -> Option<Violation> {
    let arguments = node
        .child_by_field_name("arguments")
        .filter(|args| args.kind() == "argument_list")?;

    let mut cursor = arguments.walk();
    let count = arguments
        .named_children(&mut cursor)
        .filter(|arg| {
            !matches!(
                arg.kind(),
                "keyword_argument" | "dictionary_splat" | "comment"
            )
        })
        .count();
    if count <= thresholds.max_call_args {
        return None;
    }

    let callee = call_name(node, parsed);
    Some(
        Violation::builder(
            ConnascenceType::Position,
            Severity::Medium,
            Location::new(parsed.path(), node_line(node), node_column(node)),
        )
        .description(format!(
            "Function call with {} positional arguments (>{})",
            count, thresholds.max_call_args
        ))
        .recommendation("Use keyword arguments for better readability and maintainability")
        .context("argument_count", count)
        .context("function_name", callee)
        .context("issue_type", "excessive_call_args")
        .build(),
    )
}

fn call_name(node: &Node, parsed: &ParsedSource) -> String {
    let Some(function) = node.child_by_field_name("function") else {
        return "unknown".to_string();
    };
    match function.kind() {
        "identifier" => parsed.text(&function).to_string(),
        "attribute" => function
            .child_by_field_name("attribute")
            .map(|attr| parsed.text(&attr).to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        _ => "unknown".to_string(),
    }
}
