//! Connascence of Meaning: magic literals.
//!
//! Numbers and strings embedded in code force every reader and every other
//! use site to agree on what the value means. Severity depends on the line
//! the literal sits on.

use crate::config::ConnascenceThresholds;
use crate::core::ast::{node_column, node_line};
use crate::core::{ConnascenceType, Location, ParsedSource, Severity, Violation};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tree_sitter::Node;

/// Strings that look like identifiers or keys are not magic.
static IDENTIFIER_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid identifier regex"));

static CONDITIONAL_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:if|elif|while|assert)\s").expect("valid keyword regex"));

const COMPARISON_OPERATORS: [&str; 6] = ["==", "!=", "<", ">", "<=", ">="];
const NON_ASSIGNMENT_OPERATORS: [&str; 4] = ["==", "!=", "<=", ">="];
const ARITHMETIC_OPERATORS: [&str; 5] = ["+", "-", "*", "/", "%"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralKind {
    Int,
    Float,
    Complex,
    Str,
}

impl LiteralKind {
    fn as_str(&self) -> &'static str {
        match self {
            LiteralKind::Int => "int",
            LiteralKind::Float => "float",
            LiteralKind::Complex => "complex",
            LiteralKind::Str => "str",
        }
    }

    fn is_number(&self) -> bool {
        !matches!(self, LiteralKind::Str)
    }
}

/// A literal that survived the allow-lists.
struct MagicLiteral<'tree> {
    /// Node the violation is reported at (the unary minus for negatives)
    anchor: Node<'tree>,
    display: String,
    value: Value,
    kind: LiteralKind,
}

#[derive(Debug, Default)]
struct LineContext {
    in_conditional: bool,
    in_comparison: bool,
    in_assignment: bool,
    in_arithmetic: bool,
    security_related: bool,
}

/// Check an `integer`, `float` or `string` node.
pub fn check_literal(
    node: &Node,
    parsed: &ParsedSource,
    thresholds: &ConnascenceThresholds,
) -> Option<Violation> {
    let literal = match node.kind() {
        "integer" | "float" => magic_number(node, parsed, thresholds)?,
        "string" => magic_string(node, parsed, thresholds)?,
        _ => return None,
    };
    Some(build_violation(literal, parsed, thresholds))
}

fn magic_number<'tree>(
    node: &Node<'tree>,
    parsed: &ParsedSource,
    thresholds: &ConnascenceThresholds,
) -> Option<MagicLiteral<'tree>> {
    let negation = node.parent().filter(|parent| {
        parent.kind() == "unary_operator"
            && parent
                .child_by_field_name("operator")
                .is_some_and(|op| op.kind() == "-")
            && parent.child_by_field_name("argument") == Some(*node)
    });

    let text = parsed.text(node);
    let kind = if text.ends_with(['j', 'J']) {
        LiteralKind::Complex
    } else if node.kind() == "float" {
        LiteralKind::Float
    } else {
        LiteralKind::Int
    };

    let sign = if negation.is_some() { -1.0 } else { 1.0 };
    let number = parse_number(text).map(|n| n * sign);
    if number.is_some_and(|n| thresholds.is_allowed_number(n)) {
        return None;
    }

    let display = if negation.is_some() {
        format!("-{text}")
    } else {
        text.to_string()
    };
    let value = match (kind, number) {
        (LiteralKind::Int, Some(n)) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            Value::from(n as i64)
        }
        (LiteralKind::Float, Some(n)) => Value::from(n),
        _ => Value::from(display.clone()),
    };

    Some(MagicLiteral {
        anchor: negation.unwrap_or(*node),
        display,
        value,
        kind,
    })
}

fn magic_string<'tree>(
    node: &Node<'tree>,
    parsed: &ParsedSource,
    thresholds: &ConnascenceThresholds,
) -> Option<MagicLiteral<'tree>> {
    if is_bare_string_statement(node) {
        return None;
    }

    let start = node.child(0).filter(|c| c.kind() == "string_start")?;
    let end = node.child(node.child_count().checked_sub(1)?)
        .filter(|c| c.kind() == "string_end")?;

    let prefix = parsed
        .text(&start)
        .trim_end_matches(['"', '\''])
        .to_ascii_lowercase();
    if prefix.contains('b') || prefix.contains('f') {
        return None;
    }

    let raw = parsed.source().get(start.end_byte()..end.start_byte())?;
    let value = if prefix.contains('r') {
        raw.to_string()
    } else {
        unescape(raw)
    };

    if thresholds.is_allowed_string(&value)
        || value.chars().count() < thresholds.min_string_length
        || IDENTIFIER_LIKE.is_match(&value)
    {
        return None;
    }

    Some(MagicLiteral {
        anchor: *node,
        display: value.clone(),
        value: Value::from(value),
        kind: LiteralKind::Str,
    })
}

/// A string that forms a whole statement on its own (docstrings and
/// string "comments").
fn is_bare_string_statement(node: &Node) -> bool {
    let mut current = *node;
    if let Some(parent) = current.parent().filter(|p| p.kind() == "concatenated_string") {
        current = parent;
    }
    current
        .parent()
        .is_some_and(|p| p.kind() == "expression_statement" && p.named_child_count() == 1)
}

fn parse_number(text: &str) -> Option<f64> {
    let cleaned = text.replace('_', "").to_ascii_lowercase();
    let cleaned = cleaned.strip_suffix('l').unwrap_or(&cleaned);
    if cleaned.ends_with('j') {
        return None;
    }

    let radix = [("0x", 16), ("0o", 8), ("0b", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| cleaned.strip_prefix(prefix).map(|digits| (digits, radix)));

    match radix {
        Some((digits, radix)) => i64::from_str_radix(digits, radix).ok().map(|n| n as f64),
        None => cleaned.parse::<f64>().ok(),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn line_context(
    parsed: &ParsedSource,
    line: usize,
    thresholds: &ConnascenceThresholds,
) -> LineContext {
    let Some(line_text) = parsed.line(line) else {
        return LineContext::default();
    };
    // A return annotation arrow is neither a comparison nor a subtraction.
    let content = line_text.replace("->", " ");
    let content = content.as_str();

    let window = thresholds.security_context_lines;
    let surrounding = parsed
        .lines_between(line.saturating_sub(window), line + window)
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();

    LineContext {
        in_conditional: CONDITIONAL_KEYWORD.is_match(content),
        in_comparison: COMPARISON_OPERATORS.iter().any(|op| content.contains(op)),
        in_assignment: content.contains('=')
            && !NON_ASSIGNMENT_OPERATORS.iter().any(|op| content.contains(op)),
        in_arithmetic: ARITHMETIC_OPERATORS.iter().any(|op| content.contains(op)),
        security_related: thresholds
            .security_keywords
            .iter()
            .any(|keyword| surrounding.contains(&keyword.to_lowercase())),
    }
}

fn severity_for(context: &LineContext) -> Severity {
    if context.security_related {
        Severity::Critical
    } else if context.in_conditional || context.in_comparison {
        Severity::High
    } else if context.in_assignment {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn recommendation_for(literal: &MagicLiteral, context: &LineContext) -> String {
    if context.security_related {
        "Move security-related constants to configuration or environment variables".to_string()
    } else if literal.kind.is_number() && context.in_conditional {
        format!(
            "Replace {} with a named constant (e.g., MAX_VALUE, THRESHOLD)",
            literal.display
        )
    } else if literal.kind.is_number() {
        format!("Replace {} with a descriptive constant name", literal.display)
    } else {
        "Replace string literal with a named constant or configuration value".to_string()
    }
}

fn build_violation(
    literal: MagicLiteral,
    parsed: &ParsedSource,
    thresholds: &ConnascenceThresholds,
) -> Violation {
    let line = node_line(&literal.anchor);
    let context = line_context(parsed, line, thresholds);

    Violation::builder(
        ConnascenceType::Meaning,
        severity_for(&context),
        Location::new(parsed.path(), line, node_column(&literal.anchor)),
    )
    .description(format!(
        "Magic literal '{}' should be a named constant",
        literal.display
    ))
    .recommendation(recommendation_for(&literal, &context))
    .context("literal_value", literal.value)
    .context("literal_type", literal.kind.as_str())
    .context("in_conditional", context.in_conditional)
    .context("in_comparison", context.in_comparison)
    .context("in_assignment", context.in_assignment)
    .context("in_arithmetic", context.in_arithmetic)
    .context("security_related", context.security_related)
    .build()
}
