//! Duplicate algorithm detection.
//!
//! Every function body is reduced to an ordered sequence of statement tokens
//! (statement kind plus a few structural discriminators, nested blocks
//! included) and hashed. Functions sharing a hash are grouped in one pass;
//! the first in traversal order is the original.

use crate::config::ConnascenceThresholds;
use crate::core::{ConnascenceType, Location, Severity, Violation};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::Node;
use xxhash_rust::xxh64::Xxh64;

/// Normalized structure of one function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionShape {
    pub hash: u64,
    pub statement_count: usize,
}

/// A function registered during traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCandidate {
    pub name: String,
    pub line: usize,
    pub column: usize,
    pub shape: FunctionShape,
}

enum Work<'tree> {
    Block(Node<'tree>),
    Statement(Node<'tree>),
    Marker(&'static str),
}

/// Shape of a `function_definition` node with `parameter_count` parameters.
pub fn function_shape(function: &Node, parameter_count: usize) -> Option<FunctionShape> {
    let body = function.child_by_field_name("body")?;

    let mut hasher = Xxh64::new(0);
    hasher.update(format!("params:{parameter_count}").as_bytes());

    let mut statement_count = 0;
    let mut stack = vec![Work::Block(body)];
    while let Some(work) = stack.pop() {
        match work {
            Work::Block(block) => {
                let mut cursor = block.walk();
                let statements: Vec<Node> = block
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() != "comment")
                    .collect();
                stack.extend(statements.into_iter().rev().map(Work::Statement));
            }
            Work::Statement(statement) => {
                let (token, nested) = normalize_statement(&statement);
                push_token(&mut hasher, &token);
                statement_count += 1;
                stack.extend(nested.into_iter().rev());
            }
            Work::Marker(marker) => {
                push_token(&mut hasher, marker);
                statement_count += 1;
            }
        }
    }

    Some(FunctionShape {
        hash: hasher.digest(),
        statement_count,
    })
}

fn push_token(hasher: &mut Xxh64, token: &str) {
    hasher.update(b"|");
    hasher.update(token.as_bytes());
}

/// Token for one statement plus the work for its nested blocks, in order.
fn normalize_statement<'tree>(statement: &Node<'tree>) -> (String, Vec<Work<'tree>>) {
    let mut nested = Vec::new();
    let body = |node: &Node<'tree>, field: &str| node.child_by_field_name(field).map(Work::Block);

    let token = match statement.kind() {
        "return_statement" => {
            if statement.named_child_count() > 0 {
                "return_value".to_string()
            } else {
                "return".to_string()
            }
        }
        "if_statement" => {
            nested.extend(body(statement, "consequence"));
            let mut cursor = statement.walk();
            let alternatives: Vec<Node> = statement
                .children_by_field_name("alternative", &mut cursor)
                .collect();
            for alternative in &alternatives {
                match alternative.kind() {
                    "elif_clause" => {
                        nested.push(Work::Marker("elif"));
                        nested.extend(body(alternative, "consequence"));
                    }
                    _ => {
                        nested.push(Work::Marker("else"));
                        nested.extend(body(alternative, "body"));
                    }
                }
            }
            format!("if_{}", !alternatives.is_empty())
        }
        kind @ ("for_statement" | "while_statement") => {
            nested.extend(body(statement, "body"));
            if let Some(alternative) = statement.child_by_field_name("alternative") {
                nested.push(Work::Marker("else"));
                nested.extend(body(&alternative, "body"));
            }
            kind.trim_end_matches("_statement").to_string()
        }
        "try_statement" => {
            nested.extend(body(statement, "body"));
            let mut handlers = 0;
            let mut cursor = statement.walk();
            for clause in statement.named_children(&mut cursor) {
                let marker = match clause.kind() {
                    "except_clause" | "except_group_clause" => {
                        handlers += 1;
                        "except"
                    }
                    "else_clause" => "else",
                    "finally_clause" => "finally",
                    _ => continue,
                };
                nested.push(Work::Marker(marker));
                nested.extend(first_block(&clause).map(Work::Block));
            }
            format!("try_{handlers}")
        }
        "with_statement" => {
            nested.extend(body(statement, "body"));
            let mut cursor = statement.walk();
            let items = statement
                .named_children(&mut cursor)
                .find(|n| n.kind() == "with_clause")
                .map(|clause| {
                    let mut cursor = clause.walk();
                    let count = clause
                        .named_children(&mut cursor)
                        .filter(|n| n.kind() == "with_item")
                        .count();
                    count
                })
                .unwrap_or(0);
            format!("with_{items}")
        }
        "expression_statement" => match statement.named_child(0) {
            Some(expr) if expr.kind() == "assignment" => {
                format!("assign_{}", assignment_targets(&expr))
            }
            Some(expr) if expr.kind() == "augmented_assignment" => "augassign".to_string(),
            Some(expr) if expr.kind() == "call" => "call".to_string(),
            _ => "expr".to_string(),
        },
        "raise_statement" => "raise".to_string(),
        other => other.to_string(),
    };

    (token, nested)
}

/// Targets of a chained assignment `a = b = value`.
fn assignment_targets(assignment: &Node) -> usize {
    let mut targets = 1;
    let mut current = *assignment;
    while let Some(right) = current
        .child_by_field_name("right")
        .filter(|r| r.kind() == "assignment")
    {
        targets += 1;
        current = right;
    }
    targets
}

fn first_block<'tree>(clause: &Node<'tree>) -> Option<Node<'tree>> {
    let mut cursor = clause.walk();
    let block = clause
        .named_children(&mut cursor)
        .find(|n| n.kind() == "block");
    block
}

/// Report every function whose shape repeats an earlier one.
pub fn find_duplicates(
    candidates: &[DuplicateCandidate],
    path: &Path,
    thresholds: &ConnascenceThresholds,
) -> Vec<Violation> {
    let eligible: Vec<&DuplicateCandidate> = candidates
        .iter()
        .filter(|c| c.shape.statement_count >= thresholds.duplicate_statement_minimum)
        .collect();

    let mut group_sizes: HashMap<u64, usize> = HashMap::new();
    for candidate in &eligible {
        *group_sizes.entry(candidate.shape.hash).or_insert(0) += 1;
    }

    let mut originals: HashMap<u64, &DuplicateCandidate> = HashMap::new();
    let mut violations = Vec::new();
    for candidate in eligible {
        match originals.entry(candidate.shape.hash) {
            Entry::Vacant(slot) => {
                slot.insert(candidate);
            }
            Entry::Occupied(slot) => {
                let original = *slot.get();
                violations.push(duplicate_violation(
                    candidate,
                    original,
                    group_sizes[&candidate.shape.hash],
                    path,
                ));
            }
        }
    }
    violations
}

fn duplicate_violation(
    duplicate: &DuplicateCandidate,
    original: &DuplicateCandidate,
    group_size: usize,
    path: &Path,
) -> Violation {
    Violation::builder(
        ConnascenceType::Algorithm,
        Severity::Medium,
        Location::new(path, duplicate.line, duplicate.column),
    )
    .description(format!(
        "Function '{}' duplicates algorithm from '{}'",
        duplicate.name, original.name
    ))
    .recommendation("Extract common algorithm into shared function or module")
    .context("function_name", duplicate.name.clone())
    .context("similar_function", original.name.clone())
    .context("original_line", original.line)
    .context("duplicate_count", group_size)
    .context("statement_count", duplicate.shape.statement_count)
    .context("signature", format!("{:016x}", duplicate.shape.hash))
    .context("issue_type", "code_duplication")
    .build()
}
