//! Parsed Python source and small helpers over tree-sitter nodes.

use std::path::{Path, PathBuf};
use tree_sitter::{Node, Tree};

/// An immutable, successfully parsed source file.
#[derive(Debug, Clone)]
pub struct ParsedSource {
    path: PathBuf,
    tree: Tree,
    source: String,
    line_starts: Vec<usize>,
}

impl ParsedSource {
    pub(crate) fn new(path: PathBuf, tree: Tree, source: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            path,
            tree,
            source,
            line_starts,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Text covered by `node`.
    pub fn text(&self, node: &Node) -> &str {
        node_text(node, &self.source)
    }

    /// Number of lines in the file, as `str::lines` counts them.
    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }

    /// The 1-based `line` without its terminator.
    pub fn line(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.source.len());
        self.source
            .get(start..end)
            .map(|text| text.strip_suffix('\r').unwrap_or(text))
    }

    /// Lines `from..=to` (1-based, clamped to the file).
    pub fn lines_between(&self, from: usize, to: usize) -> impl Iterator<Item = &str> {
        (from.max(1)..=to).map_while(move |line| self.line(line))
    }
}

/// Get text for a tree-sitter node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Get the line number for a tree-sitter node (1-indexed)
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Get the byte column for a tree-sitter node (0-indexed)
pub fn node_column(node: &Node) -> usize {
    node.start_position().column
}

/// Lines spanned by a node, end row minus start row.
pub fn node_span_lines(node: &Node) -> usize {
    node.end_position().row - node.start_position().row
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Positional,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    pub has_default: bool,
    /// Default value is the literal `True` or `False`
    pub bool_default: bool,
    pub annotated: bool,
    pub line: usize,
    pub column: usize,
}

/// Signature facts of a `function_definition` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub line: usize,
    pub column: usize,
    pub parameters: Vec<Parameter>,
    pub decorators: Vec<String>,
    pub has_return_annotation: bool,
}

impl FunctionSignature {
    /// Extract the signature of a `function_definition` node.
    pub fn from_node(node: &Node, source: &str) -> Option<Self> {
        if node.kind() != "function_definition" {
            return None;
        }
        let name = node_text(&node.child_by_field_name("name")?, source).to_string();
        let parameters = node
            .child_by_field_name("parameters")
            .map(|params| collect_parameters(&params, source))
            .unwrap_or_default();

        Some(Self {
            name,
            line: node_line(node),
            column: node_column(node),
            parameters,
            decorators: decorators_of(node, source),
            has_return_annotation: node.child_by_field_name("return_type").is_some(),
        })
    }

    pub fn positional(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(|p| p.kind == ParameterKind::Positional)
    }

    pub fn has_varargs(&self) -> bool {
        self.parameters
            .iter()
            .any(|p| p.kind == ParameterKind::VarPositional)
    }

    pub fn has_kwargs(&self) -> bool {
        self.parameters
            .iter()
            .any(|p| p.kind == ParameterKind::VarKeyword)
    }

    pub fn has_decorator(&self, name: &str) -> bool {
        self.decorators.iter().any(|d| d == name)
    }

    /// Whether the first positional parameter is an implicit receiver,
    /// given that the innermost enclosing scope is (or is not) a class.
    pub fn is_method(&self, in_class: bool) -> bool {
        in_class && !self.has_decorator("staticmethod")
    }

    pub fn is_public(&self) -> bool {
        !self.name.starts_with('_')
    }
}

/// Decorator expressions applied to a definition, without the leading `@`.
pub fn decorators_of(definition: &Node, source: &str) -> Vec<String> {
    let Some(parent) = definition
        .parent()
        .filter(|p| p.kind() == "decorated_definition")
    else {
        return Vec::new();
    };

    let mut cursor = parent.walk();
    parent
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "decorator")
        .map(|decorator| {
            node_text(&decorator, source)
                .trim_start_matches('@')
                .trim()
                .to_string()
        })
        .collect()
}

fn collect_parameters(params: &Node, source: &str) -> Vec<Parameter> {
    let mut parameters = Vec::new();
    let mut keyword_only = false;
    let mut cursor = params.walk();

    for child in params.named_children(&mut cursor) {
        let plain_kind = if keyword_only {
            ParameterKind::KeywordOnly
        } else {
            ParameterKind::Positional
        };

        match child.kind() {
            "identifier" => parameters.push(Parameter {
                name: node_text(&child, source).to_string(),
                kind: plain_kind,
                has_default: false,
                bool_default: false,
                annotated: false,
                line: node_line(&child),
                column: node_column(&child),
            }),
            "typed_parameter" => {
                let Some(inner) = child.named_child(0) else {
                    continue;
                };
                let kind = match inner.kind() {
                    "list_splat_pattern" => {
                        keyword_only = true;
                        ParameterKind::VarPositional
                    }
                    "dictionary_splat_pattern" => ParameterKind::VarKeyword,
                    _ => plain_kind,
                };
                parameters.push(Parameter {
                    name: splat_name(node_text(&inner, source)),
                    kind,
                    has_default: false,
                    bool_default: false,
                    annotated: true,
                    line: node_line(&child),
                    column: node_column(&child),
                });
            }
            "default_parameter" | "typed_default_parameter" => {
                let Some(name) = child.child_by_field_name("name") else {
                    continue;
                };
                let bool_default = child
                    .child_by_field_name("value")
                    .is_some_and(|value| matches!(value.kind(), "true" | "false"));
                parameters.push(Parameter {
                    name: node_text(&name, source).to_string(),
                    kind: plain_kind,
                    has_default: true,
                    bool_default,
                    annotated: child.kind() == "typed_default_parameter",
                    line: node_line(&child),
                    column: node_column(&child),
                });
            }
            "list_splat_pattern" => {
                keyword_only = true;
                let name = splat_name(node_text(&child, source));
                // A bare `*` only separates keyword-only parameters
                if !name.is_empty() {
                    parameters.push(Parameter {
                        name,
                        kind: ParameterKind::VarPositional,
                        has_default: false,
                        bool_default: false,
                        annotated: false,
                        line: node_line(&child),
                        column: node_column(&child),
                    });
                }
            }
            "dictionary_splat_pattern" => parameters.push(Parameter {
                name: splat_name(node_text(&child, source)),
                kind: ParameterKind::VarKeyword,
                has_default: false,
                bool_default: false,
                annotated: false,
                line: node_line(&child),
                column: node_column(&child),
            }),
            "keyword_separator" => keyword_only = true,
            _ => {}
        }
    }

    parameters
}

fn splat_name(text: &str) -> String {
    text.trim_start_matches('*').trim().to_string()
}
