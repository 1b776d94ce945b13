//! Python source parsing with tree-sitter.
//!
//! The parser is the only place where malformed input turns into data: a
//! file that is not UTF-8 or contains syntax errors yields exactly one
//! `ParseError` violation instead of a syntax tree.

use super::ast::{node_column, node_line, node_text, ParsedSource};
use super::violation::{ConnascenceType, Location, Severity, Violation};
use crate::errors::Result;
use std::path::Path;
use tree_sitter::{Node, Parser, Tree};

const SYNTAX_RECOMMENDATION: &str = "Fix syntax errors before analyzing connascence";

/// Why a file produced no syntax tree.
#[derive(Debug)]
pub enum ParseFailure {
    /// The file could not be read
    Unreadable(std::io::Error),
    /// The file was read but is not valid Python
    Invalid(Box<Violation>),
}

impl ParseFailure {
    /// Report the failure as a single violation for `path`.
    pub fn into_violation(self, path: &Path) -> Violation {
        match self {
            ParseFailure::Unreadable(err) => {
                processing_error(path, &format!("cannot read file: {err}"))
            }
            ParseFailure::Invalid(violation) => *violation,
        }
    }
}

/// Python parser that can be reused across files.
pub struct SourceParser {
    parser: Parser,
}

impl SourceParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_python::LANGUAGE.into())?;
        Ok(Self { parser })
    }

    /// Read `path` and parse it.
    pub fn parse_file(&mut self, path: &Path) -> std::result::Result<ParsedSource, ParseFailure> {
        let bytes = std::fs::read(path).map_err(ParseFailure::Unreadable)?;
        self.parse_source(path, &bytes)
            .map_err(ParseFailure::Invalid)
    }

    /// Parse source bytes that were already read from `path`.
    pub fn parse_source(
        &mut self,
        path: &Path,
        bytes: &[u8],
    ) -> std::result::Result<ParsedSource, Box<Violation>> {
        let source = match std::str::from_utf8(bytes) {
            Ok(source) => source.to_string(),
            Err(err) => return Err(Box::new(invalid_utf8(path, bytes, err.valid_up_to()))),
        };

        let tree = self.parser.parse(&source, None).ok_or_else(|| {
            Box::new(syntax_error(
                path,
                Location::file_start(path),
                "Syntax error: parser produced no tree".to_string(),
            ))
        })?;

        if let Some(violation) = first_syntax_error(path, &tree, &source) {
            return Err(Box::new(violation));
        }

        Ok(ParsedSource::new(path.to_path_buf(), tree, source))
    }
}

/// Build the violation used when analysis of `path` failed unexpectedly.
pub fn processing_error(path: &Path, message: &str) -> Violation {
    Violation::builder(
        ConnascenceType::ProcessingError,
        Severity::Critical,
        Location::file_start(path),
    )
    .description(format!("Failed to process file: {message}"))
    .recommendation("Check file encoding and permissions")
    .build()
}

fn invalid_utf8(path: &Path, bytes: &[u8], valid_up_to: usize) -> Violation {
    let valid = &bytes[..valid_up_to];
    let line = valid.iter().filter(|b| **b == b'\n').count() + 1;
    let column = valid
        .iter()
        .rposition(|b| *b == b'\n')
        .map(|newline| valid_up_to - newline - 1)
        .unwrap_or(valid_up_to);

    syntax_error(
        path,
        Location::new(path, line, column),
        format!("Syntax error: file is not valid UTF-8 (invalid byte at line {line})"),
    )
}

fn first_syntax_error(path: &Path, tree: &Tree, source: &str) -> Option<Violation> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }

    let node = find_error_node(root)?;
    let description = if node.is_missing() {
        format!("Syntax error: missing '{}'", node.kind())
    } else {
        let snippet: String = node_text(&node, source)
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(40)
            .collect();
        format!("Syntax error: invalid syntax near '{}'", snippet.trim())
    };

    Some(syntax_error(
        path,
        Location::new(path, node_line(&node), node_column(&node)),
        description,
    ))
}

/// First ERROR or MISSING node in document order.
fn find_error_node(root: Node) -> Option<Node> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        // Only descend into subtrees that contain an error
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn syntax_error(path: &Path, location: Location, description: String) -> Violation {
    tracing::debug!(path = %path.display(), %description, "parse failed");
    Violation::builder(ConnascenceType::ParseError, Severity::Critical, location)
        .description(description)
        .recommendation(SYNTAX_RECOMMENDATION)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(code: &[u8]) -> std::result::Result<ParsedSource, Box<Violation>> {
        SourceParser::new()
            .unwrap()
            .parse_source(Path::new("sample.py"), code)
    }

    #[test]
    fn test_valid_source_parses() {
        let parsed = parse(b"def f(x):\n    return x\n").unwrap();
        assert_eq!(parsed.root().kind(), "module");
        assert_eq!(parsed.line_count(), 2);
    }

    #[test]
    fn test_whitespace_only_source_parses() {
        let parsed = parse(b"  \n\n\t\n").unwrap();
        assert_eq!(parsed.root().named_child_count(), 0);
    }

    #[test]
    fn test_syntax_error_becomes_single_violation() {
        let violation = parse(b"x = 1\ndef broken(:\n    pass\n").unwrap_err();
        assert_eq!(violation.kind(), ConnascenceType::ParseError);
        assert_eq!(violation.severity(), Severity::Critical);
        assert_eq!(violation.line(), 2);
        assert!(violation.description().starts_with("Syntax error"));
    }

    #[test]
    fn test_invalid_utf8_reports_line() {
        let violation = parse(b"x = 1\ny = '\xff\xfe'\n").unwrap_err();
        assert_eq!(violation.kind(), ConnascenceType::ParseError);
        assert_eq!(violation.line(), 2);
        assert_eq!(violation.column(), 5);
    }

    #[test]
    fn test_unreadable_file_is_processing_error() {
        let mut parser = SourceParser::new().unwrap();
        let path = Path::new("/definitely/not/here.py");
        let failure = parser.parse_file(path).unwrap_err();
        let violation = failure.into_violation(path);
        assert_eq!(violation.kind(), ConnascenceType::ProcessingError);
        assert_eq!(violation.line(), 1);
    }
}
