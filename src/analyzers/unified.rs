//! Single-pass connascence analysis of one file.
//!
//! The file is parsed once and walked once, in preorder, with a tree cursor
//! (no recursion). Every node is handed to the detectors interested in its
//! kind while the [`AnalysisContext`] carries scopes, complexity counters,
//! name usage and duplicate candidates. Two bounded post-passes over the
//! collected state then resolve duplicates and name coupling.

use super::context::{AnalysisContext, Scope};
use crate::config::{AnalysisConfig, ConnascenceThresholds};
use crate::core::ast::{node_column, node_line};
use crate::core::{
    dedup_by_id, FunctionSignature, ParseFailure, ParsedSource, SourceParser, Violation,
};
use crate::detectors::complexity::{self, FunctionComplexity};
use crate::detectors::duplicate::{self, DuplicateCandidate};
use crate::detectors::{god_object, meaning, name, position, type_hints};
use crate::errors::Result;
use crate::observability::{set_current_file, set_phase, AnalysisPhase};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use tree_sitter::Node;

/// Reusable analyzer for any number of files, one at a time.
pub struct UnifiedAnalyzer {
    config: Arc<AnalysisConfig>,
    parser: SourceParser,
    last_line_count: usize,
}

impl UnifiedAnalyzer {
    /// Validate `config` and prepare a parser.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Self::with_shared_config(Arc::new(config))
    }

    pub fn with_shared_config(config: Arc<AnalysisConfig>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            parser: SourceParser::new()?,
            last_line_count: 0,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Line count of the most recently analyzed file. Zero when
    /// [`analyze_file`](Self::analyze_file) got no syntax tree for it.
    pub fn last_line_count(&self) -> usize {
        self.last_line_count
    }

    /// Analyze the file at `path`. Never fails: unreadable files become a
    /// `ProcessingError` and unparseable ones a `ParseError` violation.
    pub fn analyze_file(&mut self, path: &Path) -> Vec<Violation> {
        let _file = set_current_file(path);
        let parsed = {
            let _phase = set_phase(AnalysisPhase::Parsing);
            self.parser.parse_file(path)
        };
        match parsed {
            Ok(parsed) => {
                self.last_line_count = parsed.line_count();
                self.analyze_parsed(&parsed)
            }
            Err(failure) => {
                if let ParseFailure::Unreadable(err) = &failure {
                    warn!(path = %path.display(), error = %err, "cannot read file");
                }
                self.last_line_count = 0;
                vec![failure.into_violation(path)]
            }
        }
    }

    /// Analyze source bytes already read from `path`.
    pub fn analyze_source(&mut self, path: &Path, bytes: &[u8]) -> Vec<Violation> {
        self.last_line_count = String::from_utf8_lossy(bytes).lines().count();

        let parsed = {
            let _phase = set_phase(AnalysisPhase::Parsing);
            match self.parser.parse_source(path, bytes) {
                Ok(parsed) => parsed,
                Err(violation) => return vec![*violation],
            }
        };
        self.analyze_parsed(&parsed)
    }

    fn analyze_parsed(&self, parsed: &ParsedSource) -> Vec<Violation> {
        let mut traversal = Traversal::new(parsed, &self.config.thresholds);
        {
            let _phase = set_phase(AnalysisPhase::Detection);
            traversal.run();
        }

        let _phase = set_phase(AnalysisPhase::Resolution);
        let violations = traversal.finish();
        debug!(
            path = %parsed.path().display(),
            lines = self.last_line_count,
            violations = violations.len(),
            "analyzed file"
        );
        violations
    }
}

/// State of one walk over one parsed file.
struct Traversal<'a> {
    parsed: &'a ParsedSource,
    thresholds: &'a ConnascenceThresholds,
    context: AnalysisContext,
    violations: Vec<Violation>,
}

impl<'a> Traversal<'a> {
    fn new(parsed: &'a ParsedSource, thresholds: &'a ConnascenceThresholds) -> Self {
        Self {
            parsed,
            thresholds,
            context: AnalysisContext::new(),
            violations: Vec::new(),
        }
    }

    /// Preorder walk calling `enter` before a node's children and `leave`
    /// after them.
    fn run(&mut self) {
        let root = self.parsed.root();
        let mut cursor = root.walk();
        loop {
            let node = cursor.node();
            self.enter(&node);
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                let node = cursor.node();
                self.leave(&node);
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return;
                }
            }
        }
    }

    fn enter(&mut self, node: &Node<'a>) {
        let parsed = self.parsed;
        let thresholds = self.thresholds;

        match node.kind() {
            "function_definition" => self.enter_function(node),
            "class_definition" => self.enter_class(node),
            "integer" | "float" | "string" => self
                .violations
                .extend(meaning::check_literal(node, parsed, thresholds)),
            "call" => self
                .violations
                .extend(position::check_call(node, parsed, thresholds)),
            "identifier" if name::is_reference(node) => {
                self.context
                    .record_name(parsed.text(node), node_line(node), node_column(node));
            }
            _ => {}
        }

        self.context
            .add_complexity(complexity::complexity_increment(node));
        if complexity::is_nesting_node(node) {
            self.context.enter_nesting();
        }
    }

    fn leave(&mut self, node: &Node<'a>) {
        if complexity::is_nesting_node(node) {
            self.context.leave_nesting();
        }

        match node.kind() {
            "function_definition" => {
                if let Some(Scope::Function(function)) = self.context.leave_scope() {
                    self.violations.extend(complexity::check_function(
                        &function,
                        self.parsed,
                        self.thresholds,
                    ));
                }
            }
            "class_definition" => {
                self.context.leave_scope();
            }
            _ => {}
        }
    }

    fn enter_function(&mut self, node: &Node<'a>) {
        let Some(signature) = FunctionSignature::from_node(node, self.parsed.source()) else {
            self.context.enter_function(FunctionComplexity::new(
                "<anonymous>",
                node_line(node),
                node_column(node),
            ));
            return;
        };

        let in_class = self.context.in_class();
        self.violations.extend(position::check_signature(
            &signature,
            in_class,
            self.parsed,
            self.thresholds,
        ));
        if self.thresholds.check_type_annotations {
            self.violations.extend(type_hints::check_annotations(
                &signature,
                signature.is_method(in_class),
                self.parsed.path(),
            ));
        }
        if let Some(shape) = duplicate::function_shape(node, signature.parameters.len()) {
            self.context.record_candidate(DuplicateCandidate {
                name: signature.name.clone(),
                line: signature.line,
                column: signature.column,
                shape,
            });
        }

        self.context.enter_function(FunctionComplexity::new(
            signature.name,
            signature.line,
            signature.column,
        ));
    }

    fn enter_class(&mut self, node: &Node<'a>) {
        let parsed = self.parsed;
        self.violations
            .extend(god_object::check_class(node, parsed, self.thresholds));
        let name = node
            .child_by_field_name("name")
            .map(|n| parsed.text(&n))
            .unwrap_or("<anonymous>");
        self.context.enter_class(name);
    }

    fn finish(mut self) -> Vec<Violation> {
        let path = self.parsed.path();
        self.violations.extend(duplicate::find_duplicates(
            self.context.candidates(),
            path,
            self.thresholds,
        ));
        self.violations.extend(name::check_name_usage(
            self.context.name_usage(),
            path,
            self.thresholds,
        ));
        dedup_by_id(self.violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ConnascenceType, Severity};
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn analyze(code: &str) -> Vec<Violation> {
        let mut analyzer = UnifiedAnalyzer::new(AnalysisConfig::default()).unwrap();
        analyzer.analyze_source(Path::new("module.py"), code.as_bytes())
    }

    fn kinds(violations: &[Violation]) -> Vec<ConnascenceType> {
        violations.iter().map(Violation::kind).collect()
    }

    #[test]
    fn test_invalid_config_is_rejected_up_front() {
        let mut config = AnalysisConfig::default();
        config.thresholds.max_nesting_depth = 0;
        assert!(matches!(
            UnifiedAnalyzer::new(config),
            Err(crate::errors::Error::Configuration(_))
        ));
    }

    #[test]
    fn test_method_receiver_and_nested_scopes() {
        let violations = analyze(indoc! {"
            class Service:
                def handle(self, a, b, c):
                    def inner(x, y, z, w):
                        return x
                    return inner
        "});
        assert_eq!(kinds(&violations), vec![ConnascenceType::Position]);
        assert!(violations[0].description().contains("'inner'"));
    }

    #[test]
    fn test_complexity_counted_in_single_pass() {
        let mut body = String::from("def busy(x):\n");
        for i in 0..11 {
            body.push_str(&format!("    if x == {}:\n        return x\n", i));
        }
        let violations = analyze(&body);
        let complexity: Vec<_> = violations
            .iter()
            .filter(|v| v.context_value("issue_type") == Some(&"cyclomatic_complexity".into()))
            .collect();
        assert_eq!(complexity.len(), 1);
        assert_eq!(
            complexity[0].context_value("complexity"),
            Some(&serde_json::Value::from(12))
        );
        assert_eq!(complexity[0].severity(), Severity::Medium);
    }

    #[test]
    fn test_nesting_depth_violation() {
        let violations = analyze(indoc! {"
            def deep(x):
                if x:
                    for a in x:
                        while a:
                            with a:
                                try:
                                    pass
                                except E:
                                    pass
        "});
        let nesting: Vec<_> = violations
            .iter()
            .filter(|v| v.context_value("issue_type") == Some(&"nesting_depth".into()))
            .collect();
        assert_eq!(nesting.len(), 1);
        assert_eq!(
            nesting[0].context_value("nesting_depth"),
            Some(&serde_json::Value::from(5))
        );
    }

    #[test]
    fn test_elif_chain_does_not_nest() {
        let mut code = String::from("def chain(x):\n    if x:\n        pass\n");
        for _ in 0..6 {
            code.push_str("    elif x:\n        pass\n");
        }
        let violations = analyze(&code);
        assert!(violations
            .iter()
            .all(|v| v.context_value("issue_type") != Some(&"nesting_depth".into())));
    }

    #[test]
    fn test_name_coupling_post_pass() {
        let mut code = String::from("settings = load()\n");
        for _ in 0..16 {
            code.push_str("use(settings)\n");
        }
        let violations = analyze(&code);
        let names: Vec<_> = violations
            .iter()
            .filter(|v| v.kind() == ConnascenceType::Name)
            .map(|v| v.context_value("name").cloned())
            .collect();
        assert_eq!(
            names,
            vec![
                Some(serde_json::Value::from("settings")),
                Some(serde_json::Value::from("use"))
            ]
        );
        let settings = violations
            .iter()
            .find(|v| v.kind() == ConnascenceType::Name)
            .unwrap();
        assert_eq!((settings.line(), settings.column()), (1, 0));
    }

    #[test]
    fn test_similar_long_names_are_both_reported() {
        let alpha = "configuration_parameter_registry_lookup_table_alpha";
        let omega = "configuration_parameter_registry_lookup_table_omega";
        let mut code = String::new();
        for _ in 0..16 {
            code.push_str(&format!("print({alpha}, {omega})\n"));
        }
        let names: Vec<_> = analyze(&code)
            .iter()
            .filter(|v| v.kind() == ConnascenceType::Name)
            .map(|v| v.context_value("name").unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec![alpha, omega, "print"]);
    }

    #[test]
    fn test_type_hints_are_opt_in() {
        let code = "def load(path):\n    return path\n";
        assert!(analyze(code).is_empty());

        let mut config = AnalysisConfig::default();
        config.thresholds.check_type_annotations = true;
        let mut analyzer = UnifiedAnalyzer::new(config).unwrap();
        let violations = analyzer.analyze_source(Path::new("m.py"), code.as_bytes());
        assert_eq!(kinds(&violations), vec![ConnascenceType::Type]);
    }

    #[test]
    fn test_parse_error_stops_detection() {
        let violations = analyze("def f(a, b, c, d, e:\n    x = 404\n");
        assert_eq!(kinds(&violations), vec![ConnascenceType::ParseError]);
    }

    #[test]
    fn test_analyzer_is_reusable_and_deterministic() {
        let mut analyzer = UnifiedAnalyzer::new(AnalysisConfig::default()).unwrap();
        let code = b"def f(a, b, c, d):\n    return a * 3.5\n";
        let first: BTreeSet<String> = analyzer
            .analyze_source(Path::new("a.py"), code)
            .iter()
            .map(|v| v.id().to_string())
            .collect();
        analyzer.analyze_source(Path::new("b.py"), b"x = 1\n");
        let second: BTreeSet<String> = analyzer
            .analyze_source(Path::new("a.py"), code)
            .iter()
            .map(|v| v.id().to_string())
            .collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(analyzer.last_line_count(), 2);
    }

    #[test]
    fn test_unreadable_file_is_processing_error() {
        let mut analyzer = UnifiedAnalyzer::new(AnalysisConfig::default()).unwrap();
        let violations = analyzer.analyze_file(Path::new("/no/such/dir/missing.py"));
        assert_eq!(kinds(&violations), vec![ConnascenceType::ProcessingError]);
        assert_eq!(analyzer.last_line_count(), 0);
    }

    #[test]
    fn test_file_and_source_entry_points_agree() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("module.py");
        let code = "def f(a, b, c, d):\n    return a * 3.5\n";
        std::fs::write(&path, code).unwrap();

        let mut analyzer = UnifiedAnalyzer::new(AnalysisConfig::default()).unwrap();
        let from_file = analyzer.analyze_file(&path);
        assert_eq!(analyzer.last_line_count(), 2);
        let from_source = analyzer.analyze_source(&path, code.as_bytes());
        assert_eq!(from_file, from_source);
        assert_eq!(from_file.len(), 2);

        std::fs::write(&path, "def broken(:\n").unwrap();
        assert_eq!(kinds(&analyzer.analyze_file(&path)), vec![ConnascenceType::ParseError]);
    }
}
