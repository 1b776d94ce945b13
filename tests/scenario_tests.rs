mod common;

use common::{analyze_snippet, analyze_with};
use connascence::{AnalysisConfig, ConnascenceThresholds, ConnascenceType, Severity};
use indoc::indoc;
use pretty_assertions::assert_eq;
use serde_json::Value;

#[test]
fn test_long_positional_parameter_list() {
    let thresholds = ConnascenceThresholds {
        max_positional_params: 3,
        ..ConnascenceThresholds::default()
    };
    let config = AnalysisConfig::default().with_thresholds(thresholds);

    let violations = analyze_with(config, "def f(a, b, c, d, e): pass\n");

    assert_eq!(violations.len(), 1);
    let v = &violations[0];
    assert_eq!(v.kind(), ConnascenceType::Position);
    assert!(matches!(v.severity(), Severity::High | Severity::Critical));
    assert_eq!(v.context_value("parameter_count"), Some(&Value::from(5)));
}

#[test]
fn test_magic_number_in_conditional() {
    let violations = analyze_snippet(indoc! {"
        def lookup(x):
            if x == 404:
                return None
    "});

    assert_eq!(violations.len(), 1);
    let v = &violations[0];
    assert_eq!(v.kind(), ConnascenceType::Meaning);
    assert_eq!(v.severity(), Severity::High);
    assert!(v.description().contains("404"));
    assert_eq!((v.line(), v.column()), (2, 12));
}

#[test]
fn test_god_class() {
    let mut code = String::from("class Everything:\n");
    for i in 0..25 {
        code.push_str(&format!("    def method_{i}(self):\n"));
        code.push_str("        \"\"\"\n");
        for _ in 0..18 {
            code.push_str("        Explains what this method is for.\n");
        }
        code.push_str("        \"\"\"\n");
        code.push_str("        return self\n");
    }

    let violations = analyze_snippet(&code);

    assert_eq!(violations.len(), 1);
    let v = &violations[0];
    assert_eq!(v.kind(), ConnascenceType::GodObject);
    assert_eq!(v.severity(), Severity::Critical);
    assert_eq!(v.context_value("method_count"), Some(&Value::from(25)));
    assert!(v.context_value("lines_of_code").unwrap().as_u64().unwrap() > 500);
}

#[test]
fn test_duplicate_algorithm() {
    let violations = analyze_snippet(indoc! {"
        def first(x):
            if x:
                return x
            else:
                return None

        def second(y):
            if y:
                return y
            else:
                return None
    "});

    assert_eq!(violations.len(), 1);
    let v = &violations[0];
    assert_eq!(v.kind(), ConnascenceType::Algorithm);
    assert_eq!(v.severity(), Severity::Medium);
    assert_eq!(v.line(), 7);
    assert_eq!(v.context_value("similar_function"), Some(&Value::from("first")));
    assert_eq!(v.context_value("function_name"), Some(&Value::from("second")));
}

#[test]
fn test_duplicates_all_reference_first_in_traversal_order() {
    let body = "    total = 0\n    for item in items:\n        total += item\n    return total\n";
    let code = format!(
        "def alpha(items):\n{body}\ndef beta(items):\n{body}\ndef gamma(items):\n{body}"
    );

    let duplicates: Vec<_> = analyze_snippet(&code)
        .into_iter()
        .filter(|v| v.kind() == ConnascenceType::Algorithm)
        .collect();

    assert_eq!(duplicates.len(), 2);
    for v in &duplicates {
        assert_eq!(v.context_value("similar_function"), Some(&Value::from("alpha")));
    }
}

#[test]
fn test_short_functions_are_never_duplicates() {
    let violations = analyze_snippet(indoc! {"
        def a(x):
            return x

        def b(y):
            return y
    "});
    assert!(violations.is_empty());
}

#[test]
fn test_security_context_is_critical() {
    let violations = analyze_snippet("api_token = \"Bearer abc.def\"\n");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind(), ConnascenceType::Meaning);
    assert_eq!(violations[0].severity(), Severity::Critical);
}

#[test]
fn test_syntax_error_yields_single_parse_error() {
    let violations = analyze_snippet("def broken(:\n    return 404\n");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind(), ConnascenceType::ParseError);
    assert_eq!(violations[0].severity(), Severity::Critical);
}

#[test]
fn test_clean_code_has_no_violations() {
    let violations = analyze_snippet(indoc! {"
        MAX_RETRIES = 10

        class Client:
            def __init__(self, host, port=0):
                self.host = host
                self.port = port

            def address(self):
                return f\"{self.host}:{self.port}\"
    "});
    assert_eq!(violations, vec![]);
}
