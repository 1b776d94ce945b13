use serde::{Deserialize, Serialize};

/// Detection thresholds shared by every detector.
///
/// Every field has its own serde default so a configuration file only needs
/// to name the values it overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnascenceThresholds {
    /// Positional parameters allowed before a Position violation
    #[serde(default = "default_max_positional_params")]
    pub max_positional_params: usize,

    /// Positional arguments allowed at a call site
    #[serde(default = "default_max_call_args")]
    pub max_call_args: usize,

    #[serde(default = "default_max_cyclomatic_complexity")]
    pub max_cyclomatic_complexity: usize,

    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    #[serde(default = "default_god_class_methods")]
    pub god_class_methods: usize,

    #[serde(default = "default_god_class_lines")]
    pub god_class_lines: usize,

    /// Minimum number of statements for a function body to take part in
    /// duplicate detection
    #[serde(default = "default_duplicate_statement_minimum")]
    pub duplicate_statement_minimum: usize,

    #[serde(default = "default_allowed_numbers")]
    pub magic_literal_allowed_numbers: Vec<f64>,

    #[serde(default = "default_allowed_strings")]
    pub magic_literal_allowed_strings: Vec<String>,

    /// Strings shorter than this are never magic literals
    #[serde(default = "default_min_string_length")]
    pub min_string_length: usize,

    #[serde(default = "default_security_keywords")]
    pub security_keywords: Vec<String>,

    /// Lines above and below a literal searched for security keywords
    #[serde(default = "default_security_context_lines")]
    pub security_context_lines: usize,

    #[serde(default = "default_high_name_usage_threshold")]
    pub high_name_usage_threshold: usize,

    #[serde(default = "default_max_param_name_length")]
    pub max_param_name_length: usize,

    /// Report public functions without any type annotations
    #[serde(default)]
    pub check_type_annotations: bool,
}

impl Default for ConnascenceThresholds {
    fn default() -> Self {
        Self {
            max_positional_params: default_max_positional_params(),
            max_call_args: default_max_call_args(),
            max_cyclomatic_complexity: default_max_cyclomatic_complexity(),
            max_nesting_depth: default_max_nesting_depth(),
            god_class_methods: default_god_class_methods(),
            god_class_lines: default_god_class_lines(),
            duplicate_statement_minimum: default_duplicate_statement_minimum(),
            magic_literal_allowed_numbers: default_allowed_numbers(),
            magic_literal_allowed_strings: default_allowed_strings(),
            min_string_length: default_min_string_length(),
            security_keywords: default_security_keywords(),
            security_context_lines: default_security_context_lines(),
            high_name_usage_threshold: default_high_name_usage_threshold(),
            max_param_name_length: default_max_param_name_length(),
            check_type_annotations: false,
        }
    }
}

impl ConnascenceThresholds {
    pub fn is_allowed_number(&self, value: f64) -> bool {
        self.magic_literal_allowed_numbers
            .iter()
            .any(|allowed| *allowed == value)
    }

    pub fn is_allowed_string(&self, value: &str) -> bool {
        self.magic_literal_allowed_strings
            .iter()
            .any(|allowed| allowed == value)
    }
}

fn default_max_positional_params() -> usize {
    3
}
fn default_max_call_args() -> usize {
    5
}
fn default_max_cyclomatic_complexity() -> usize {
    10
}
fn default_max_nesting_depth() -> usize {
    4
}
fn default_god_class_methods() -> usize {
    20
}
fn default_god_class_lines() -> usize {
    500
}
fn default_duplicate_statement_minimum() -> usize {
    3
}
fn default_allowed_numbers() -> Vec<f64> {
    vec![0.0, 1.0, -1.0, 2.0, 10.0, 100.0, 1000.0]
}
fn default_allowed_strings() -> Vec<String> {
    ["", " ", "\n", "\t"].iter().map(|s| s.to_string()).collect()
}
fn default_min_string_length() -> usize {
    4
}
fn default_security_keywords() -> Vec<String> {
    [
        "password",
        "secret",
        "key",
        "token",
        "auth",
        "crypto",
        "credential",
        "hash",
        "salt",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_security_context_lines() -> usize {
    3
}
fn default_high_name_usage_threshold() -> usize {
    15
}
fn default_max_param_name_length() -> usize {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let t = ConnascenceThresholds::default();
        assert_eq!(t.max_positional_params, 3);
        assert_eq!(t.max_cyclomatic_complexity, 10);
        assert_eq!(t.god_class_methods, 20);
        assert_eq!(t.god_class_lines, 500);
        assert!(t.is_allowed_number(-1.0));
        assert!(!t.is_allowed_number(404.0));
        assert!(t.is_allowed_string("\t"));
        assert!(!t.check_type_annotations);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let t: ConnascenceThresholds = toml::from_str("max_positional_params = 5").unwrap();
        assert_eq!(t.max_positional_params, 5);
        assert_eq!(t.max_call_args, 5);
        assert_eq!(t.security_keywords.len(), 9);
    }
}
