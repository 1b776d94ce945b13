//! Validation with error accumulation for configuration.
//!
//! Every check runs even when an earlier one failed, so users see all
//! configuration issues in a single run.

use super::{AnalysisConfig, ConnascenceThresholds};
use crate::errors::{ConfigErrors, ConfigIssue};

/// Validate the entire config, accumulating ALL errors.
///
/// ```rust
/// use connascence::config::{validate_config, AnalysisConfig};
///
/// assert!(validate_config(&AnalysisConfig::default()).is_ok());
/// ```
pub fn validate_config(config: &AnalysisConfig) -> Result<(), ConfigErrors> {
    let mut errors = ConfigErrors::new();

    validate_thresholds(&config.thresholds)
        .into_iter()
        .chain(validate_parallel(config))
        .chain(validate_cache(config))
        .chain(validate_exclusions(&config.exclusions))
        .for_each(|issue| errors.push(issue));

    errors.into_result()
}

fn at_least_one(field: &str, value: usize) -> Option<ConfigIssue> {
    (value < 1).then(|| {
        ConfigIssue::new(
            format!("thresholds.{field}"),
            format!("must be at least 1, got {value}"),
        )
    })
}

fn validate_thresholds(thresholds: &ConnascenceThresholds) -> Vec<ConfigIssue> {
    let counts = [
        ("max_positional_params", thresholds.max_positional_params),
        ("max_call_args", thresholds.max_call_args),
        (
            "max_cyclomatic_complexity",
            thresholds.max_cyclomatic_complexity,
        ),
        ("max_nesting_depth", thresholds.max_nesting_depth),
        ("god_class_methods", thresholds.god_class_methods),
        ("god_class_lines", thresholds.god_class_lines),
        (
            "duplicate_statement_minimum",
            thresholds.duplicate_statement_minimum,
        ),
        (
            "high_name_usage_threshold",
            thresholds.high_name_usage_threshold,
        ),
        ("max_param_name_length", thresholds.max_param_name_length),
    ];

    let mut issues: Vec<ConfigIssue> = counts
        .iter()
        .filter_map(|(field, value)| at_least_one(field, *value))
        .collect();

    for (i, number) in thresholds.magic_literal_allowed_numbers.iter().enumerate() {
        if !number.is_finite() {
            issues.push(ConfigIssue::new(
                format!("thresholds.magic_literal_allowed_numbers[{i}]"),
                format!("must be a finite number, got {number}"),
            ));
        }
    }

    if thresholds.security_keywords.is_empty() {
        issues.push(ConfigIssue::new(
            "thresholds.security_keywords",
            "must contain at least one keyword",
        ));
    }
    for (i, keyword) in thresholds.security_keywords.iter().enumerate() {
        if keyword.trim().is_empty() {
            issues.push(ConfigIssue::new(
                format!("thresholds.security_keywords[{i}]"),
                "must not be blank",
            ));
        }
    }

    issues
}

fn validate_parallel(config: &AnalysisConfig) -> Option<ConfigIssue> {
    match config.parallel.max_workers {
        Some(0) => Some(ConfigIssue::new(
            "parallel.max_workers",
            "must be at least 1 when set",
        )),
        _ => None,
    }
}

fn validate_cache(config: &AnalysisConfig) -> Option<ConfigIssue> {
    (config.cache.memory_capacity < 1).then(|| {
        ConfigIssue::new(
            "cache.memory_capacity",
            format!("must be at least 1, got {}", config.cache.memory_capacity),
        )
    })
}

fn validate_exclusions(patterns: &[String]) -> Vec<ConfigIssue> {
    patterns
        .iter()
        .enumerate()
        .filter_map(|(i, pattern)| {
            let glob_part = pattern.trim_end_matches('/');
            glob::Pattern::new(glob_part).err().map(|e| {
                ConfigIssue::new(
                    format!("exclusions[{i}]"),
                    format!("invalid glob pattern '{pattern}' - {e}"),
                )
            })
        })
        .collect()
}
