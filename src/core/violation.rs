//! The violation record produced by every detector.
//!
//! A [`Violation`] is built once through [`ViolationBuilder`] and is read-only
//! afterwards. Its `id` is derived from the finding itself, so the same
//! source always yields the same ids regardless of thread or run.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

/// Number of description characters that participate in the fingerprint.
const FINGERPRINT_DESCRIPTION_CHARS: usize = 50;
/// Length of the hex fingerprint kept as the violation id.
const FINGERPRINT_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnascenceType {
    Meaning,
    Position,
    Algorithm,
    Name,
    Type,
    GodObject,
    ParseError,
    ProcessingError,
}

impl ConnascenceType {
    pub const ALL: [ConnascenceType; 8] = [
        ConnascenceType::Meaning,
        ConnascenceType::Position,
        ConnascenceType::Algorithm,
        ConnascenceType::Name,
        ConnascenceType::Type,
        ConnascenceType::GodObject,
        ConnascenceType::ParseError,
        ConnascenceType::ProcessingError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnascenceType::Meaning => "meaning",
            ConnascenceType::Position => "position",
            ConnascenceType::Algorithm => "algorithm",
            ConnascenceType::Name => "name",
            ConnascenceType::Type => "type",
            ConnascenceType::GodObject => "god_object",
            ConnascenceType::ParseError => "parse_error",
            ConnascenceType::ProcessingError => "processing_error",
        }
    }

    /// True for violations that describe a failure to analyze rather than
    /// a coupling finding.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ConnascenceType::ParseError | ConnascenceType::ProcessingError
        )
    }
}

impl fmt::Display for ConnascenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a violation was found. `line` is 1-based, `column` a 0-based byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file_path: String,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(file_path: impl AsRef<Path>, line: usize, column: usize) -> Self {
        Self {
            file_path: file_path.as_ref().to_string_lossy().into_owned(),
            line,
            column,
        }
    }

    /// Location used for file-level findings.
    pub fn file_start(file_path: impl AsRef<Path>) -> Self {
        Self::new(file_path, 1, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    id: String,
    #[serde(rename = "type")]
    kind: ConnascenceType,
    severity: Severity,
    file_path: String,
    line: usize,
    column: usize,
    description: String,
    recommendation: String,
    weight: f64,
    context: BTreeMap<String, serde_json::Value>,
}

impl Violation {
    pub fn builder(
        kind: ConnascenceType,
        severity: Severity,
        location: Location,
    ) -> ViolationBuilder {
        ViolationBuilder {
            kind,
            severity,
            location,
            description: String::new(),
            recommendation: String::new(),
            weight: 1.0,
            context: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ConnascenceType {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn recommendation(&self) -> &str {
        &self.recommendation
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn context(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.context
    }

    pub fn context_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.context.get(key)
    }
}

pub struct ViolationBuilder {
    kind: ConnascenceType,
    severity: Severity,
    location: Location,
    description: String,
    recommendation: String,
    weight: f64,
    context: BTreeMap<String, serde_json::Value>,
}

impl ViolationBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Violation {
        let Location {
            file_path,
            line,
            column,
        } = self.location;
        let id = fingerprint(self.kind, &file_path, line, column, &self.description);

        Violation {
            id,
            kind: self.kind,
            severity: self.severity,
            file_path,
            line,
            column,
            description: self.description,
            recommendation: self.recommendation,
            weight: self.weight,
            context: self.context,
        }
    }
}

/// Deterministic violation id: the first 12 hex digits of SHA-256 over
/// `type|file_path|line|column|description-prefix`.
pub fn fingerprint(
    kind: ConnascenceType,
    file_path: &str,
    line: usize,
    column: usize,
    description: &str,
) -> String {
    let prefix: String = description
        .chars()
        .take(FINGERPRINT_DESCRIPTION_CHARS)
        .collect();
    let canonical = format!("{}|{}|{}|{}|{}", kind.as_str(), file_path, line, column, prefix);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let mut digest = format!("{:x}", hasher.finalize());
    digest.truncate(FINGERPRINT_LEN);
    digest
}

/// Remove violations whose id was already seen, keeping the first occurrence.
pub fn dedup_by_id(violations: Vec<Violation>) -> Vec<Violation> {
    let mut seen = HashSet::with_capacity(violations.len());
    violations
        .into_iter()
        .filter(|v| seen.insert(v.id.clone()))
        .collect()
}
