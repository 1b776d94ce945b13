//! Connascence of Type: public functions that leave every type implicit.

use crate::core::{ConnascenceType, FunctionSignature, Location, Severity, Violation};
use std::path::Path;

/// Check a function signature. `is_method` drops the receiver, which is
/// never annotated.
pub fn check_annotations(
    signature: &FunctionSignature,
    is_method: bool,
    path: &Path,
) -> Option<Violation> {
    if !signature.is_public() || signature.has_return_annotation {
        return None;
    }

    let parameters = &signature.parameters[usize::from(is_method).min(signature.parameters.len())..];
    if parameters.iter().any(|p| p.annotated) {
        return None;
    }

    Some(
        Violation::builder(
            ConnascenceType::Type,
            Severity::Low,
            Location::new(path, signature.line, signature.column),
        )
        .description(format!(
            "Function '{}' has no type annotations",
            signature.name
        ))
        .recommendation("Add parameter and return type annotations to make type expectations explicit")
        .context("function_name", signature.name.clone())
        .context("parameter_count", parameters.len())
        .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::{nodes_of_kind, parse};

    fn check(code: &str, is_method: bool) -> Option<Violation> {
        let parsed = parse(code);
        let node = nodes_of_kind(&parsed, "function_definition")[0];
        let signature = FunctionSignature::from_node(&node, parsed.source()).unwrap();
        check_annotations(&signature, is_method, parsed.path())
    }

    #[test]
    fn test_unannotated_public_function() {
        let violation = check("def load(path):\n    pass\n", false).unwrap();
        assert_eq!(violation.kind(), ConnascenceType::Type);
        assert_eq!(violation.severity(), Severity::Low);
    }

    #[test]
    fn test_any_annotation_is_enough() {
        assert!(check("def load(path: str):\n    pass\n", false).is_none());
        assert!(check("def load(path) -> None:\n    pass\n", false).is_none());
    }

    #[test]
    fn test_private_functions_are_skipped() {
        assert!(check("def _load(path):\n    pass\n", false).is_none());
    }
}
