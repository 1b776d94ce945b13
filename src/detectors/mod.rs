//! Connascence detectors.
//!
//! Each detector is a set of pure functions over a tree-sitter node (or the
//! per-file state collected during traversal), the parsed source, and the
//! immutable thresholds. The unified analyzer decides which node goes to
//! which detector; the detectors never walk the tree on their own except
//! for bounded look-ups below the node they were given.

pub mod complexity;
pub mod duplicate;
pub mod god_object;
pub mod meaning;
pub mod name;
pub mod position;
pub mod type_hints;
