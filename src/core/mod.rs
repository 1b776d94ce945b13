pub mod ast;
pub mod parsing;
pub mod summary;
pub mod violation;

pub use ast::{FunctionSignature, Parameter, ParameterKind, ParsedSource};
pub use parsing::{ParseFailure, SourceParser};
pub use summary::ViolationSummary;
pub use violation::{
    dedup_by_id, fingerprint, ConnascenceType, Location, Severity, Violation, ViolationBuilder,
};
