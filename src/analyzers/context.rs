//! Per-file state threaded through the single traversal.

use crate::detectors::complexity::FunctionComplexity;
use crate::detectors::duplicate::DuplicateCandidate;
use crate::detectors::name::NameUsage;
use std::collections::HashMap;

/// One entry of the lexical scope stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Function(FunctionComplexity),
    Class { name: String },
}

/// Transient analysis state for one file.
///
/// Created at the start of a file, discarded at its end; nothing in here
/// survives between files.
#[derive(Debug, Default)]
pub struct AnalysisContext {
    scopes: Vec<Scope>,
    name_usage: HashMap<String, NameUsage>,
    candidates: Vec<DuplicateCandidate>,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_function(&mut self, function: FunctionComplexity) {
        self.scopes.push(Scope::Function(function));
    }

    pub fn enter_class(&mut self, name: impl Into<String>) {
        self.scopes.push(Scope::Class { name: name.into() });
    }

    pub fn leave_scope(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    /// True when the innermost enclosing scope is a class body.
    pub fn in_class(&self) -> bool {
        matches!(self.scopes.last(), Some(Scope::Class { .. }))
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn functions_mut(&mut self) -> impl Iterator<Item = &mut FunctionComplexity> {
        self.scopes.iter_mut().filter_map(|scope| match scope {
            Scope::Function(function) => Some(function),
            Scope::Class { .. } => None,
        })
    }

    /// Add decision points to every enclosing function.
    pub fn add_complexity(&mut self, amount: usize) {
        if amount == 0 {
            return;
        }
        self.functions_mut()
            .for_each(|function| function.cyclomatic += amount);
    }

    pub fn enter_nesting(&mut self) {
        self.functions_mut()
            .for_each(FunctionComplexity::enter_block);
    }

    pub fn leave_nesting(&mut self) {
        self.functions_mut()
            .for_each(FunctionComplexity::leave_block);
    }

    /// Count a reference; the first one fixes where the name is reported.
    pub fn record_name(&mut self, name: &str, line: usize, column: usize) {
        if let Some(usage) = self.name_usage.get_mut(name) {
            usage.count += 1;
        } else {
            self.name_usage
                .insert(name.to_string(), NameUsage::first(line, column));
        }
    }

    pub fn record_candidate(&mut self, candidate: DuplicateCandidate) {
        self.candidates.push(candidate);
    }

    pub fn name_usage(&self) -> &HashMap<String, NameUsage> {
        &self.name_usage
    }

    /// Registered functions in traversal order.
    pub fn candidates(&self) -> &[DuplicateCandidate] {
        &self.candidates
    }
}
