//! Identifier reference counting
//!
//! Every `IdentifierReference` counts, including assignment targets and reads
//! inside nested functions. Binding sites (`var t`, parameters) do not.

use std::collections::HashMap;

use oxc_ast::ast::{Expression, FormalParameters, IdentifierReference, Statement};
use oxc_ast_visit::Visit;

/// Counts the references to one name
pub struct ReferenceCounter<'n> {
    name: &'n str,
    count: usize,
}

impl<'n> ReferenceCounter<'n> {
    fn new(name: &'n str) -> Self {
        Self { name, count: 0 }
    }

    pub fn in_expression(name: &str, expr: &Expression<'_>) -> usize {
        let mut counter = ReferenceCounter::new(name);
        counter.visit_expression(expr);
        counter.count
    }

    pub fn in_statements(name: &str, statements: &[Statement<'_>]) -> usize {
        let mut counter = ReferenceCounter::new(name);
        for statement in statements {
            counter.visit_statement(statement);
        }
        counter.count
    }

    /// References made by default values and computed keys of a parameter list
    pub fn in_parameters(name: &str, params: &FormalParameters<'_>) -> usize {
        let mut counter = ReferenceCounter::new(name);
        counter.visit_formal_parameters(params);
        counter.count
    }
}

impl<'a> Visit<'a> for ReferenceCounter<'_> {
    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        if it.name == self.name {
            self.count += 1;
        }
    }
}

/// References to every name in a scope, counted once up front and kept in
/// step as rewrites remove reads
#[derive(Debug, Default)]
pub struct ReferenceTally {
    pub counts: HashMap<String, usize>,
}

impl ReferenceTally {
    pub fn collect(params: Option<&FormalParameters<'_>>, statements: &[Statement<'_>]) -> Self {
        let mut tally = Self::default();
        if let Some(params) = params {
            tally.visit_formal_parameters(params);
        }
        for statement in statements {
            tally.visit_statement(statement);
        }
        tally
    }

    pub fn get(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Record that `removed` references to `name` are gone
    pub fn subtract(&mut self, name: &str, removed: usize) {
        if let Some(count) = self.counts.get_mut(name) {
            *count = count.saturating_sub(removed);
        }
    }
}

impl<'a> Visit<'a> for ReferenceTally {
    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        *self.counts.entry(it.name.to_string()).or_insert(0) += 1;
    }
}
