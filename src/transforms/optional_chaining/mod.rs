//! Optional chaining and nullish coalescing reconstruction
//!
//! Transpilers lower `a?.b` to `a === null || a === void 0 ? void 0 : a.b`
//! and `a ?? b` to a guarded conditional over a temporary. This pass finds
//! those expansions and puts the original operators back:
//!
//! 1. Every conditional and logical expression is a candidate. The nullish
//!    recognizer gets the first look, then the candidate is turned into a
//!    [`DecisionTree`], negated when it is rooted at a `!= null` test, and
//!    handed to the [`ChainConstructor`].
//! 2. A candidate is replaced only if at least one guard became an optional
//!    link and no temporary it stops assigning is read outside of it.
//! 3. After each function body is swept, temporaries the rewrites consumed are
//!    offered to the [`ScopeCleaner`].
//!
//! Sweeps repeat until nothing changes or the pass limit is hit.

pub mod chain;
pub mod decision_tree;
pub mod nullish;
pub mod rewriter;

use std::collections::{HashMap, HashSet};

pub use chain::{ChainConstructor, Constructed, NullCheck};
pub use decision_tree::{DecisionTree, ShortCircuit};
pub use nullish::{Coalesced, PropertyAccess, TemporaryBinding};
pub use rewriter::{rewrite, Rewritten};

use oxc_allocator::Vec as ArenaVec;
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_ast_visit::{walk_mut, VisitMut};
use oxc_span::ContentEq;
use oxc_syntax::scope::ScopeFlags;

use super::scope::{parameter_names, Removal, ScopeCleaner, ScopeDeclarations};
use super::{Transform, TransformContext, TransformOptions};
use crate::js::expr::is_short_circuit;
use crate::js::references::{ReferenceCounter, ReferenceTally};

/// A successful reconstruction of one candidate
#[derive(Debug)]
pub struct Reconstruction<'a> {
    pub expr: Expression<'a>,
    /// Temporaries whose declarations may now be dead
    pub consumed: Vec<String>,
}

/// Run the general optional chain reconstruction on one candidate
pub fn reconstruct<'a>(
    ast_builder: AstBuilder<'a>,
    expr: &Expression<'a>,
    options: &TransformOptions,
) -> Option<Reconstruction<'a>> {
    let tree = DecisionTree::build(ast_builder, expr)?;
    let tree = if chain::is_not_null_check(&tree.condition) {
        tree.negate(ast_builder)
    } else {
        tree
    };

    let constructed = ChainConstructor::new(ast_builder, &tree, options).construct(&tree)?;
    if !constructed.matched || constructed.expr.content_eq(expr) {
        return None;
    }
    Some(Reconstruction {
        expr: constructed.expr,
        consumed: constructed.consumed,
    })
}

/// Transformation entry point: rewrite the whole program in place
pub fn un_optional_chaining<'a>(
    ast_builder: AstBuilder<'a>,
    program: &mut Program<'a>,
    ctx: &mut TransformContext,
) {
    let passes = ctx.options.max_passes.max(1);
    ctx.stats.converged = false;

    for pass in 1..=passes {
        let mut sweeper = Sweeper::new(ast_builder, &ctx.options);
        sweeper.visit_program(program);

        ctx.stats.passes = pass;
        ctx.stats.optional_chains += sweeper.optional_chains;
        ctx.stats.nullish_coalescing += sweeper.nullish_coalescing;
        ctx.stats.declarations_removed += sweeper.declarations_removed;

        log::debug!(
            "Sweep {}: {} optional chains, {} nullish coalescings, {} declarations removed",
            pass,
            sweeper.optional_chains,
            sweeper.nullish_coalescing,
            sweeper.declarations_removed
        );

        if sweeper.rewrites() == 0 {
            ctx.stats.converged = true;
            break;
        }
    }

    if !ctx.stats.converged {
        log::debug!("Optional chaining stopped after {} sweeps without converging", passes);
    }
}

/// The optional chaining reconstruction as a pipeline pass
#[derive(Debug, Default)]
pub struct OptionalChaining;

impl Transform for OptionalChaining {
    fn name(&self) -> &'static str {
        "optional-chaining"
    }

    fn run<'a>(
        &mut self,
        ast_builder: AstBuilder<'a>,
        program: &mut Program<'a>,
        ctx: &mut TransformContext,
    ) {
        un_optional_chaining(ast_builder, program, ctx);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RewriteKind {
    OptionalChain,
    NullishCoalescing,
}

/// Per-function bookkeeping during a sweep
struct Scope {
    declared: HashSet<String>,
    references: ReferenceTally,
    consumed: Vec<String>,
}

struct Sweeper<'o, 'a> {
    ast_builder: AstBuilder<'a>,
    options: &'o TransformOptions,
    scopes: Vec<Scope>,
    optional_chains: usize,
    nullish_coalescing: usize,
    declarations_removed: usize,
}

impl<'o, 'a> Sweeper<'o, 'a> {
    fn new(ast_builder: AstBuilder<'a>, options: &'o TransformOptions) -> Self {
        Self {
            ast_builder,
            options,
            scopes: Vec::new(),
            optional_chains: 0,
            nullish_coalescing: 0,
            declarations_removed: 0,
        }
    }

    fn rewrites(&self) -> usize {
        self.optional_chains + self.nullish_coalescing
    }

    /// Sweep one function scope, then clean up the temporaries its rewrites
    /// consumed. Returns the consumed names this scope does not declare.
    fn sweep_scope(
        &mut self,
        mut params: Option<&mut FormalParameters<'a>>,
        body: &mut ArenaVec<'a, Statement<'a>>,
    ) -> Vec<String> {
        let mut declared = ScopeDeclarations::collect(body).variables;
        if let Some(params) = params.as_deref() {
            declared.extend(parameter_names(params));
        }
        let references = ReferenceTally::collect(params.as_deref(), body);

        self.scopes.push(Scope {
            declared,
            references,
            consumed: Vec::new(),
        });
        if let Some(params) = params.as_deref_mut() {
            self.visit_formal_parameters(params);
        }
        for statement in body.iter_mut() {
            self.visit_statement(statement);
        }
        let Some(scope) = self.scopes.pop() else {
            return Vec::new();
        };

        let mut cleaner = ScopeCleaner::new(self.ast_builder, params.as_deref(), body);
        let mut seen = HashSet::new();
        let mut escaped = Vec::new();
        for name in scope.consumed {
            if !seen.insert(name.clone()) {
                continue;
            }
            match cleaner.remove_unused(&name) {
                Removal::Removed(count) => self.declarations_removed += count,
                Removal::Retained => {}
                Removal::Unbound => escaped.push(name),
            }
        }
        escaped
    }

    fn try_rewrite(&mut self, expr: &mut Expression<'a>) {
        if self.options.nullish_coalescing {
            if let Some(coalesced) = nullish::analyze(self.ast_builder, expr) {
                if self.accept(
                    expr,
                    coalesced.expr,
                    coalesced.consumed,
                    RewriteKind::NullishCoalescing,
                ) {
                    return;
                }
            }
        }
        if !is_short_circuit(expr) {
            return;
        }
        if let Some(reconstruction) = reconstruct(self.ast_builder, expr, self.options) {
            self.accept(
                expr,
                reconstruction.expr,
                reconstruction.consumed,
                RewriteKind::OptionalChain,
            );
        }
    }

    /// Scope that owns `name`: the innermost one declaring it
    fn owner(&self, name: &str) -> Option<&Scope> {
        self.scopes.iter().rev().find(|scope| scope.declared.contains(name))
    }

    /// Every local the replacement stops assigning must be read only inside
    /// the candidate, the replacement must not read it without its
    /// assignment, and globals must keep their assignments
    fn temporaries_are_local(&self, original: &Expression<'a>, replacement: &Expression<'a>) -> bool {
        rewriter::assigned_names(original).iter().all(|name| {
            let assigned = rewriter::assignment_count(replacement, name);
            if assigned >= rewriter::assignment_count(original, name) {
                return true;
            }
            if ReferenceCounter::in_expression(name, replacement) > assigned {
                return false;
            }
            match self.owner(name) {
                Some(scope) => {
                    scope.references.get(name) == ReferenceCounter::in_expression(name, original)
                }
                None => false,
            }
        })
    }

    fn accept(
        &mut self,
        expr: &mut Expression<'a>,
        replacement: Expression<'a>,
        consumed: Vec<String>,
        kind: RewriteKind,
    ) -> bool {
        if !self.temporaries_are_local(expr, &replacement) {
            log::trace!("Temporaries of {:?} escape the candidate, leaving it", kind);
            return false;
        }

        // Keep the tallies in step with the removed references
        let mut names = rewriter::assigned_names(expr);
        names.extend(consumed.iter().cloned());
        let mut deltas = HashMap::new();
        for name in names {
            let before = ReferenceCounter::in_expression(&name, expr);
            let after = ReferenceCounter::in_expression(&name, &replacement);
            deltas.insert(name, before.saturating_sub(after));
        }
        for scope in &mut self.scopes {
            for (name, delta) in &deltas {
                scope.references.subtract(name, *delta);
            }
        }

        log::trace!("Rewrote {:?} candidate, consumed {:?}", kind, consumed);
        *expr = replacement;
        if let Some(scope) = self.scopes.last_mut() {
            scope.consumed.extend(consumed);
        }
        match kind {
            RewriteKind::OptionalChain => self.optional_chains += 1,
            RewriteKind::NullishCoalescing => self.nullish_coalescing += 1,
        }
        true
    }

    fn escape(&mut self, names: Vec<String>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.consumed.extend(names);
        }
    }
}

impl<'a> VisitMut<'a> for Sweeper<'_, 'a> {
    fn visit_program(&mut self, it: &mut Program<'a>) {
        self.sweep_scope(None, &mut it.body);
    }

    fn visit_expression(&mut self, it: &mut Expression<'a>) {
        self.try_rewrite(it);
        let before = self.rewrites();
        walk_mut::walk_expression(self, it);
        // Inner chains rebuilt below may complete this one
        if self.rewrites() > before {
            self.try_rewrite(it);
        }
    }

    fn visit_function(&mut self, it: &mut Function<'a>, _flags: ScopeFlags) {
        let params = &mut *it.params;
        if let Some(body) = it.body.as_deref_mut() {
            let escaped = self.sweep_scope(Some(params), &mut body.statements);
            self.escape(escaped);
        }
    }

    fn visit_arrow_function_expression(&mut self, it: &mut ArrowFunctionExpression<'a>) {
        let escaped = self.sweep_scope(Some(&mut *it.params), &mut it.body.statements);
        self.escape(escaped);
    }

    fn visit_static_block(&mut self, it: &mut StaticBlock<'a>) {
        let escaped = self.sweep_scope(None, &mut it.body);
        self.escape(escaped);
    }
}
