//! Reconstruction passes
//!
//! Each pass rewrites a [`Program`] in place. Passes share a
//! [`TransformContext`] carrying the options they were configured with and
//! the statistics they report back to the caller.

pub mod optional_chaining;
pub mod scope;

pub use optional_chaining::{un_optional_chaining, OptionalChaining};
pub use scope::{Removal, ScopeCleaner};

use oxc_ast::ast::Program;
use oxc_ast::AstBuilder;
use serde::Serialize;

/// Trait for reconstruction passes
pub trait Transform {
    /// Get the name of this pass
    fn name(&self) -> &'static str;

    /// Run the pass over the whole program, building new nodes in the
    /// program's arena
    fn run<'a>(
        &mut self,
        ast_builder: AstBuilder<'a>,
        program: &mut Program<'a>,
        ctx: &mut TransformContext,
    );

    /// Check if this pass should run
    fn should_run(&self, _ctx: &TransformContext) -> bool {
        true
    }
}

/// Options for the reconstruction passes
#[derive(Debug, Clone, Serialize)]
pub struct TransformOptions {
    /// Upper bound on whole-document sweeps per pass
    pub max_passes: usize,
    /// Accept `null` and short-circuited `&&` operands as the value of a
    /// guarded branch, not only `undefined`
    pub loose_falsy_leaves: bool,
    /// Also accept `false` and `!1` in loose mode. `a?.b` never yields
    /// `false`, so this changes what the rewritten code evaluates to.
    pub false_leaves: bool,
    /// Rebuild `??` from its expanded conditional form
    pub nullish_coalescing: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            max_passes: 5,
            loose_falsy_leaves: true,
            false_leaves: false,
            nullish_coalescing: true,
        }
    }
}

/// What the passes changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    pub optional_chains: usize,
    pub nullish_coalescing: usize,
    pub declarations_removed: usize,
    pub passes: usize,
    pub converged: bool,
}

impl TransformStats {
    pub fn rewrites(&self) -> usize {
        self.optional_chains + self.nullish_coalescing
    }

    /// Fold another document's statistics into this one
    pub fn merge(&mut self, other: &TransformStats) {
        self.optional_chains += other.optional_chains;
        self.nullish_coalescing += other.nullish_coalescing;
        self.declarations_removed += other.declarations_removed;
        self.passes = self.passes.max(other.passes);
        self.converged &= other.converged;
    }
}

/// Context shared by the passes run over one document
#[derive(Debug, Clone, Default)]
pub struct TransformContext {
    pub options: TransformOptions,
    pub stats: TransformStats,
}

impl TransformContext {
    pub fn new(options: TransformOptions) -> Self {
        Self {
            options,
            stats: TransformStats::default(),
        }
    }
}

/// Run every pass in order
pub fn run_transforms<'a>(
    transforms: &mut [Box<dyn Transform + Send>],
    ast_builder: AstBuilder<'a>,
    program: &mut Program<'a>,
    ctx: &mut TransformContext,
) {
    for transform in transforms.iter_mut() {
        if !transform.should_run(ctx) {
            log::debug!("Skipping transform {}", transform.name());
            continue;
        }
        log::debug!("Running transform {}", transform.name());
        transform.run(ast_builder, program, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = TransformOptions::default();
        assert_eq!(options.max_passes, 5);
        assert!(options.loose_falsy_leaves);
        assert!(!options.false_leaves);
        assert!(options.nullish_coalescing);
    }

    #[test]
    fn test_merge_stats() {
        let mut total = TransformStats {
            converged: true,
            ..Default::default()
        };
        total.merge(&TransformStats {
            optional_chains: 2,
            nullish_coalescing: 1,
            declarations_removed: 3,
            passes: 2,
            converged: true,
        });
        total.merge(&TransformStats {
            optional_chains: 1,
            passes: 5,
            converged: false,
            ..Default::default()
        });
        assert_eq!(total.rewrites(), 4);
        assert_eq!(total.declarations_removed, 3);
        assert_eq!(total.passes, 5);
        assert!(!total.converged);
    }
}
