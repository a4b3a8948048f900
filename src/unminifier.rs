//! Main unminifier module
//!
//! This module orchestrates one document from source text back to source text:
//! parse, run the reconstruction passes, print.

use oxc_allocator::Allocator;
use oxc_ast::AstBuilder;
use oxc_span::SourceType;

use crate::error::Result;
use crate::js::{parse_program, print_program};
use crate::transforms::{
    run_transforms, OptionalChaining, Transform, TransformContext, TransformOptions,
    TransformStats,
};

/// Options for one unminifier run
#[derive(Debug, Clone, Default)]
pub struct UnminifyOptions {
    pub transform: TransformOptions,
}

impl UnminifyOptions {
    /// Create options from CLI arguments
    pub fn from_cli(
        max_passes: Option<usize>,
        strict_leaves: bool,
        false_leaves: bool,
        no_nullish: bool,
    ) -> Self {
        let defaults = TransformOptions::default();
        Self {
            transform: TransformOptions {
                max_passes: max_passes.unwrap_or(defaults.max_passes),
                loose_falsy_leaves: !strict_leaves,
                false_leaves,
                nullish_coalescing: !no_nullish,
            },
        }
    }
}

/// Output of one document
#[derive(Debug, Clone, PartialEq)]
pub struct Unminified {
    pub code: String,
    pub stats: TransformStats,
}

/// Main unminifier struct
#[derive(Debug, Clone, Default)]
pub struct Unminifier {
    options: UnminifyOptions,
}

impl Unminifier {
    /// Create a new unminifier
    pub fn new(options: UnminifyOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &UnminifyOptions {
        &self.options
    }

    /// Unminify an ES module
    pub fn unminify(&self, source: &str) -> Result<Unminified> {
        self.unminify_with_source_type(source, SourceType::mjs())
    }

    /// Unminify a document of the given source type
    pub fn unminify_with_source_type(
        &self,
        source: &str,
        source_type: SourceType,
    ) -> Result<Unminified> {
        let allocator = Allocator::default();
        let mut program = parse_program(&allocator, source, source_type)?;
        log::debug!("Parsed {} top-level statements", program.body.len());

        let mut ctx = TransformContext::new(self.options.transform.clone());
        let mut transforms = self.transforms();
        run_transforms(
            &mut transforms,
            AstBuilder::new(&allocator),
            &mut program,
            &mut ctx,
        );

        log::debug!(
            "Unminified document: {} rewrites in {} passes",
            ctx.stats.rewrites(),
            ctx.stats.passes
        );

        Ok(Unminified {
            code: print_program(&program),
            stats: ctx.stats,
        })
    }

    fn transforms(&self) -> Vec<Box<dyn Transform + Send>> {
        vec![Box::new(OptionalChaining)]
    }
}
