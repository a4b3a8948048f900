//! unminify-rs: reconstruct optional chaining and nullish coalescing
//!
//! This library parses JavaScript that a transpiler has lowered for older
//! targets, rebuilds `?.` and `??` from their expanded conditional forms, and
//! prints the result back as source text.

pub mod cli;
pub mod error;
pub mod js;
pub mod transforms;
pub mod unminifier;

pub use error::{Error as UnminifyError, Result as UnminifyResult};
pub use unminifier::{Unminified, Unminifier, UnminifyOptions};

// Re-export commonly used types
pub use js::{parse_expression, parse_program, print_expression, print_program};
pub use transforms::{TransformContext, TransformOptions, TransformStats};
