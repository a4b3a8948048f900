//! JavaScript front and back end on the oxc stack, plus the expression
//! shapes the reconstruction passes share

pub mod expr;
pub mod parser;
pub mod printer;
pub mod references;

pub use parser::{parse_expression, parse_program};
pub use printer::{print_expression, print_program};
