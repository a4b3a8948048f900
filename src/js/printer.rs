//! oxc back end

use oxc_allocator::{Allocator, CloneIn};
use oxc_ast::ast::{Expression, Program};
use oxc_ast::AstBuilder;
use oxc_codegen::Codegen;
use oxc_span::{SourceType, SPAN};

/// Generate source text for a whole document
pub fn print_program(program: &Program<'_>) -> String {
    Codegen::new().build(program).code
}

/// Generate source text for one expression, as it reads in an expression
/// statement but without the trailing semicolon
pub fn print_expression<'a>(allocator: &'a Allocator, expr: &Expression<'a>) -> String {
    let ast_builder = AstBuilder::new(allocator);
    let statement = ast_builder.statement_expression(SPAN, expr.clone_in(allocator));
    let program = ast_builder.program(
        SPAN,
        SourceType::mjs(),
        "",
        ast_builder.vec(),
        None,
        ast_builder.vec(),
        ast_builder.vec1(statement),
    );
    let code = print_program(&program);
    code.trim_end().trim_end_matches(';').to_string()
}
