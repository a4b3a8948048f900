//! oxc front end
//!
//! Parentheses are not kept as nodes. A chain the source closes with
//! parentheses, as in `(a?.b).c`, stays visible as a `ChainExpression` in
//! object or callee position.

use oxc_allocator::Allocator;
use oxc_ast::ast::{Expression, Program};
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;

use crate::error::{Error, Result};

fn parse_options() -> ParseOptions {
    ParseOptions {
        preserve_parens: false,
        ..ParseOptions::default()
    }
}

/// Parse a whole document into the arena
pub fn parse_program<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    source_type: SourceType,
) -> Result<Program<'a>> {
    let ret = Parser::new(allocator, source, source_type)
        .with_options(parse_options())
        .parse();
    if ret.panicked || !ret.errors.is_empty() {
        return Err(Error::parse(ret.errors.iter()));
    }

    log::trace!(
        "Parsed program with {} top-level statements",
        ret.program.body.len()
    );
    Ok(ret.program)
}

/// Parse a single expression
pub fn parse_expression<'a>(allocator: &'a Allocator, source: &'a str) -> Result<Expression<'a>> {
    Parser::new(allocator, source, SourceType::mjs())
        .with_options(parse_options())
        .parse_expression()
        .map_err(|errors| Error::parse(errors.iter()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parens_are_dropped() {
        let allocator = Allocator::default();
        let expr = parse_expression(&allocator, "((t = a.b))").unwrap();
        assert!(matches!(expr, Expression::AssignmentExpression(_)));
    }

    #[test]
    fn test_closed_chain_stays_a_chain() {
        let allocator = Allocator::default();
        let expr = parse_expression(&allocator, "(a?.b).c").unwrap();
        let Expression::StaticMemberExpression(member) = expr else {
            panic!("expected a member expression");
        };
        assert!(matches!(member.object, Expression::ChainExpression(_)));
    }

    #[test]
    fn test_syntax_error() {
        let allocator = Allocator::default();
        assert!(parse_program(&allocator, "x = (;", SourceType::mjs()).is_err());
        assert!(parse_expression(&allocator, "a ?").is_err());
    }
}
