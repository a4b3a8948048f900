//! Expression shapes shared by the reconstruction passes
//!
//! The passes build chains on "open" expressions, where an optional link may
//! sit on the spine without an enclosing `ChainExpression`. [`unchain`] opens
//! a chain and [`enchain`] closes it again once a rewrite is done.

use oxc_allocator::CloneIn;
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_span::SPAN;

pub fn is_literal(expr: &Expression<'_>) -> bool {
    matches!(
        expr,
        Expression::NullLiteral(_)
            | Expression::BooleanLiteral(_)
            | Expression::NumericLiteral(_)
            | Expression::StringLiteral(_)
            | Expression::BigIntLiteral(_)
    )
}

/// `undefined` or `void <literal>`
pub fn is_undefined_value(expr: &Expression<'_>) -> bool {
    match expr {
        Expression::UnaryExpression(unary) if unary.operator == UnaryOperator::Void => {
            is_literal(&unary.argument)
        }
        other => other.is_undefined(),
    }
}

pub fn is_nullish_literal(expr: &Expression<'_>) -> bool {
    expr.is_null() || is_undefined_value(expr)
}

/// `true` or `!0`
pub fn is_true_literal(expr: &Expression<'_>) -> bool {
    match expr {
        Expression::BooleanLiteral(lit) => lit.value,
        Expression::UnaryExpression(unary) if unary.operator == UnaryOperator::LogicalNot => {
            unary.argument.is_number_0()
        }
        _ => false,
    }
}

/// `false` or `!1`
pub fn is_false_literal(expr: &Expression<'_>) -> bool {
    match expr {
        Expression::BooleanLiteral(lit) => !lit.value,
        Expression::UnaryExpression(unary) if unary.operator == UnaryOperator::LogicalNot => {
            unary.argument.is_number_value(1.0)
        }
        _ => false,
    }
}

/// Whether evaluating the expression can be skipped without observable effect
pub fn is_side_effect_free(expr: &Expression<'_>) -> bool {
    match expr {
        Expression::Identifier(_)
        | Expression::ThisExpression(_)
        | Expression::FunctionExpression(_)
        | Expression::ArrowFunctionExpression(_)
        | Expression::RegExpLiteral(_) => true,
        Expression::UnaryExpression(unary) => {
            unary.operator != UnaryOperator::Delete && is_side_effect_free(&unary.argument)
        }
        Expression::TemplateLiteral(template) => template.expressions.iter().all(is_side_effect_free),
        Expression::ArrayExpression(array) => array.elements.iter().all(|element| match element {
            ArrayExpressionElement::SpreadElement(_) => false,
            ArrayExpressionElement::Elision(_) => true,
            other => other.as_expression().is_some_and(is_side_effect_free),
        }),
        other => is_literal(other),
    }
}

/// Conditional, `&&` or `||`
pub fn is_short_circuit(expr: &Expression<'_>) -> bool {
    match expr {
        Expression::ConditionalExpression(_) => true,
        Expression::LogicalExpression(logical) => logical.operator != LogicalOperator::Coalesce,
        _ => false,
    }
}

pub fn identifier_name<'a>(expr: &Expression<'a>) -> Option<&'a str> {
    match expr {
        Expression::Identifier(ident) => Some(ident.name.as_str()),
        _ => None,
    }
}

pub fn assignment_name<'a>(target: &AssignmentTarget<'a>) -> Option<&'a str> {
    match target {
        AssignmentTarget::AssignmentTargetIdentifier(ident) => Some(ident.name.as_str()),
        _ => None,
    }
}

/// `name = value`, with a plain `=`
pub fn simple_assignment<'e, 'a>(
    expr: &'e Expression<'a>,
) -> Option<(&'a str, &'e Expression<'a>)> {
    match expr {
        Expression::AssignmentExpression(assign)
            if assign.operator == AssignmentOperator::Assign =>
        {
            Some((assignment_name(&assign.left)?, &assign.right))
        }
        _ => None,
    }
}

/// Identifiers and member accesses outside an optional chain
pub fn is_assignable(expr: &Expression<'_>) -> bool {
    match expr {
        Expression::Identifier(_) => true,
        other => other.is_member_expression() && !has_optional_link(other),
    }
}

/// Turn an assignable expression into the left side of an assignment
pub fn assignment_target<'a>(expr: Expression<'a>) -> Result<AssignmentTarget<'a>, Expression<'a>> {
    match expr {
        Expression::Identifier(ident) => Ok(AssignmentTarget::AssignmentTargetIdentifier(ident)),
        Expression::StaticMemberExpression(member) => {
            Ok(AssignmentTarget::StaticMemberExpression(member))
        }
        Expression::ComputedMemberExpression(member) => {
            Ok(AssignmentTarget::ComputedMemberExpression(member))
        }
        Expression::PrivateFieldExpression(member) => {
            Ok(AssignmentTarget::PrivateFieldExpression(member))
        }
        other => Err(other),
    }
}

/// Whether a `?.` sits on the spine of `expr`. A nested `ChainExpression`
/// ends the spine, its links belong to a closed chain.
pub fn has_optional_link(expr: &Expression<'_>) -> bool {
    let mut current = expr;
    loop {
        current = match current {
            Expression::CallExpression(call) => {
                if call.optional {
                    return true;
                }
                &call.callee
            }
            Expression::TSNonNullExpression(non_null) => &non_null.expression,
            other => match other.as_member_expression() {
                Some(member) => {
                    if member.optional() {
                        return true;
                    }
                    member.object()
                }
                None => return false,
            },
        };
    }
}

/// Open a chain so that further links can join it
pub fn unchain<'a>(ast_builder: AstBuilder<'a>, expr: Expression<'a>) -> Expression<'a> {
    let Expression::ChainExpression(chain) = expr else {
        return expr;
    };
    match chain.unbox().expression {
        ChainElement::CallExpression(call) => Expression::CallExpression(call),
        ChainElement::StaticMemberExpression(member) => {
            Expression::StaticMemberExpression(member)
        }
        ChainElement::ComputedMemberExpression(member) => {
            Expression::ComputedMemberExpression(member)
        }
        ChainElement::PrivateFieldExpression(member) => Expression::PrivateFieldExpression(member),
        element @ ChainElement::TSNonNullExpression(_) => {
            ast_builder.expression_chain(SPAN, element)
        }
    }
}

/// Close an open chain
pub fn enchain<'a>(ast_builder: AstBuilder<'a>, expr: Expression<'a>) -> Expression<'a> {
    if !has_optional_link(&expr) {
        return expr;
    }
    match chain_element(expr) {
        Ok(element) => ast_builder.expression_chain(SPAN, element),
        Err(expr) => expr,
    }
}

fn chain_element<'a>(expr: Expression<'a>) -> Result<ChainElement<'a>, Expression<'a>> {
    match expr {
        Expression::CallExpression(call) => Ok(ChainElement::CallExpression(call)),
        Expression::StaticMemberExpression(member) => {
            Ok(ChainElement::StaticMemberExpression(member))
        }
        Expression::ComputedMemberExpression(member) => {
            Ok(ChainElement::ComputedMemberExpression(member))
        }
        Expression::PrivateFieldExpression(member) => {
            Ok(ChainElement::PrivateFieldExpression(member))
        }
        Expression::TSNonNullExpression(non_null) => Ok(ChainElement::TSNonNullExpression(non_null)),
        other => Err(other),
    }
}

/// The same access made on another object
pub fn with_object<'a>(
    ast_builder: AstBuilder<'a>,
    member: &MemberExpression<'a>,
    object: Expression<'a>,
    optional: bool,
) -> Expression<'a> {
    let mut member = member.clone_in(ast_builder.allocator);
    match &mut member {
        MemberExpression::StaticMemberExpression(m) => {
            m.object = object;
            m.optional = optional;
        }
        MemberExpression::ComputedMemberExpression(m) => {
            m.object = object;
            m.optional = optional;
        }
        MemberExpression::PrivateFieldExpression(m) => {
            m.object = object;
            m.optional = optional;
        }
    }
    Expression::from(member)
}

/// Set the optional flag of a member access in place
pub fn set_member_optional(expr: &mut Expression<'_>, optional: bool) {
    match expr {
        Expression::StaticMemberExpression(m) => m.optional = optional,
        Expression::ComputedMemberExpression(m) => m.optional = optional,
        Expression::PrivateFieldExpression(m) => m.optional = optional,
        _ => {}
    }
}

pub fn not<'a>(ast_builder: AstBuilder<'a>, expr: Expression<'a>) -> Expression<'a> {
    ast_builder.expression_unary(SPAN, UnaryOperator::LogicalNot, expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::{parse_expression, print_expression};
    use oxc_allocator::Allocator;

    #[test]
    fn test_literal_predicates() {
        let allocator = Allocator::default();
        let e = |s: &'static str| parse_expression(&allocator, s).unwrap();
        assert!(is_undefined_value(&e("void 0")));
        assert!(is_undefined_value(&e("undefined")));
        assert!(!is_undefined_value(&e("void f()")));
        assert!(is_nullish_literal(&e("null")));
        assert!(is_true_literal(&e("!0")));
        assert!(is_false_literal(&e("!1")));
        assert!(!is_false_literal(&e("0")));
        assert!(is_side_effect_free(&e("[1, a, void 0]")));
        assert!(!is_side_effect_free(&e("f()")));
        assert!(!is_side_effect_free(&e("delete a.b")));
    }

    #[test]
    fn test_optional_link_stops_at_closed_chain() {
        let allocator = Allocator::default();
        let ast_builder = AstBuilder::new(&allocator);
        let closed = parse_expression(&allocator, "(a?.b).c").unwrap();
        assert!(!has_optional_link(&closed));

        let open = unchain(ast_builder, parse_expression(&allocator, "a?.b.c").unwrap());
        assert!(has_optional_link(&open));
        let closed = enchain(ast_builder, open);
        assert!(matches!(closed, Expression::ChainExpression(_)));
        assert_eq!(print_expression(&allocator, &closed), "a?.b.c");
    }

    #[test]
    fn test_with_object() {
        let allocator = Allocator::default();
        let ast_builder = AstBuilder::new(&allocator);
        let access = parse_expression(&allocator, "t[k]").unwrap();
        let object = parse_expression(&allocator, "a.b").unwrap();
        let moved = with_object(
            ast_builder,
            access.as_member_expression().unwrap(),
            object,
            true,
        );
        let moved = enchain(ast_builder, moved);
        assert_eq!(print_expression(&allocator, &moved), "a.b?.[k]");
    }

    #[test]
    fn test_assignability() {
        let allocator = Allocator::default();
        let e = |s: &'static str| parse_expression(&allocator, s).unwrap();
        assert!(is_assignable(&e("a.b")));
        assert!(!is_assignable(&e("f()")));
        assert!(!is_assignable(&e("a?.b")));
        let assign = e("t = a.b");
        let (name, value) = simple_assignment(&assign).unwrap();
        assert_eq!(name, "t");
        assert!(value.is_member_expression());
    }
}
