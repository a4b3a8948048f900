//! Token substitution along an expression's evaluation spine
//!
//! A guarded expression such as `t.b.c(1)` is rebuilt around the guarded value:
//! the first access made on the token turns into an optional link on the
//! target. Only the spine is walked (member objects, callees, `delete`/`void`
//! operands, assignment targets), because only accesses on the spine are
//! skipped by an optional chain.

use std::collections::HashMap;

use oxc_allocator::{CloneIn, TakeIn, Vec as ArenaVec};
use oxc_ast::ast::*;
use oxc_ast::{AstBuilder, NONE};
use oxc_ast_visit::{walk, walk_mut, Visit, VisitMut};
use oxc_span::{ContentEq, SPAN};
use oxc_syntax::scope::ScopeFlags;

use crate::js::expr::{
    assignment_target, enchain, identifier_name, is_assignable, set_member_optional,
    simple_assignment, unchain, with_object,
};
use crate::js::references::ReferenceCounter;

/// Result of a substitution. `matched` is set only when the token was found
/// and turned into an optional link.
#[derive(Debug)]
pub struct Rewritten<'a> {
    pub expr: Expression<'a>,
    pub matched: bool,
}

/// Substitute `target` for the first spine occurrence of `token` in `expr`,
/// making that access optional. Without a target the token stays in place.
pub fn rewrite<'a>(
    ast_builder: AstBuilder<'a>,
    expr: &Expression<'a>,
    token: &Expression<'a>,
    target: Option<&Expression<'a>>,
) -> Rewritten<'a> {
    let mut rewriter = Rewriter {
        ast_builder,
        token,
        target,
        matched: false,
    };
    let mut rebuilt = unchain(ast_builder, expr.clone_in(ast_builder.allocator));
    rewriter.spine(&mut rebuilt);
    Rewritten {
        expr: enchain(ast_builder, rebuilt),
        matched: rewriter.matched,
    }
}

enum Idiom<'a> {
    Rewritten(Expression<'a>),
    /// Recognized but not safely invertible
    Refused,
    None,
}

struct Rewriter<'r, 'a> {
    ast_builder: AstBuilder<'a>,
    token: &'r Expression<'a>,
    target: Option<&'r Expression<'a>>,
    matched: bool,
}

impl<'a> Rewriter<'_, 'a> {
    fn replacement(&self) -> Expression<'a> {
        self.target
            .unwrap_or(self.token)
            .clone_in(self.ast_builder.allocator)
    }

    fn is_token(&self, expr: &Expression<'a>) -> bool {
        expr.content_eq(self.token)
    }

    fn is_token_target(&self, target: &AssignmentTarget<'a>) -> bool {
        match (target, self.token) {
            (AssignmentTarget::AssignmentTargetIdentifier(left), Expression::Identifier(token)) => {
                left.name == token.name
            }
            (
                AssignmentTarget::StaticMemberExpression(left),
                Expression::StaticMemberExpression(token),
            ) => left.content_eq(token),
            (
                AssignmentTarget::ComputedMemberExpression(left),
                Expression::ComputedMemberExpression(token),
            ) => left.content_eq(token),
            (
                AssignmentTarget::PrivateFieldExpression(left),
                Expression::PrivateFieldExpression(token),
            ) => left.content_eq(token),
            _ => false,
        }
    }

    fn spine(&mut self, expr: &mut Expression<'a>) {
        if let Expression::CallExpression(call) = &*expr {
            match self.call_idiom(call) {
                Idiom::Rewritten(call) => {
                    self.matched = true;
                    *expr = call;
                    return;
                }
                Idiom::Refused => return,
                Idiom::None => {}
            }
        }

        match expr {
            Expression::StaticMemberExpression(_)
            | Expression::ComputedMemberExpression(_)
            | Expression::PrivateFieldExpression(_) => {
                let on_token = expr
                    .as_member_expression()
                    .is_some_and(|member| self.is_token(member.object()));
                if on_token {
                    let object = unchain(self.ast_builder, self.replacement());
                    if let Some(member) = expr.as_member_expression_mut() {
                        *member.object_mut() = object;
                    }
                    set_member_optional(expr, true);
                    self.matched = true;
                } else if let Some(member) = expr.as_member_expression_mut() {
                    self.spine(member.object_mut());
                }
            }
            Expression::CallExpression(call) => {
                if self.is_token(&call.callee) {
                    call.callee = self.unbound_callee();
                    call.optional = true;
                    self.matched = true;
                } else {
                    self.spine(&mut call.callee);
                }
            }
            Expression::UnaryExpression(unary)
                if matches!(unary.operator, UnaryOperator::Delete | UnaryOperator::Void) =>
            {
                let mut argument = unchain(self.ast_builder, unary.argument.take_in(self.ast_builder));
                self.spine(&mut argument);
                unary.argument = enchain(self.ast_builder, argument);
            }
            Expression::AssignmentExpression(assign) if self.is_token_target(&assign.left) => {
                let replacement = self.replacement();
                if !is_assignable(&replacement) {
                    return;
                }
                if let Ok(left) = assignment_target(replacement) {
                    assign.left = left;
                    self.matched = true;
                }
            }
            _ => {}
        }
    }

    /// Callee for a direct call of the token. A temporary holding a method
    /// was called without a receiver, so a member target is wrapped in
    /// `(0, target)` to keep `this` unbound.
    fn unbound_callee(&self) -> Expression<'a> {
        let replacement = self.replacement();
        let member_like = match &replacement {
            Expression::ChainExpression(chain) => chain.expression.is_member_expression(),
            other => other.is_member_expression(),
        };
        if member_like && !self.is_token(&replacement) {
            return self.unbound(replacement);
        }
        replacement
    }

    /// `(0, expr)`
    fn unbound(&self, expr: Expression<'a>) -> Expression<'a> {
        self.ast_builder.expression_sequence(
            SPAN,
            self.ast_builder
                .vec_from_array([self.ast_builder.number_0(), expr]),
        )
    }

    fn optional_call(
        &self,
        callee: Expression<'a>,
        arguments: ArenaVec<'a, Argument<'a>>,
    ) -> Expression<'a> {
        self.ast_builder
            .expression_call(SPAN, callee, NONE, arguments, true)
    }

    fn call_idiom(&self, call: &CallExpression<'a>) -> Idiom<'a> {
        // `(0, t)(...)`
        if let Expression::SequenceExpression(sequence) = &call.callee {
            if let [zero, inner] = sequence.expressions.as_slice() {
                if zero.is_number_0() && self.is_token(inner) {
                    let callee = self.unbound(self.replacement());
                    let arguments = clone_arguments(self.ast_builder, &call.arguments);
                    return Idiom::Rewritten(self.optional_call(callee, arguments));
                }
            }
            return Idiom::None;
        }

        let Some((function, method)) = method_call(&call.callee) else {
            return Idiom::None;
        };
        let Some(receiver) = call.arguments.first().and_then(Argument::as_expression) else {
            return Idiom::None;
        };
        let rest = &call.arguments[1..];

        // `t.m.call(t, ...)`: the receiver is the token itself
        if let Some(member) = function.as_member_expression() {
            if self.is_token(member.object()) && self.is_token(receiver) {
                let object = unchain(self.ast_builder, self.replacement());
                let function = with_object(self.ast_builder, member, object, true);
                return match method {
                    "call" => Idiom::Rewritten(
                        self.optional_call(function, clone_arguments(self.ast_builder, rest)),
                    ),
                    "apply" => match spread_arguments(self.ast_builder, rest) {
                        Some(arguments) => Idiom::Rewritten(self.optional_call(function, arguments)),
                        None => Idiom::Refused,
                    },
                    _ => {
                        let bind = self.ast_builder.member_expression_static(
                            SPAN,
                            function,
                            self.ast_builder.identifier_name(SPAN, "bind"),
                            true,
                        );
                        Idiom::Rewritten(self.ast_builder.expression_call(
                            SPAN,
                            Expression::from(bind),
                            NONE,
                            clone_arguments(self.ast_builder, &call.arguments),
                            false,
                        ))
                    }
                };
            }
        }

        // `t.call(o, ...)` where the token holds the method `o.m`
        if method != "bind" && self.is_token(function) {
            let Some(target) = self.target else {
                return Idiom::None;
            };
            let Some(member) = target.as_member_expression() else {
                return Idiom::None;
            };
            if is_receiver_of(receiver, member.object()) {
                let callee = target.clone_in(self.ast_builder.allocator);
                return match method {
                    "call" => Idiom::Rewritten(
                        self.optional_call(callee, clone_arguments(self.ast_builder, rest)),
                    ),
                    _ => match spread_arguments(self.ast_builder, rest) {
                        Some(arguments) => Idiom::Rewritten(self.optional_call(callee, arguments)),
                        None => Idiom::Refused,
                    },
                };
            }
        }

        Idiom::None
    }
}

/// Split `f.call` / `f.apply` / `f.bind` into the function and the method name
fn method_call<'e, 'a>(callee: &'e Expression<'a>) -> Option<(&'e Expression<'a>, &'static str)> {
    let Expression::StaticMemberExpression(member) = callee else {
        return None;
    };
    if member.optional {
        return None;
    }
    let method = match member.property.name.as_str() {
        "call" => "call",
        "apply" => "apply",
        "bind" => "bind",
        _ => return None,
    };
    Some((&member.object, method))
}

/// Whether `receiver` is the `this` a method call on `object` would pass.
/// Only names and `this` qualify: any other receiver is evaluated again by
/// the explicit call and must stay.
fn is_receiver_of(receiver: &Expression<'_>, object: &Expression<'_>) -> bool {
    match (receiver, object) {
        (Expression::ThisExpression(_), Expression::ThisExpression(_)) => true,
        (Expression::Identifier(receiver), Expression::Identifier(object)) => {
            receiver.name == object.name
        }
        (Expression::Identifier(receiver), object) => {
            simple_assignment(object).is_some_and(|(name, _)| receiver.name == name)
        }
        _ => false,
    }
}

fn clone_arguments<'a>(
    ast_builder: AstBuilder<'a>,
    arguments: &[Argument<'a>],
) -> ArenaVec<'a, Argument<'a>> {
    ast_builder.vec_from_iter(
        arguments
            .iter()
            .map(|argument| argument.clone_in(ast_builder.allocator)),
    )
}

/// Arguments of a direct call equivalent to `.apply(this, ...rest)`
fn spread_arguments<'a>(
    ast_builder: AstBuilder<'a>,
    rest: &[Argument<'a>],
) -> Option<ArenaVec<'a, Argument<'a>>> {
    match rest {
        [] => Some(ast_builder.vec()),
        [Argument::ArrayExpression(array)] => {
            let mut arguments = ast_builder.vec_with_capacity(array.elements.len());
            for element in &array.elements {
                let argument = match element {
                    ArrayExpressionElement::SpreadElement(spread) => {
                        Argument::SpreadElement(spread.clone_in(ast_builder.allocator))
                    }
                    ArrayExpressionElement::Elision(_) => return None,
                    other => Argument::from(other.as_expression()?.clone_in(ast_builder.allocator)),
                };
                arguments.push(argument);
            }
            Some(arguments)
        }
        [Argument::SpreadElement(_)] => None,
        [list] => {
            let list = list.as_expression()?.clone_in(ast_builder.allocator);
            Some(ast_builder.vec1(ast_builder.argument_spread_element(SPAN, list)))
        }
        _ => None,
    }
}

/// Counts plain `name = value` assignments, outside nested functions
#[derive(Default)]
struct AssignmentCollector {
    counts: HashMap<String, usize>,
    order: Vec<String>,
}

impl<'a> Visit<'a> for AssignmentCollector {
    fn visit_assignment_expression(&mut self, it: &AssignmentExpression<'a>) {
        if it.operator == AssignmentOperator::Assign {
            if let AssignmentTarget::AssignmentTargetIdentifier(ident) = &it.left {
                let count = self.counts.entry(ident.name.to_string()).or_insert(0);
                if *count == 0 {
                    self.order.push(ident.name.to_string());
                }
                *count += 1;
            }
        }
        walk::walk_assignment_expression(self, it);
    }

    fn visit_function(&mut self, _it: &Function<'a>, _flags: ScopeFlags) {}

    fn visit_arrow_function_expression(&mut self, _it: &ArrowFunctionExpression<'a>) {}
}

/// Names assigned with `=` in `expr`, in order of first appearance
pub fn assigned_names(expr: &Expression<'_>) -> Vec<String> {
    let mut collector = AssignmentCollector::default();
    collector.visit_expression(expr);
    collector.order
}

pub fn assignment_count(expr: &Expression<'_>, name: &str) -> usize {
    let mut collector = AssignmentCollector::default();
    collector.visit_expression(expr);
    collector.counts.get(name).copied().unwrap_or(0)
}

/// Fold a temporary into the expression it was assigned from:
/// `(n = v).m.call(n, ...a)` becomes `v.m(...a)` and a remaining `(n = v)`
/// whose name is read nowhere else becomes `v`
pub fn fold<'a>(ast_builder: AstBuilder<'a>, expr: &Expression<'a>, name: &str) -> Expression<'a> {
    let mut folded = expr.clone_in(ast_builder.allocator);
    ReceiverFold { ast_builder, name }.visit_expression(&mut folded);
    if ReferenceCounter::in_expression(name, &folded) == assignment_count(&folded, name) {
        UnwrapAssignment { ast_builder, name }.visit_expression(&mut folded);
    }
    folded
}

struct ReceiverFold<'n, 'a> {
    ast_builder: AstBuilder<'a>,
    name: &'n str,
}

impl<'a> ReceiverFold<'_, 'a> {
    fn fold_call(&self, call: &CallExpression<'a>) -> Option<Expression<'a>> {
        let Expression::StaticMemberExpression(method) = &call.callee else {
            return None;
        };
        let function = method.object.as_member_expression()?;
        let (name, value) = simple_assignment(function.object())?;
        let receiver = call.arguments.first().and_then(Argument::as_expression);
        if name != self.name || receiver.and_then(identifier_name) != Some(self.name) {
            return None;
        }

        let rest = &call.arguments[1..];
        let arguments = match method.property.name.as_str() {
            "call" => clone_arguments(self.ast_builder, rest),
            "apply" => spread_arguments(self.ast_builder, rest)?,
            _ => return None,
        };
        let value = value.clone_in(self.ast_builder.allocator);
        let function = with_object(self.ast_builder, function, value, function.optional());
        Some(self.ast_builder.expression_call(
            SPAN,
            function,
            NONE,
            arguments,
            call.optional || method.optional,
        ))
    }
}

impl<'a> VisitMut<'a> for ReceiverFold<'_, 'a> {
    fn visit_expression(&mut self, it: &mut Expression<'a>) {
        let folded = match &*it {
            Expression::CallExpression(call) => self.fold_call(call),
            _ => None,
        };
        if let Some(folded) = folded {
            *it = folded;
        }
        walk_mut::walk_expression(self, it);
    }

    fn visit_chain_element(&mut self, it: &mut ChainElement<'a>) {
        let folded = match &*it {
            ChainElement::CallExpression(call) => self.fold_call(call),
            _ => None,
        };
        if let Some(Expression::CallExpression(call)) = folded {
            *it = ChainElement::CallExpression(call);
        }
        walk_mut::walk_chain_element(self, it);
    }

    fn visit_function(&mut self, _it: &mut Function<'a>, _flags: ScopeFlags) {}

    fn visit_arrow_function_expression(&mut self, _it: &mut ArrowFunctionExpression<'a>) {}
}

struct UnwrapAssignment<'n, 'a> {
    ast_builder: AstBuilder<'a>,
    name: &'n str,
}

impl<'a> VisitMut<'a> for UnwrapAssignment<'_, 'a> {
    fn visit_expression(&mut self, it: &mut Expression<'a>) {
        walk_mut::walk_expression(self, it);
        let unwrapped = match it {
            Expression::AssignmentExpression(assign)
                if assign.operator == AssignmentOperator::Assign
                    && matches!(&assign.left, AssignmentTarget::AssignmentTargetIdentifier(ident) if ident.name == self.name) =>
            {
                Some(assign.right.take_in(self.ast_builder))
            }
            _ => None,
        };
        if let Some(value) = unwrapped {
            *it = value;
        }
    }

    fn visit_function(&mut self, _it: &mut Function<'a>, _flags: ScopeFlags) {}

    fn visit_arrow_function_expression(&mut self, _it: &mut ArrowFunctionExpression<'a>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::{parse_expression, print_expression};
    use oxc_allocator::Allocator;

    fn substitute(source: &str, token: &str, target: &str) -> (String, bool) {
        let allocator = Allocator::default();
        let ast_builder = AstBuilder::new(&allocator);
        let source = allocator.alloc_str(source);
        let token = allocator.alloc_str(token);
        let target = allocator.alloc_str(target);
        let expr = parse_expression(&allocator, source).unwrap();
        let token = parse_expression(&allocator, token).unwrap();
        let target = parse_expression(&allocator, target).unwrap();
        let result = rewrite(ast_builder, &expr, &token, Some(&target));
        (print_expression(&allocator, &result.expr), result.matched)
    }

    fn folded(source: &str, name: &str) -> String {
        let allocator = Allocator::default();
        let source = allocator.alloc_str(source);
        let expr = parse_expression(&allocator, source).unwrap();
        let result = fold(AstBuilder::new(&allocator), &expr, name);
        print_expression(&allocator, &result)
    }

    #[test]
    fn test_member_on_token() {
        assert_eq!(substitute("t.b.c", "t", "a.x"), ("a.x?.b.c".to_string(), true));
        assert_eq!(substitute("a.b.c", "a.b", "a.b"), ("a.b?.c".to_string(), true));
        assert_eq!(substitute("t[k].c", "t", "a"), ("a?.[k].c".to_string(), true));
    }

    #[test]
    fn test_joins_existing_chain() {
        assert_eq!(substitute("t.b?.c", "t", "a"), ("a?.b?.c".to_string(), true));
        assert_eq!(substitute("t.c", "t", "a?.b"), ("a?.b?.c".to_string(), true));
    }

    #[test]
    fn test_no_spine_occurrence() {
        assert_eq!(substitute("f(t.b)", "t", "a"), ("f(t.b)".to_string(), false));
        assert_eq!(substitute("t.b + 1", "t", "a"), ("t.b + 1".to_string(), false));
    }

    #[test]
    fn test_call_with_token_receiver() {
        assert_eq!(
            substitute("t.m.call(t, 1, 2)", "t", "obj"),
            ("obj?.m?.(1, 2)".to_string(), true)
        );
    }

    #[test]
    fn test_call_of_method_temporary() {
        assert_eq!(
            substitute("t.call(o, 1)", "t", "o.m"),
            ("o.m?.(1)".to_string(), true)
        );
        assert_eq!(
            substitute("t.call(n)", "t", "(n = a.b).c"),
            ("(n = a.b).c?.()".to_string(), true)
        );
        assert_eq!(
            substitute("t.call(this)", "t", "this.m"),
            ("this.m?.()".to_string(), true)
        );
        // a different receiver keeps the explicit call
        assert_eq!(
            substitute("t.call(x, 1)", "t", "o.m"),
            ("o.m?.call(x, 1)".to_string(), true)
        );
    }

    #[test]
    fn test_side_effecting_receiver_is_kept() {
        assert_eq!(
            substitute("t.call(f(), 1)", "t", "f().m"),
            ("f().m?.call(f(), 1)".to_string(), true)
        );
        assert_eq!(
            substitute("t.apply(g(), [1])", "t", "g().m"),
            ("g().m?.apply(g(), [1])".to_string(), true)
        );
    }

    #[test]
    fn test_apply_forms() {
        assert_eq!(
            substitute("t.m.apply(t, [1, 2])", "t", "o"),
            ("o?.m?.(1, 2)".to_string(), true)
        );
        assert_eq!(
            substitute("t.m.apply(t, args)", "t", "o"),
            ("o?.m?.(...args)".to_string(), true)
        );
        assert_eq!(
            substitute("t.m.apply(t, ...rest)", "t", "o"),
            ("t.m.apply(t, ...rest)".to_string(), false)
        );
    }

    #[test]
    fn test_bind_becomes_optional_member() {
        assert_eq!(
            substitute("t.m.bind(t)", "t", "o"),
            ("o?.m?.bind(t)".to_string(), true)
        );
    }

    #[test]
    fn test_comma_guard_call() {
        assert_eq!(
            substitute("(0, t)(1)", "t", "a.b"),
            ("(0, a.b)?.(1)".to_string(), true)
        );
    }

    #[test]
    fn test_plain_call_of_token() {
        assert_eq!(substitute("t(1)", "t", "a.b"), ("(0, a.b)?.(1)".to_string(), true));
        assert_eq!(substitute("a.b(1)", "a.b", "a.b"), ("a.b?.(1)".to_string(), true));
        assert_eq!(substitute("t()", "t", "f"), ("f?.()".to_string(), true));
    }

    #[test]
    fn test_delete_operand() {
        assert_eq!(substitute("delete t.b", "t", "a"), ("delete a?.b".to_string(), true));
        assert_eq!(substitute("!t.b", "t", "a"), ("!t.b".to_string(), false));
    }

    #[test]
    fn test_assignment_target() {
        assert_eq!(substitute("t = 1", "t", "a.b"), ("a.b = 1".to_string(), true));
        assert_eq!(substitute("t = 1", "t", "f()"), ("t = 1".to_string(), false));
    }

    #[test]
    fn test_fold_receiver_temporary() {
        assert_eq!(folded("(n = a.b).c?.call(n, 1)", "n"), "a.b.c?.(1)");
        assert_eq!(folded("(n = a.b).c?.()", "n"), "a.b.c?.()");
        // still read elsewhere
        assert_eq!(folded("(n = a.b).c(n.d)", "n"), "(n = a.b).c(n.d)");
    }

    #[test]
    fn test_assigned_names() {
        let allocator = Allocator::default();
        let e = parse_expression(&allocator, "(t = a) && (n = t.b) && (t = 2)").unwrap();
        assert_eq!(assigned_names(&e), vec!["t".to_string(), "n".to_string()]);
        assert_eq!(assignment_count(&e, "t"), 2);
        assert_eq!(assignment_count(&e, "x"), 0);
    }
}
