//! Optional chain synthesis from a decision tree
//!
//! The walk follows false branches, where evaluation continues past each
//! guard. Every guard found on the way becomes one optional link once the
//! expression below it has been rebuilt, innermost guard first.

use oxc_allocator::CloneIn;
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_span::{ContentEq, SPAN};

use super::decision_tree::{DecisionTree, ShortCircuit};
use super::rewriter::{assigned_names, fold, rewrite};
use crate::js::expr::{
    is_false_literal, is_nullish_literal, is_true_literal, is_undefined_value, simple_assignment,
};
use crate::js::references::ReferenceCounter;
use crate::transforms::TransformOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compared {
    Null,
    Undefined,
}

/// A comparison of a value against `null` or `undefined`, in any operand order
#[derive(Debug, Clone, Copy)]
pub struct NullCheck<'e, 'a> {
    pub operand: &'e Expression<'a>,
    pub compared: Compared,
    pub strict: bool,
    /// `!=` / `!==`
    pub negated: bool,
}

impl<'e, 'a> NullCheck<'e, 'a> {
    pub fn parse(condition: &'e Expression<'a>) -> Option<Self> {
        let Expression::BinaryExpression(binary) = condition else {
            return None;
        };
        let (strict, negated) = match binary.operator {
            BinaryOperator::Equality => (false, false),
            BinaryOperator::StrictEquality => (true, false),
            BinaryOperator::Inequality => (false, true),
            BinaryOperator::StrictInequality => (true, true),
            _ => return None,
        };
        let (operand, literal) = if is_nullish_literal(&binary.right) {
            (&binary.left, &binary.right)
        } else if is_nullish_literal(&binary.left) {
            (&binary.right, &binary.left)
        } else {
            return None;
        };
        if !is_checkable(operand) {
            return None;
        }
        Some(Self {
            operand,
            compared: if literal.is_null() {
                Compared::Null
            } else {
                Compared::Undefined
            },
            strict,
            negated,
        })
    }

    /// Expression the guarded branch reads: the temporary for `(t = x)`
    pub fn token(&self, ast_builder: AstBuilder<'a>) -> Expression<'a> {
        match self.temporary() {
            Some(name) => ast_builder.expression_identifier(SPAN, name),
            None => self.operand.clone_in(ast_builder.allocator),
        }
    }

    /// Expression that ends up in front of the optional link
    pub fn target(&self) -> &'e Expression<'a> {
        simple_assignment(self.operand).map_or(self.operand, |(_, value)| value)
    }

    pub fn temporary(&self) -> Option<&'a str> {
        simple_assignment(self.operand).map(|(name, _)| name)
    }
}

fn is_checkable(operand: &Expression<'_>) -> bool {
    match operand {
        Expression::Identifier(ident) => ident.name != "undefined",
        Expression::ThisExpression(_) => true,
        other => other.is_member_expression() || simple_assignment(other).is_some(),
    }
}

/// `x != null` style test; a tree rooted at one is negated before construction
pub fn is_not_null_check(condition: &Expression<'_>) -> bool {
    NullCheck::parse(condition).is_some_and(|check| check.negated)
}

/// Result of a construction. `matched` is set only when at least one guard
/// became an optional link.
#[derive(Debug)]
pub struct Constructed<'a> {
    pub expr: Expression<'a>,
    pub matched: bool,
    /// Temporaries whose assignments the result no longer needs
    pub consumed: Vec<String>,
}

/// What a guard's short-circuit branch must evaluate to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expectation {
    /// `a?.b` yields `undefined`
    Nullish,
    /// `delete a?.b` yields `true`
    Truthy,
}

enum Seek<'a> {
    Null,
    /// A strict `=== null` was seen, its `=== undefined` partner must follow
    Undefined(Expression<'a>),
}

pub struct ChainConstructor<'a> {
    ast_builder: AstBuilder<'a>,
    expectation: Expectation,
    loose: bool,
    false_leaves: bool,
}

impl<'a> ChainConstructor<'a> {
    pub fn new(
        ast_builder: AstBuilder<'a>,
        tree: &DecisionTree<'a>,
        options: &TransformOptions,
    ) -> Self {
        let deepest = tree.deepest_false_leaf();
        let is_delete = deepest.short_circuit.is_none()
            && matches!(
                &deepest.condition,
                Expression::UnaryExpression(unary) if unary.operator == UnaryOperator::Delete
            );
        Self {
            ast_builder,
            expectation: if is_delete {
                Expectation::Truthy
            } else {
                Expectation::Nullish
            },
            loose: options.loose_falsy_leaves,
            false_leaves: options.false_leaves,
        }
    }

    pub fn construct(&self, tree: &DecisionTree<'a>) -> Option<Constructed<'a>> {
        self.walk(tree, Seek::Null)
    }

    fn walk(&self, node: &DecisionTree<'a>, seek: Seek<'a>) -> Option<Constructed<'a>> {
        let (Some(on_true), Some(on_false)) =
            (node.true_branch.as_deref(), node.false_branch.as_deref())
        else {
            return match seek {
                Seek::Null => Some(self.leaf(node)),
                Seek::Undefined(_) => None,
            };
        };

        match seek {
            Seek::Undefined(token) => {
                let check = NullCheck::parse(&node.condition)?;
                if check.negated
                    || check.compared != Compared::Undefined
                    || !check.token(self.ast_builder).content_eq(&token)
                    || !self.accepts(on_true)
                {
                    log::trace!("Unpaired strict null check, leaving the candidate");
                    return None;
                }
                self.walk(on_false, Seek::Null)
            }
            Seek::Null => match NullCheck::parse(&node.condition) {
                Some(check)
                    if !check.negated && (!check.strict || check.compared == Compared::Null) =>
                {
                    self.guard(&check, on_true, on_false)
                }
                _ => self.collapse(node, on_true, on_false),
            },
        }
    }

    /// One null check: rebuild what is below it, then make the access on the
    /// checked value optional
    fn guard(
        &self,
        check: &NullCheck<'_, 'a>,
        on_true: &DecisionTree<'a>,
        on_false: &DecisionTree<'a>,
    ) -> Option<Constructed<'a>> {
        if !self.accepts(on_true) {
            return None;
        }
        let token = check.token(self.ast_builder);
        let next = if check.strict {
            Seek::Undefined(token.clone_in(self.ast_builder.allocator))
        } else {
            Seek::Null
        };
        let rest = self.walk(on_false, next)?;

        let rewritten = rewrite(self.ast_builder, &rest.expr, &token, Some(check.target()));
        if !rewritten.matched {
            return None;
        }

        let mut expr = rewritten.expr;
        let mut consumed = rest.consumed;
        if let Some(name) = check.temporary() {
            if ReferenceCounter::in_expression(name, &expr) > 0 {
                // Later reads still need the value, keep the assignment inline
                expr = rewrite(self.ast_builder, &rest.expr, &token, Some(check.operand)).expr;
            }
            consumed.push(name.to_string());
        }

        let (expr, folded) = fold_assignments(self.ast_builder, expr);
        consumed.extend(folded);
        Some(Constructed {
            expr,
            matched: true,
            consumed,
        })
    }

    /// A test that decides the value by itself: `c || rest`
    fn collapse(
        &self,
        node: &DecisionTree<'a>,
        on_true: &DecisionTree<'a>,
        on_false: &DecisionTree<'a>,
    ) -> Option<Constructed<'a>> {
        let yields_condition = on_true.is_leaf()
            && on_true.short_circuit == Some(ShortCircuit::Truthy)
            && on_true.condition.content_eq(&node.condition);
        if !yields_condition {
            return None;
        }
        let rest = self.walk(on_false, Seek::Null)?;
        Some(Constructed {
            expr: self.ast_builder.expression_logical(
                SPAN,
                node.condition.clone_in(self.ast_builder.allocator),
                LogicalOperator::Or,
                rest.expr,
            ),
            matched: rest.matched,
            consumed: rest.consumed,
        })
    }

    fn leaf(&self, node: &DecisionTree<'a>) -> Constructed<'a> {
        let value = node.condition.clone_in(self.ast_builder.allocator);
        let (expr, consumed) = fold_assignments(self.ast_builder, value);
        Constructed {
            expr,
            matched: false,
            consumed,
        }
    }

    /// Whether a guard's true branch is what the optional form evaluates to
    /// when it short-circuits. `false` leaves need their own opt-in on top of
    /// loose mode, since `a?.b` never yields `false`.
    fn accepts(&self, branch: &DecisionTree<'a>) -> bool {
        if !branch.is_leaf() {
            return false;
        }
        let value = &branch.condition;
        match (self.expectation, branch.short_circuit) {
            (Expectation::Nullish, Some(ShortCircuit::Falsy)) => self.loose,
            (Expectation::Nullish, None) => {
                is_undefined_value(value)
                    || (self.loose
                        && (value.is_null() || (self.false_leaves && is_false_literal(value))))
            }
            (Expectation::Truthy, Some(ShortCircuit::Truthy)) => true,
            (Expectation::Truthy, None) => is_true_literal(value),
            _ => false,
        }
    }
}

/// Fold every temporary assigned inside `expr` that nothing else in it reads
pub fn fold_assignments<'a>(
    ast_builder: AstBuilder<'a>,
    mut expr: Expression<'a>,
) -> (Expression<'a>, Vec<String>) {
    let mut folded = Vec::new();
    for name in assigned_names(&expr) {
        let candidate = fold(ast_builder, &expr, &name);
        if ReferenceCounter::in_expression(&name, &candidate) == 0 {
            expr = candidate;
            folded.push(name);
        }
    }
    (expr, folded)
}
