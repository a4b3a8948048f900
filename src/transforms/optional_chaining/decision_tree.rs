//! Decision trees over short-circuit expressions
//!
//! A conditional or logical expression is flattened into a binary tree whose
//! internal nodes each test one atomic condition. Compound tests are split so
//! that `(p && q) ? t : f` becomes `p ? (q ? t : f) : f`, which puts every
//! null or undefined comparison on its own node.

use oxc_allocator::CloneIn;
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_span::SPAN;

use crate::js::expr::{is_short_circuit, not};

/// Synthetic leaves produced by `&&` and `||`: the expression yields the value
/// of the operand that stopped evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortCircuit {
    /// Left operand of `&&` was falsy
    Falsy,
    /// Left operand of `||` was truthy
    Truthy,
}

#[derive(Debug)]
pub struct DecisionTree<'a> {
    /// Test of an internal node, or the value a leaf yields
    pub condition: Expression<'a>,
    pub true_branch: Option<Box<DecisionTree<'a>>>,
    pub false_branch: Option<Box<DecisionTree<'a>>>,
    pub short_circuit: Option<ShortCircuit>,
}

impl<'a> DecisionTree<'a> {
    pub fn leaf(value: Expression<'a>) -> Self {
        Self {
            condition: value,
            true_branch: None,
            false_branch: None,
            short_circuit: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.true_branch.is_none() && self.false_branch.is_none()
    }

    /// Build the tree of a conditional, `&&` or `||` expression
    pub fn build(ast_builder: AstBuilder<'a>, expr: &Expression<'a>) -> Option<Self> {
        if !is_short_circuit(expr) {
            return None;
        }
        Some(Self::value(ast_builder, expr))
    }

    /// Tree for an expression in value position
    fn value(ast_builder: AstBuilder<'a>, expr: &Expression<'a>) -> Self {
        match expr {
            Expression::ConditionalExpression(conditional) => Self::test(
                ast_builder,
                &conditional.test,
                Some(Self::value(ast_builder, &conditional.consequent)),
                Some(Self::value(ast_builder, &conditional.alternate)),
            ),
            Expression::LogicalExpression(logical) if logical.operator == LogicalOperator::And => {
                Self::test(
                    ast_builder,
                    &logical.left,
                    Some(Self::value(ast_builder, &logical.right)),
                    None,
                )
            }
            Expression::LogicalExpression(logical) if logical.operator == LogicalOperator::Or => {
                Self::test(
                    ast_builder,
                    &logical.left,
                    None,
                    Some(Self::value(ast_builder, &logical.right)),
                )
            }
            other => Self::leaf(other.clone_in(ast_builder.allocator)),
        }
    }

    /// Tree for an expression in test position. A missing branch becomes the
    /// short-circuit leaf of whichever atomic condition decided it.
    fn test(
        ast_builder: AstBuilder<'a>,
        condition: &Expression<'a>,
        on_true: Option<Self>,
        on_false: Option<Self>,
    ) -> Self {
        match condition {
            Expression::LogicalExpression(logical) if logical.operator == LogicalOperator::And => {
                let shared = on_false.as_ref().map(|tree| tree.duplicate(ast_builder));
                let rest = Self::test(ast_builder, &logical.right, on_true, shared);
                Self::test(ast_builder, &logical.left, Some(rest), on_false)
            }
            Expression::LogicalExpression(logical) if logical.operator == LogicalOperator::Or => {
                let shared = on_true.as_ref().map(|tree| tree.duplicate(ast_builder));
                let rest = Self::test(ast_builder, &logical.right, shared, on_false);
                Self::test(ast_builder, &logical.left, on_true, Some(rest))
            }
            atomic => {
                let short_circuit = |kind| Self {
                    short_circuit: Some(kind),
                    ..Self::leaf(atomic.clone_in(ast_builder.allocator))
                };
                Self {
                    condition: atomic.clone_in(ast_builder.allocator),
                    true_branch: Some(Box::new(
                        on_true.unwrap_or_else(|| short_circuit(ShortCircuit::Truthy)),
                    )),
                    false_branch: Some(Box::new(
                        on_false.unwrap_or_else(|| short_circuit(ShortCircuit::Falsy)),
                    )),
                    short_circuit: None,
                }
            }
        }
    }

    /// Deep copy into the same arena
    pub fn duplicate(&self, ast_builder: AstBuilder<'a>) -> Self {
        Self {
            condition: self.condition.clone_in(ast_builder.allocator),
            true_branch: self
                .true_branch
                .as_ref()
                .map(|branch| Box::new(branch.duplicate(ast_builder))),
            false_branch: self
                .false_branch
                .as_ref()
                .map(|branch| Box::new(branch.duplicate(ast_builder))),
            short_circuit: self.short_circuit,
        }
    }

    /// De Morgan dual: every test negated and every pair of branches swapped.
    /// Leaves keep their values, so the dual evaluates to the same result.
    pub fn negate(&self, ast_builder: AstBuilder<'a>) -> Self {
        if self.is_leaf() {
            return self.duplicate(ast_builder);
        }
        Self {
            condition: negate_condition(ast_builder, &self.condition),
            true_branch: self
                .false_branch
                .as_ref()
                .map(|branch| Box::new(branch.negate(ast_builder))),
            false_branch: self
                .true_branch
                .as_ref()
                .map(|branch| Box::new(branch.negate(ast_builder))),
            short_circuit: None,
        }
    }

    /// The leaf reached by taking the false branch at every node
    pub fn deepest_false_leaf(&self) -> &DecisionTree<'a> {
        let mut node = self;
        while let Some(next) = node.false_branch.as_deref() {
            node = next;
        }
        node
    }
}

/// Logical negation that flips equality operators and removes a leading `!`
pub fn negate_condition<'a>(
    ast_builder: AstBuilder<'a>,
    condition: &Expression<'a>,
) -> Expression<'a> {
    match condition {
        Expression::BinaryExpression(binary) => match negated_equality(binary.operator) {
            Some(operator) => ast_builder.expression_binary(
                binary.span,
                binary.left.clone_in(ast_builder.allocator),
                operator,
                binary.right.clone_in(ast_builder.allocator),
            ),
            None => not(ast_builder, condition.clone_in(ast_builder.allocator)),
        },
        Expression::UnaryExpression(unary) if unary.operator == UnaryOperator::LogicalNot => {
            unary.argument.clone_in(ast_builder.allocator)
        }
        Expression::LogicalExpression(logical) if logical.operator != LogicalOperator::Coalesce => {
            let operator = match logical.operator {
                LogicalOperator::And => LogicalOperator::Or,
                _ => LogicalOperator::And,
            };
            ast_builder.expression_logical(
                SPAN,
                negate_condition(ast_builder, &logical.left),
                operator,
                negate_condition(ast_builder, &logical.right),
            )
        }
        other => not(ast_builder, other.clone_in(ast_builder.allocator)),
    }
}

fn negated_equality(operator: BinaryOperator) -> Option<BinaryOperator> {
    match operator {
        BinaryOperator::Equality => Some(BinaryOperator::Inequality),
        BinaryOperator::Inequality => Some(BinaryOperator::Equality),
        BinaryOperator::StrictEquality => Some(BinaryOperator::StrictInequality),
        BinaryOperator::StrictInequality => Some(BinaryOperator::StrictEquality),
        _ => None,
    }
}
