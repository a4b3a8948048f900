//! Nullish coalescing recognizer
//!
//! Matches the exact expansion emitted for `root?.a?.b ?? fallback`:
//!
//! ```text
//! null !== (t = null == r || null === (n = r.a) || void 0 === n ? void 0 : n.b)
//!     && void 0 !== t ? t : fallback
//! ```
//!
//! The recognizer is deliberately narrow. Any deviation from the shape means
//! no match, and the general chain construction gets its turn.

use std::collections::{HashMap, HashSet};

use oxc_allocator::CloneIn;
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_span::SPAN;

use super::chain::{Compared, NullCheck};
use crate::js::expr::{enchain, identifier_name, is_undefined_value, simple_assignment, with_object};
use crate::js::references::ReferenceCounter;

/// One member access read through a temporary
#[derive(Debug, Clone, Copy)]
pub struct PropertyAccess<'e, 'a> {
    pub member: &'e MemberExpression<'a>,
    pub is_computed: bool,
}

impl<'e, 'a> PropertyAccess<'e, 'a> {
    fn new(member: &'e MemberExpression<'a>) -> Self {
        Self {
            member,
            is_computed: member.is_computed(),
        }
    }
}

/// A compiler-introduced `name = parent.property` assignment
#[derive(Debug)]
pub struct TemporaryBinding<'e, 'a> {
    pub name: &'a str,
    pub source: &'e Expression<'a>,
    pub parent: Option<&'a str>,
    /// Accesses from the parent to this temporary, outer to inner
    pub properties: Vec<PropertyAccess<'e, 'a>>,
}

/// A recognized coalescing expression
#[derive(Debug)]
pub struct Coalesced<'a> {
    pub expr: Expression<'a>,
    /// Temporaries the rewritten expression no longer assigns
    pub consumed: Vec<String>,
}

/// Recognize an expanded `??`, with or without an optional chain on its left
pub fn analyze<'a>(ast_builder: AstBuilder<'a>, expr: &Expression<'a>) -> Option<Coalesced<'a>> {
    let Expression::ConditionalExpression(conditional) = expr else {
        return None;
    };

    let Some((temporary, value)) = coalesce_guard(&conditional.test, &conditional.consequent)
    else {
        return bare_coalesce(ast_builder, conditional);
    };

    let (left, consumed) = match optional_chain(ast_builder, value) {
        Some((chain, mut consumed)) => {
            consumed.insert(0, temporary.to_string());
            (chain, consumed)
        }
        None => (
            value.clone_in(ast_builder.allocator),
            vec![temporary.to_string()],
        ),
    };

    // A fallback that reads a temporary still needs the assignment
    if consumed
        .iter()
        .any(|name| ReferenceCounter::in_expression(name, &conditional.alternate) > 0)
    {
        log::trace!("Fallback reads a coalescing temporary, leaving the candidate");
        return None;
    }

    Some(Coalesced {
        expr: ast_builder.expression_logical(
            SPAN,
            left,
            LogicalOperator::Coalesce,
            conditional.alternate.clone_in(ast_builder.allocator),
        ),
        consumed,
    })
}

/// Both halves of a strict `!== null && !== undefined` pair
fn is_strict_pair(first: &NullCheck<'_, '_>, second: &NullCheck<'_, '_>) -> bool {
    first.negated
        && second.negated
        && first.strict
        && second.strict
        && first.compared != second.compared
}

/// `null !== (t = v) && void 0 !== t ? t : ...` or `null != (t = v) ? t : ...`,
/// returning `t` and `v`
fn coalesce_guard<'e, 'a>(
    test: &'e Expression<'a>,
    consequent: &'e Expression<'a>,
) -> Option<(&'a str, &'e Expression<'a>)> {
    let temporary = identifier_name(consequent)?;
    match test {
        Expression::LogicalExpression(logical) if logical.operator == LogicalOperator::And => {
            let first = NullCheck::parse(&logical.left)?;
            let second = NullCheck::parse(&logical.right)?;
            if !is_strict_pair(&first, &second)
                || first.temporary() != Some(temporary)
                || identifier_name(second.operand) != Some(temporary)
            {
                return None;
            }
            Some((temporary, first.target()))
        }
        _ => {
            let check = NullCheck::parse(test)?;
            if !check.negated || check.strict || check.temporary() != Some(temporary) {
                return None;
            }
            Some((temporary, check.target()))
        }
    }
}

/// `null != x ? x : y` for an identifier `x`, no temporary involved
fn bare_coalesce<'a>(
    ast_builder: AstBuilder<'a>,
    conditional: &ConditionalExpression<'a>,
) -> Option<Coalesced<'a>> {
    let name = identifier_name(&conditional.consequent)?;
    let checked = match &conditional.test {
        Expression::LogicalExpression(logical) if logical.operator == LogicalOperator::And => {
            let first = NullCheck::parse(&logical.left)?;
            let second = NullCheck::parse(&logical.right)?;
            is_strict_pair(&first, &second)
                && identifier_name(first.operand) == Some(name)
                && identifier_name(second.operand) == Some(name)
        }
        test => {
            let check = NullCheck::parse(test)?;
            check.negated && !check.strict && identifier_name(check.operand) == Some(name)
        }
    };
    if !checked {
        return None;
    }
    Some(Coalesced {
        expr: ast_builder.expression_logical(
            SPAN,
            conditional.consequent.clone_in(ast_builder.allocator),
            LogicalOperator::Coalesce,
            conditional.alternate.clone_in(ast_builder.allocator),
        ),
        consumed: Vec::new(),
    })
}

/// `null == r || null === (n = r.a) || void 0 === n ? void 0 : n.b`
/// becomes `r?.a?.b`
fn optional_chain<'a>(
    ast_builder: AstBuilder<'a>,
    value: &Expression<'a>,
) -> Option<(Expression<'a>, Vec<String>)> {
    let Expression::ConditionalExpression(conditional) = value else {
        return None;
    };
    if !is_undefined_value(&conditional.consequent) {
        return None;
    }
    let terminal = conditional.alternate.as_member_expression()?;

    let mut guards = Vec::new();
    flatten_or(&conditional.test, &mut guards);

    let mut root: Option<&'a str> = None;
    let mut bindings: HashMap<&'a str, TemporaryBinding<'_, 'a>> = HashMap::new();
    let mut order = Vec::new();
    let mut checked = HashSet::new();

    for guard in guards {
        let check = NullCheck::parse(guard)?;
        if check.negated {
            return None;
        }
        if let Some(name) = identifier_name(check.operand) {
            if root.is_none() && bindings.is_empty() {
                root = Some(name);
            } else if root != Some(name) && !bindings.contains_key(name) {
                return None;
            }
            checked.insert(name);
            continue;
        }

        let (name, source) = simple_assignment(check.operand)?;
        let member = source.as_member_expression()?;
        if member.optional() {
            return None;
        }
        let parent = identifier_name(member.object())?;
        if root != Some(parent) && !bindings.contains_key(parent) {
            return None;
        }
        if bindings.contains_key(name) || root == Some(name) {
            return None;
        }
        bindings.insert(
            name,
            TemporaryBinding {
                name,
                source,
                parent: Some(parent),
                properties: vec![PropertyAccess::new(member)],
            },
        );
        order.push(name.to_string());
        if check.compared == Compared::Null || !check.strict {
            checked.insert(name);
        }
    }

    let root = root?;

    // Walk from the terminal access back to the root, collecting accesses
    let terminal_object = identifier_name(terminal.object())?;
    let mut accesses = vec![(terminal_object, PropertyAccess::new(terminal))];
    let mut current = terminal_object;
    while current != root {
        let binding = bindings.get(current)?;
        let parent = binding.parent?;
        for access in binding.properties.iter().rev() {
            accesses.push((parent, *access));
        }
        current = parent;
    }
    accesses.reverse();

    let mut chain = ast_builder.expression_identifier(SPAN, root);
    for (object, access) in accesses {
        chain = with_object(ast_builder, access.member, chain, checked.contains(object));
    }
    Some((enchain(ast_builder, chain), order))
}

fn flatten_or<'e, 'a>(expr: &'e Expression<'a>, out: &mut Vec<&'e Expression<'a>>) {
    match expr {
        Expression::LogicalExpression(logical) if logical.operator == LogicalOperator::Or => {
            flatten_or(&logical.left, out);
            flatten_or(&logical.right, out);
        }
        other => out.push(other),
    }
}
