//! Declaration cleanup for temporaries that a rewrite made dead

use std::collections::HashSet;

use oxc_allocator::Vec as ArenaVec;
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_ast_visit::{walk, Visit};
use oxc_span::SPAN;
use oxc_syntax::scope::ScopeFlags;

use crate::js::expr::is_side_effect_free;
use crate::js::references::ReferenceCounter;

/// Outcome of [`ScopeCleaner::remove_unused`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// This many declarators were deleted
    Removed(usize),
    /// Declared here but still needed
    Retained,
    /// Not declared in this scope
    Unbound,
}

/// Names declared directly in one function scope
#[derive(Debug, Default)]
pub struct ScopeDeclarations {
    pub variables: HashSet<String>,
    pub functions: HashSet<String>,
}

impl ScopeDeclarations {
    pub fn collect(body: &[Statement<'_>]) -> Self {
        let mut declarations = Self::default();
        for statement in body {
            declarations.visit_statement(statement);
        }
        declarations
    }
}

impl<'a> Visit<'a> for ScopeDeclarations {
    // Nested functions open their own scopes
    fn visit_function(&mut self, it: &Function<'a>, _flags: ScopeFlags) {
        if it.is_declaration() {
            if let Some(id) = &it.id {
                self.functions.insert(id.name.to_string());
            }
        }
    }

    fn visit_arrow_function_expression(&mut self, _it: &ArrowFunctionExpression<'a>) {}

    fn visit_static_block(&mut self, _it: &StaticBlock<'a>) {}

    fn visit_variable_declarator(&mut self, it: &VariableDeclarator<'a>) {
        for id in it.id.get_binding_identifiers() {
            self.variables.insert(id.name.to_string());
        }
        walk::walk_variable_declarator(self, it);
    }
}

/// Names bound by a parameter list
pub fn parameter_names<'a>(params: &'a FormalParameters<'a>) -> impl Iterator<Item = String> + 'a {
    params
        .iter_bindings()
        .flat_map(|pattern| pattern.get_binding_identifiers())
        .map(|id| id.name.to_string())
}

/// Removes declarations of unreferenced names from one scope: a function's
/// parameter list and body, or the program body
pub struct ScopeCleaner<'s, 'a> {
    ast_builder: AstBuilder<'a>,
    params: Option<&'s FormalParameters<'a>>,
    body: &'s mut ArenaVec<'a, Statement<'a>>,
}

impl<'s, 'a> ScopeCleaner<'s, 'a> {
    pub fn new(
        ast_builder: AstBuilder<'a>,
        params: Option<&'s FormalParameters<'a>>,
        body: &'s mut ArenaVec<'a, Statement<'a>>,
    ) -> Self {
        Self {
            ast_builder,
            params,
            body,
        }
    }

    /// Delete every declarator of `name` if nothing in the scope reads or
    /// writes it anymore
    pub fn remove_unused(&mut self, name: &str) -> Removal {
        if let Some(params) = self.params {
            if parameter_names(params).any(|param| param == name)
                || ReferenceCounter::in_parameters(name, params) > 0
            {
                return Removal::Retained;
            }
        }

        let declarations = ScopeDeclarations::collect(self.body);
        if declarations.functions.contains(name) {
            return Removal::Retained;
        }
        if !declarations.variables.contains(name) {
            return Removal::Unbound;
        }

        let references = ReferenceCounter::in_statements(name, self.body);
        if references > 0 {
            log::trace!("Keeping `{}`: {} references remain", name, references);
            return Removal::Retained;
        }

        let mut initializers = InitializerCheck { name, pure: true };
        for statement in self.body.iter() {
            initializers.visit_statement(statement);
        }
        if !initializers.pure {
            log::trace!("Keeping `{}`: its initializer has side effects", name);
            return Removal::Retained;
        }

        let removed = prune_statements(self.ast_builder, self.body, name);
        if removed == 0 {
            // Bound by a pattern or a loop head, which are left alone
            return Removal::Retained;
        }
        log::trace!("Removed {} declarator(s) of `{}`", removed, name);
        Removal::Removed(removed)
    }
}

/// Whether every declarator of a name can be dropped without losing side effects
struct InitializerCheck<'n> {
    name: &'n str,
    pure: bool,
}

impl<'a> Visit<'a> for InitializerCheck<'_> {
    fn visit_function(&mut self, _it: &Function<'a>, _flags: ScopeFlags) {}

    fn visit_arrow_function_expression(&mut self, _it: &ArrowFunctionExpression<'a>) {}

    fn visit_variable_declarator(&mut self, it: &VariableDeclarator<'a>) {
        if declares(it, self.name) {
            if let Some(init) = &it.init {
                self.pure &= is_side_effect_free(init);
            }
        }
    }
}

fn declares(declarator: &VariableDeclarator<'_>, name: &str) -> bool {
    matches!(
        &declarator.id.kind,
        BindingPatternKind::BindingIdentifier(id) if id.name == name
    )
}

fn prune_declaration(declaration: &mut VariableDeclaration<'_>, name: &str) -> usize {
    let before = declaration.declarations.len();
    declaration
        .declarations
        .retain(|declarator| !declares(declarator, name));
    before - declaration.declarations.len()
}

fn is_emptied(statement: &Statement<'_>) -> bool {
    matches!(
        statement,
        Statement::VariableDeclaration(declaration) if declaration.declarations.is_empty()
    )
}

fn prune_statements<'a>(
    ast_builder: AstBuilder<'a>,
    statements: &mut ArenaVec<'a, Statement<'a>>,
    name: &str,
) -> usize {
    let removed = statements
        .iter_mut()
        .map(|statement| prune_statement(ast_builder, statement, name))
        .sum();
    statements.retain(|statement| !is_emptied(statement));
    removed
}

/// Prune a statement in a single-statement position
fn prune_single<'a>(ast_builder: AstBuilder<'a>, statement: &mut Statement<'a>, name: &str) -> usize {
    let removed = prune_statement(ast_builder, statement, name);
    if is_emptied(statement) {
        *statement = ast_builder.statement_empty(SPAN);
    }
    removed
}

fn prune_statement<'a>(ast_builder: AstBuilder<'a>, statement: &mut Statement<'a>, name: &str) -> usize {
    match statement {
        Statement::VariableDeclaration(declaration) => prune_declaration(declaration, name),
        Statement::IfStatement(s) => {
            prune_single(ast_builder, &mut s.consequent, name)
                + s.alternate
                    .as_mut()
                    .map_or(0, |alternate| prune_single(ast_builder, alternate, name))
        }
        Statement::BlockStatement(block) => prune_statements(ast_builder, &mut block.body, name),
        Statement::WhileStatement(s) => prune_single(ast_builder, &mut s.body, name),
        Statement::DoWhileStatement(s) => prune_single(ast_builder, &mut s.body, name),
        Statement::ForInStatement(s) => prune_single(ast_builder, &mut s.body, name),
        Statement::ForOfStatement(s) => prune_single(ast_builder, &mut s.body, name),
        Statement::ForStatement(s) => {
            let mut removed = 0;
            if let Some(ForStatementInit::VariableDeclaration(declaration)) = &mut s.init {
                removed += prune_declaration(declaration, name);
            }
            if matches!(
                &s.init,
                Some(ForStatementInit::VariableDeclaration(declaration)) if declaration.declarations.is_empty()
            ) {
                s.init = None;
            }
            removed + prune_single(ast_builder, &mut s.body, name)
        }
        Statement::SwitchStatement(s) => s
            .cases
            .iter_mut()
            .map(|case| prune_statements(ast_builder, &mut case.consequent, name))
            .sum(),
        Statement::TryStatement(s) => {
            prune_statements(ast_builder, &mut s.block.body, name)
                + s.handler.as_mut().map_or(0, |handler| {
                    prune_statements(ast_builder, &mut handler.body.body, name)
                })
                + s.finalizer.as_mut().map_or(0, |finalizer| {
                    prune_statements(ast_builder, &mut finalizer.body, name)
                })
        }
        Statement::LabeledStatement(s) => prune_single(ast_builder, &mut s.body, name),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::{parse_program, print_program};
    use oxc_allocator::Allocator;
    use oxc_span::SourceType;

    fn compact(code: &str) -> String {
        code.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn clean(source: &str, name: &str) -> (Removal, String) {
        let allocator = Allocator::default();
        let source = allocator.alloc_str(source);
        let mut program = parse_program(&allocator, source, SourceType::mjs()).unwrap();
        let removal =
            ScopeCleaner::new(AstBuilder::new(&allocator), None, &mut program.body).remove_unused(name);
        (removal, compact(&print_program(&program)))
    }

    #[test]
    fn test_removes_unreferenced_declarator() {
        let (removal, output) = clean("var t, n = 1;\nfoo(n);", "t");
        assert_eq!(removal, Removal::Removed(1));
        assert_eq!(output, "var n = 1; foo(n);");
    }

    #[test]
    fn test_removes_emptied_statement() {
        let (removal, output) = clean("var t;\nfoo();", "t");
        assert_eq!(removal, Removal::Removed(1));
        assert_eq!(output, "foo();");
    }

    #[test]
    fn test_keeps_referenced_declarator() {
        let (removal, output) = clean("var t;\nfoo(t);", "t");
        assert_eq!(removal, Removal::Retained);
        assert!(output.contains("var t;"));
    }

    #[test]
    fn test_keeps_side_effecting_initializer() {
        let (removal, _) = clean("var t = init();", "t");
        assert_eq!(removal, Removal::Retained);
    }

    #[test]
    fn test_unbound_name() {
        let (removal, _) = clean("function f() { var t; }", "t");
        assert_eq!(removal, Removal::Unbound);
    }

    #[test]
    fn test_pattern_binding_is_retained() {
        let (removal, output) = clean("var { t } = o;", "t");
        assert_eq!(removal, Removal::Retained);
        assert!(output.contains("t"));
    }

    #[test]
    fn test_parameter_is_retained() {
        let allocator = Allocator::default();
        let ast_builder = AstBuilder::new(&allocator);
        let mut program =
            parse_program(&allocator, "function f(e, t) { var n; }", SourceType::mjs()).unwrap();
        let Statement::FunctionDeclaration(func) = &mut program.body[0] else {
            panic!("expected a function declaration");
        };
        let func = &mut **func;
        let params = &*func.params;
        let body = &mut func.body.as_mut().unwrap().statements;
        let mut cleaner = ScopeCleaner::new(ast_builder, Some(params), body);
        assert_eq!(cleaner.remove_unused("t"), Removal::Retained);
        assert_eq!(cleaner.remove_unused("n"), Removal::Removed(1));
    }

    #[test]
    fn test_emptied_for_init_is_dropped() {
        let (removal, output) = clean("for (var t; ; ) {\n  break;\n}", "t");
        assert_eq!(removal, Removal::Removed(1));
        assert!(output.starts_with("for ("));
        assert!(!output.contains("var"));
    }

    #[test]
    fn test_single_statement_position_becomes_empty() {
        let (removal, output) = clean("if (x) var t;\nfoo();", "t");
        assert_eq!(removal, Removal::Removed(1));
        assert!(!output.contains("var"));
        assert!(output.contains("foo();"));
    }
}
