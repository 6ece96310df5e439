//! `SetupSymbolTables` (§4.4, §6).
//!
//! Walks the whole AST once and attaches a fresh, empty [`SymbolTable`] —
//! via a freshly pushed [`ScopeId`] — to every scope-bearing node: module
//! body, method body, closure/lambda body, try-else body. No type work
//! happens here; `DefineType` is what calls `define`/`lookup` against the
//! tables this pass creates.

use inkoc_ast::{Arena, NodeId, NodeKind};
use inkoc_symbols::{ScopeArena, ScopeId};

/// Runs the pass starting from `root` (a `Module` node), returning the root
/// scope. Safe to call again on the same AST: scopes are pushed fresh each
/// time and `Arena::set_scope` simply overwrites the previous slot, so the
/// round-trip/idempotency property in §8 holds.
#[tracing::instrument(skip_all, fields(pass = "SetupSymbolTables"))]
pub fn run(ast: &mut Arena, scopes: &mut ScopeArena, root: NodeId) -> ScopeId {
    let root_scope = scopes.push(None);
    walk(ast, scopes, root, root_scope);
    root_scope
}

fn walk(ast: &mut Arena, scopes: &mut ScopeArena, id: NodeId, current: ScopeId) {
    let kind = ast.kind(id).clone();
    match kind {
        NodeKind::Module { body, .. } => {
            ast.set_scope(id, current.0);
            for child in body {
                walk(ast, scopes, child, current);
            }
        }
        NodeKind::BlockLiteral { body, .. } => {
            let inner = scopes.push(Some(current));
            ast.set_scope(id, inner.0);
            for child in body {
                walk(ast, scopes, child, inner);
            }
        }
        NodeKind::MethodDef { body: Some(body), .. } => {
            let inner = scopes.push(Some(current));
            ast.set_scope(id, inner.0);
            for child in body {
                walk(ast, scopes, child, inner);
            }
        }
        NodeKind::MethodDef { body: None, .. } => {
            // Required methods and other bodyless declarations open no scope.
        }
        NodeKind::Try {
            body,
            else_body,
            ..
        } => {
            walk(ast, scopes, body, current);
            if let Some(else_body) = else_body {
                let inner = scopes.push(Some(current));
                ast.set_scope(else_body, inner.0);
                walk(ast, scopes, else_body, inner);
            }
        }
        NodeKind::ObjectDef { body, .. } | NodeKind::TraitDef { body, .. } => {
            for child in body {
                walk(ast, scopes, child, current);
            }
        }
        NodeKind::TraitImpl { body, .. } => {
            for child in body {
                walk(ast, scopes, child, current);
            }
        }
        NodeKind::Call {
            receiver,
            positional_args,
            keyword_args,
            ..
        } => {
            if let Some(receiver) = receiver {
                walk(ast, scopes, receiver, current);
            }
            for arg in positional_args {
                walk(ast, scopes, arg, current);
            }
            for (_, arg) in keyword_args {
                walk(ast, scopes, arg, current);
            }
        }
        NodeKind::Let { value, .. } => walk(ast, scopes, value, current),
        NodeKind::Reassign { value, .. } => walk(ast, scopes, value, current),
        NodeKind::Cast { value, .. } => walk(ast, scopes, value, current),
        NodeKind::Dereference(value) => walk(ast, scopes, value, current),
        NodeKind::Return(Some(value)) => walk(ast, scopes, value, current),
        NodeKind::Throw(value) => walk(ast, scopes, value, current),
        NodeKind::ArrayLiteral(items) => {
            for item in items {
                walk(ast, scopes, item, current);
            }
        }
        NodeKind::RawInstruction { args, .. } => {
            for arg in args {
                walk(ast, scopes, arg, current);
            }
        }
        // Literals, constants, identifiers, attributes, globals, self, and
        // block-type signatures carry no nested scope-bearing children.
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkoc_ast::{BlockKind, Parameter};
    use inkoc_common::Span;

    #[test]
    fn every_block_literal_gets_its_own_scope() {
        let mut ast = Arena::new();
        let inner_lit = ast.push(NodeKind::IntegerLiteral(1), Span::new(0, 1));
        let block = ast.push(
            NodeKind::BlockLiteral {
                kind: BlockKind::Closure,
                parameters: Vec::<Parameter>::new(),
                return_type: None,
                throw_type: None,
                body: vec![inner_lit],
            },
            Span::new(0, 1),
        );
        let module = ast.push(
            NodeKind::Module {
                imports: Vec::new(),
                body: vec![block],
            },
            Span::new(0, 1),
        );

        let mut scopes = ScopeArena::new();
        let root = run(&mut ast, &mut scopes, module);

        assert_eq!(ast.scope_of(module), Some(root.0));
        let block_scope = ast.scope_of(block).unwrap();
        assert_ne!(block_scope, root.0);
    }

    #[test]
    fn rerunning_replaces_scopes_instead_of_appending() {
        let mut ast = Arena::new();
        let module = ast.push(
            NodeKind::Module {
                imports: Vec::new(),
                body: Vec::new(),
            },
            Span::new(0, 1),
        );
        let mut scopes = ScopeArena::new();
        let first = run(&mut ast, &mut scopes, module);
        let second = run(&mut ast, &mut scopes, module);
        assert_ne!(first.0, second.0);
        assert_eq!(ast.scope_of(module), Some(second.0));
    }
}
