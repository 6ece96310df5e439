//! `ProcessDeferredMethods` (§4.6, §6).
//!
//! Retries every method `DefineType` set aside because one of its names
//! failed to resolve under an incomplete module (the chief case: a method
//! calling a sibling declared later in the same object). By the time this
//! pass runs, every object's method table holds every method in the
//! module, so the retry sees what the first pass couldn't.
//!
//! Each entry is retried exactly once — `check_method_body` is called with
//! `allow_defer: false`, so a second genuine failure is reported for real
//! instead of re-queued.

use inkoc_ast::{Arena, NodeId};
use inkoc_symbols::{ScopeArena, State, TirModule};

use crate::passes::define_type::check_method_body;

#[tracing::instrument(skip_all, fields(pass = "ProcessDeferredMethods", module = %module.name))]
pub fn run(ast: &mut Arena, scopes: &mut ScopeArena, module: &mut TirModule, state: &mut State) {
    let deferred = state.take_deferred_methods();
    for entry in deferred {
        state.diagnostics.truncate(entry.diagnostics_mark);
        check_method_body(
            ast,
            scopes,
            module,
            state,
            NodeId(entry.node),
            &entry.scope,
            entry.method,
            entry.is_constructor,
            false,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkoc_ast::{NodeKind, Parameter};
    use inkoc_common::{Config, DiagnosticKind, FileId, Location, Span};
    use inkoc_symbols::TypeScope;
    use inkoc_types::{BlockKind, BlockType, ObjectType, Type};

    /// `fn a { @b.get }` where `b` is an attribute only assigned by a sibling
    /// constructor placed later in the object body: `DefineType`'s own
    /// single-pass walk cannot see `@b` yet, so the first check defers, and
    /// this pass' retry — after the whole object has been walked — succeeds.
    #[test]
    fn a_deferred_method_resolves_once_its_sibling_attribute_exists() {
        let mut state = State::new(Config::default());
        let mut ast = Arena::new();
        let mut scopes = ScopeArena::new();
        let error = state.types.arena().error();
        let mut module = TirModule::new("main", error, error, Location::new(FileId(0), Span::new(0, 0)));

        let mut object = ObjectType::new("Box");
        object.prototype = Some(state.types.top_level());
        let object_id = state.types.arena_mut().alloc(Type::Object(Box::new(object)));

        let attr_node = ast.push(NodeKind::Attribute("value".into()), Span::new(0, 1));
        let method_scope = scopes.push(None);
        ast.set_scope(attr_node, method_scope.0);

        let mut block = BlockType::new(BlockKind::Method, state.types.arena().dynamic());
        let method_node = ast.push(
            NodeKind::MethodDef {
                name: "read".into(),
                is_static: false,
                type_parameters: Vec::new(),
                where_bounds: Vec::new(),
                parameters: Vec::<Parameter>::new(),
                return_type: None,
                throw_type: None,
                body: Some(vec![attr_node]),
            },
            Span::new(0, 1),
        );
        ast.set_scope(method_node, method_scope.0);
        block.return_type = state.types.arena().dynamic();
        let method_ty = state.types.arena_mut().alloc(Type::Block(Box::new(block)));
        ast.set_type(method_node, method_ty);

        let scope = TypeScope::new(object_id, module.module_type, method_scope);
        check_method_body(&mut ast, &mut scopes, &mut module, &mut state, method_node, &scope, method_ty, false, true);

        assert!(state.has_deferred_methods());
        assert!(!state.diagnostics.has_errors());

        if let Some(object) = state.types.arena_mut().get_mut(object_id).as_object_mut() {
            object.attributes.insert(
                "value".into(),
                inkoc_types::Member { ty: state.types.integer(), mutable: false },
            );
        }

        run(&mut ast, &mut scopes, &mut module, &mut state);

        assert!(!state.has_deferred_methods());
        assert!(!state.diagnostics.has_errors());
        assert_eq!(ast.type_of(attr_node), Some(state.types.integer()));
    }

    /// A name that never becomes defined stays a genuine failure after the
    /// retry — deferral is a one-shot grace period, not an infinite wait.
    #[test]
    fn a_truly_undefined_name_is_reported_after_the_retry() {
        let mut state = State::new(Config::default());
        let mut ast = Arena::new();
        let mut scopes = ScopeArena::new();
        let error = state.types.arena().error();
        let mut module = TirModule::new("main", error, error, Location::new(FileId(0), Span::new(0, 0)));

        let mut object = ObjectType::new("Box");
        object.prototype = Some(state.types.top_level());
        let object_id = state.types.arena_mut().alloc(Type::Object(Box::new(object)));

        let ident_node = ast.push(NodeKind::Identifier("nope".into()), Span::new(0, 1));
        let method_scope = scopes.push(None);
        ast.set_scope(ident_node, method_scope.0);

        let mut block = BlockType::new(BlockKind::Method, state.types.arena().dynamic());
        let method_node = ast.push(
            NodeKind::MethodDef {
                name: "read".into(),
                is_static: false,
                type_parameters: Vec::new(),
                where_bounds: Vec::new(),
                parameters: Vec::<Parameter>::new(),
                return_type: None,
                throw_type: None,
                body: Some(vec![ident_node]),
            },
            Span::new(0, 1),
        );
        ast.set_scope(method_node, method_scope.0);
        block.return_type = state.types.arena().dynamic();
        let method_ty = state.types.arena_mut().alloc(Type::Block(Box::new(block)));
        ast.set_type(method_node, method_ty);

        let scope = TypeScope::new(object_id, module.module_type, method_scope);
        check_method_body(&mut ast, &mut scopes, &mut module, &mut state, method_node, &scope, method_ty, false, true);
        assert!(state.has_deferred_methods());

        run(&mut ast, &mut scopes, &mut module, &mut state);

        assert!(!state.has_deferred_methods());
        assert!(state.diagnostics.has_errors());
        assert_eq!(state.diagnostics.all()[0].kind, DiagnosticKind::UndefinedIdentifier);
    }
}
