//! The pass pipeline that turns a parsed module into a fully type-checked
//! `TirModule` (§2, §6). `run_pipeline` is the only entry point a driver
//! needs: it owns the fixed order the eight passes must run in, so nothing
//! outside this crate can reorder or skip one.

pub mod calls;
pub mod passes;
pub mod type_nodes;

use inkoc_ast::{Arena, NodeId};
use inkoc_symbols::{ModuleRegistry, ScopeArena, State, TirModule};

/// Runs every pass against `module_root`, in the fixed order:
/// `SetupSymbolTables` → `DefineThisModuleType` → `InsertImplicitImports` →
/// `DefineImportTypes` → `DefineTypeSignatures` → `ImplementTraits` →
/// `DefineType` → `ProcessDeferredMethods`.
///
/// `registry` must already contain every module `module` can import from
/// (a driver resolving a dependency graph builds it bottom-up); this
/// function does not discover or parse other modules itself.
pub fn run_pipeline(
    ast: &mut Arena,
    module_root: NodeId,
    module: &mut TirModule,
    registry: &ModuleRegistry,
    state: &mut State,
) -> ScopeArena {
    let mut scopes = ScopeArena::new();
    let root_scope = passes::setup_symbol_tables::run(ast, &mut scopes, module_root);
    let _ = root_scope;

    passes::define_this_module_type::run(state, module);
    passes::insert_implicit_imports::run(ast, module_root);
    passes::define_import_types::run(ast, module_root, module, registry, state);
    passes::define_type_signatures::run(ast, module_root, module, state);
    passes::implement_traits::run(ast, module_root, module, state);
    passes::define_type::run(ast, &mut scopes, module, module_root, state);
    passes::process_deferred_methods::run(ast, &mut scopes, module, state);

    scopes
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkoc_ast::{ImportDecl, LetTarget, NodeKind};
    use inkoc_common::{Config, FileId, Location, Span};
    use inkoc_symbols::TirModule;

    /// A module whose single global constant initializer references only
    /// built-in prototypes runs the whole pipeline clean, end to end.
    #[test]
    fn an_empty_module_runs_the_full_pipeline_without_diagnostics() {
        let mut state = State::new(Config::default());
        let mut ast = Arena::new();
        let error = state.types.arena().error();
        let mut module = TirModule::new("main", error, error, Location::new(FileId(0), Span::new(0, 0)));
        let registry = ModuleRegistry::new();

        let body_node = ast.push(NodeKind::IntegerLiteral(1), Span::new(0, 1));
        let root = ast.push(
            NodeKind::Module {
                imports: Vec::<ImportDecl>::new(),
                body: vec![body_node],
            },
            Span::new(0, 1),
        );

        run_pipeline(&mut ast, root, &mut module, &registry, &mut state);

        assert!(!state.diagnostics.has_errors());
    }

    /// A top-level `let` binding a local to `Self` (the module's own type)
    /// runs clean end to end, through every pass in order.
    #[test]
    fn a_let_binding_to_self_runs_through_the_whole_pipeline() {
        let mut state = State::new(Config::default());
        let mut ast = Arena::new();
        let error = state.types.arena().error();
        let mut module = TirModule::new("main", error, error, Location::new(FileId(0), Span::new(0, 0)));
        let registry = ModuleRegistry::new();

        let value = ast.push(NodeKind::SelfExpr, Span::new(0, 1));
        let let_node = ast.push(
            NodeKind::Let {
                target: LetTarget::Local,
                name: "x".into(),
                mutable: false,
                type_annotation: None,
                value,
            },
            Span::new(0, 1),
        );
        let root = ast.push(
            NodeKind::Module {
                imports: Vec::<ImportDecl>::new(),
                body: vec![let_node],
            },
            Span::new(0, 1),
        );

        run_pipeline(&mut ast, root, &mut module, &registry, &mut state);

        assert!(!state.diagnostics.has_errors());
    }
}
