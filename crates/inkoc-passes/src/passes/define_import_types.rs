//! `DefineImportTypes` (§6).
//!
//! For each import (explicit or implicit), resolves the target module's
//! `ThisModule` object from the sibling-module registry the build driver
//! hands in, and binds the imported symbol(s) into the importing module's
//! globals table. An import naming an undefined symbol is a diagnostic and
//! binds `Error` rather than aborting the pass.

use inkoc_ast::{Arena, NodeId, NodeKind};
use inkoc_common::{DiagnosticKind, Location};
use inkoc_symbols::{ModuleRegistry, State, Symbol, SymbolKind, TirModule};

#[tracing::instrument(skip_all, fields(pass = "DefineImportTypes", module = %module.name))]
pub fn run(
    ast: &Arena,
    module_root: NodeId,
    module: &mut TirModule,
    registry: &ModuleRegistry,
    state: &mut State,
) {
    let NodeKind::Module { imports, .. } = ast.kind(module_root) else {
        return;
    };

    for import in imports {
        let path = import.module_path.join("::");
        let Some(target) = registry.get(&path) else {
            // An unresolved *module* path, as opposed to an unresolved
            // symbol within a resolved module, is reported against the
            // module's own location since no more specific span exists
            // for a synthetic implicit import.
            if !import.implicit {
                state.emit(
                    DiagnosticKind::UndefinedConstant,
                    format!("undefined module '{path}'"),
                    module.location,
                );
            }
            continue;
        };

        let Some(symbol_name) = &import.symbol else {
            continue;
        };

        let location = Location::new(module.location.file, import.span);
        match target.globals.lookup(symbol_name) {
            Some(symbol) => {
                let _ = module.globals.define(symbol_name.clone(), symbol.clone());
            }
            None => {
                let kind = if starts_with_uppercase(symbol_name) {
                    DiagnosticKind::UndefinedConstant
                } else {
                    DiagnosticKind::UndefinedIdentifier
                };
                let error = state.emit(
                    kind,
                    format!("module '{path}' does not export '{symbol_name}'"),
                    location,
                );
                let _ = module
                    .globals
                    .define(symbol_name.clone(), Symbol::new(error, false, SymbolKind::Any));
            }
        }
    }
}

fn starts_with_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkoc_ast::ImportDecl;
    use inkoc_common::{Config, FileId, Span};
    use inkoc_types::Type;

    #[test]
    fn importing_an_undefined_symbol_binds_error_and_emits_a_diagnostic() {
        let mut state = State::new(Config::default());
        let error = state.types.arena().error();
        let mut module = TirModule::new(
            "main",
            error,
            error,
            Location::new(FileId(0), Span::new(0, 0)),
        );
        let sibling = TirModule::new("other", error, error, Location::new(FileId(1), Span::new(0, 0)));
        let mut registry = ModuleRegistry::new();
        registry.insert(sibling);

        let mut ast = Arena::new();
        let module_root = ast.push(
            NodeKind::Module {
                imports: vec![ImportDecl {
                    module_path: vec!["other".to_string()],
                    symbol: Some("Missing".to_string()),
                    implicit: false,
                    span: Span::new(0, 5),
                }],
                body: Vec::new(),
            },
            Span::new(0, 0),
        );

        run(&ast, module_root, &mut module, &registry, &mut state);

        assert!(state.diagnostics.has_errors());
        let bound = module.globals.lookup("Missing").unwrap();
        assert!(matches!(state.types.arena().get(bound.ty), Type::Error));
    }
}
