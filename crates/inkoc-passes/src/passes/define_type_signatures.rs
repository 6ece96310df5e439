//! `DefineTypeSignatures` (§6).
//!
//! A pre-pass over every top-level `Object`/`Trait` declaration that
//! allocates the type *shell* — name, empty attribute/method tables, an
//! (initially empty-bounded) type-parameter list — without resolving method
//! bodies or attribute initializer types. Forward references within the
//! same module work because the shell already exists in `module.globals`
//! by the time `DefineType` walks the file in order.
//!
//! The shell id is stashed directly on the declaration node's type slot
//! (`Arena::set_type`); `DefineType` looks it up from there instead of
//! allocating a second type for the same declaration.

use inkoc_ast::{Arena, NodeId, NodeKind};
use inkoc_common::DiagnosticKind;
use inkoc_symbols::{State, Symbol, SymbolKind, TirModule};
use inkoc_types::{ObjectType, TraitType, Type, TypeId, TypeParameterType};

#[tracing::instrument(skip_all, fields(pass = "DefineTypeSignatures", module = %module.name))]
pub fn run(ast: &mut Arena, module_root: NodeId, module: &mut TirModule, state: &mut State) {
    let NodeKind::Module { body, .. } = ast.kind(module_root).clone() else {
        return;
    };
    for child in body {
        match ast.kind(child).clone() {
            NodeKind::ObjectDef {
                name,
                reopen,
                type_parameters,
                ..
            } => {
                if reopen {
                    // Reopening augments an existing shell; DefineType looks
                    // the existing global up by name instead of re-shelling.
                    continue;
                }
                if state.config.is_reserved(&name) {
                    state.emit(
                        DiagnosticKind::ReservedConstant,
                        format!("'{name}' is reserved"),
                        ast_location(module, ast.span(child)),
                    );
                    continue;
                }

                let mut object = ObjectType::new(name.clone());
                object.prototype = Some(state.types.top_level());
                for param in &type_parameters {
                    let param_ty = state.types.arena_mut().alloc(Type::TypeParameter(Box::new(
                        TypeParameterType {
                            name: param.name.clone(),
                            required_traits: Vec::new(),
                        },
                    )));
                    object.type_parameters.push(param_ty);
                }
                let name_attr_ty = state.types.string();
                object.attributes.insert(
                    state.config.object_name_instance_attribute.clone(),
                    inkoc_types::Member {
                        ty: name_attr_ty,
                        mutable: false,
                    },
                );

                let shell = state.types.arena_mut().alloc(Type::Object(Box::new(object)));
                ast.set_type(child, shell);
                define_global(module, state, &name, shell, SymbolKind::Constant);
            }
            NodeKind::TraitDef {
                name,
                reopen,
                type_parameters,
                ..
            } => {
                if reopen {
                    state.emit(
                        DiagnosticKind::InvalidReopen,
                        format!("trait '{name}' cannot be reopened"),
                        ast_location(module, ast.span(child)),
                    );
                    continue;
                }
                if state.config.is_reserved(&name) {
                    state.emit(
                        DiagnosticKind::ReservedConstant,
                        format!("'{name}' is reserved"),
                        ast_location(module, ast.span(child)),
                    );
                    continue;
                }

                let mut trait_ty = TraitType::new(name.clone());
                for param in &type_parameters {
                    let param_ty = state.types.arena_mut().alloc(Type::TypeParameter(Box::new(
                        TypeParameterType {
                            name: param.name.clone(),
                            required_traits: Vec::new(),
                        },
                    )));
                    trait_ty.type_parameters.push(param_ty);
                }

                let shell = state.types.arena_mut().alloc(Type::Trait(Box::new(trait_ty)));
                ast.set_type(child, shell);
                define_global(module, state, &name, shell, SymbolKind::Constant);
            }
            _ => {}
        }
    }
}

fn define_global(
    module: &mut TirModule,
    state: &mut State,
    name: &str,
    ty: TypeId,
    kind: SymbolKind,
) {
    if module.globals.define(name, Symbol::new(ty, false, kind)).is_err() {
        let error = state.emit(
            DiagnosticKind::Redefined,
            format!("'{name}' is already defined in this module"),
            module.location,
        );
        let _ = module
            .globals
            .update(name, |symbol| symbol.ty = error);
    }
}

fn ast_location(module: &TirModule, span: inkoc_common::Span) -> inkoc_common::Location {
    inkoc_common::Location::new(module.location.file, span)
}
