//! `ImplementTraits` (§6).
//!
//! A second pre-pass, after `DefineTypeSignatures` has installed a shell for
//! every type in the module: for each `impl Trait for Object` block,
//! resolves both sides' headers, shells the block's own methods just enough
//! to check signatures, and records the implementation (§4.1.3) so the main
//! `DefineType` walk can rely on it even for code that runs before the
//! `impl` block's own body does in AST order.

use inkoc_ast::{Arena, NodeId, NodeKind};
use inkoc_common::DiagnosticKind;
use inkoc_symbols::{State, TirModule};
use inkoc_types::{record_implementation, Argument, BlockKind, BlockType, ImplementError, Type};

use crate::type_nodes::resolve_type_node;

#[tracing::instrument(skip_all, fields(pass = "ImplementTraits", module = %module.name))]
pub fn run(ast: &mut Arena, module_root: NodeId, module: &mut TirModule, state: &mut State) {
    let NodeKind::Module { body, .. } = ast.kind(module_root).clone() else {
        return;
    };

    for child in body {
        let NodeKind::TraitImpl { header, body: impl_body } = ast.kind(child).clone() else {
            continue;
        };

        let object_id = match module.globals.lookup(&header.object_name) {
            Some(symbol) => symbol.ty,
            None => {
                state.emit(
                    DiagnosticKind::UndefinedConstant,
                    format!("undefined constant '{}'", header.object_name),
                    location(module, ast.span(child)),
                );
                continue;
            }
        };
        let trait_decl_id = match module.globals.lookup(&header.trait_name) {
            Some(symbol) => symbol.ty,
            None => {
                state.emit(
                    DiagnosticKind::UndefinedConstant,
                    format!("undefined constant '{}'", header.trait_name),
                    location(module, ast.span(child)),
                );
                continue;
            }
        };

        let object_type_params: Vec<(String, inkoc_types::TypeId)> = state
            .types
            .arena()
            .get(object_id)
            .as_object()
            .map(|obj| obj.type_parameters.clone())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|param_id| {
                state
                    .types
                    .arena()
                    .get(param_id)
                    .as_type_parameter()
                    .map(|p| (p.name.clone(), param_id))
            })
            .collect();

        let object_args: Vec<_> = header
            .object_type_arguments
            .iter()
            .map(|node| resolve_type_node(ast, *node, module, state, &object_type_params))
            .collect();
        let trait_args: Vec<_> = header
            .trait_type_arguments
            .iter()
            .map(|node| resolve_type_node(ast, *node, module, state, &object_type_params))
            .collect();
        let _ = object_args; // the object side is only used to validate arity elsewhere

        let trait_ty = if trait_args.is_empty() {
            trait_decl_id
        } else {
            inkoc_types::instantiate(state.types.arena_mut(), trait_decl_id, &trait_args)
        };

        // Shell each method declared in the `impl` body just enough to
        // check its signature against the trait's requirements; full body
        // checking happens later, in `DefineType`'s own pass over this
        // same `impl` block.
        for method_node in &impl_body {
            let NodeKind::MethodDef {
                name,
                parameters,
                return_type,
                throw_type,
                ..
            } = ast.kind(*method_node).clone()
            else {
                continue;
            };

            let return_ty = match return_type {
                Some(node) => resolve_type_node(ast, node, module, state, &object_type_params),
                None => state.types.nil(),
            };
            let mut block = BlockType::new(BlockKind::Method, return_ty);
            for parameter in &parameters {
                let ty = match &parameter.type_annotation {
                    Some(node) => resolve_type_node(ast, *node, module, state, &object_type_params),
                    None => state.types.arena().dynamic(),
                };
                block.arguments.insert(
                    parameter.name.clone(),
                    Argument {
                        name: parameter.name.clone(),
                        ty,
                        mutable: false,
                        default: parameter.default.is_some(),
                        rest: parameter.rest,
                    },
                );
            }
            if let Some(throw_node) = throw_type {
                block.throw_type =
                    Some(resolve_type_node(ast, throw_node, module, state, &object_type_params));
            }
            let method_ty = state.types.arena_mut().alloc(Type::Block(Box::new(block)));
            ast.set_type(*method_node, method_ty);

            if let Some(object) = state.types.arena_mut().get_mut(object_id).as_object_mut() {
                object.methods.insert(name, method_ty);
            }
        }

        if let Err(err) = record_implementation(state.types.arena_mut(), object_id, trait_ty) {
            let message = match err {
                ImplementError::ArityMismatch { expected, found } => {
                    format!("expected {expected} type argument(s), found {found}")
                }
                ImplementError::DuplicateImplementation => {
                    format!("'{}' already implements '{}'", header.object_name, header.trait_name)
                }
                ImplementError::MissingRequiredMethod(name) => {
                    format!("missing required method '{name}'")
                }
                ImplementError::IncompatibleSignature(name) => {
                    format!("incompatible signature for '{name}'")
                }
                ImplementError::MissingRequiredTrait(_) => {
                    "missing a required trait implementation".to_string()
                }
            };
            state.emit(DiagnosticKind::InvalidImplementation, message, location(module, ast.span(child)));
        }
    }
}

fn location(module: &TirModule, span: inkoc_common::Span) -> inkoc_common::Location {
    inkoc_common::Location::new(module.location.file, span)
}
