//! Resolving a type-position AST node (a `Constant`, `?Constant`, `Self`, or
//! a block-type signature) to a [`TypeId`]. Shared by the `ImplementTraits`
//! shell stage and by `DefineType`'s own constant/attribute handling (§4.5)
//! so both walk the same rules instead of drifting apart.

use inkoc_ast::{Arena, NodeId, NodeKind};
use inkoc_common::{DiagnosticKind, Location};
use inkoc_symbols::{State, TirModule};
use inkoc_types::{instantiate, Argument, BlockType, Type, TypeId};

/// Type parameters currently in scope by name — the enclosing object's own
/// parameters plus, when resolving inside a method, that method's. Checked
/// before falling back to the module's globals.
pub type TypeParamScope<'a> = &'a [(String, inkoc_types::TypeId)];

pub fn resolve_type_node(
    ast: &Arena,
    node: NodeId,
    module: &TirModule,
    state: &mut State,
    type_params: TypeParamScope,
) -> inkoc_types::TypeId {
    match ast.kind(node).clone() {
        NodeKind::Constant {
            segments,
            type_arguments,
        } => resolve_constant(ast, &segments, &type_arguments, node, module, state, type_params),
        NodeKind::OptionalConstant(inner) => {
            let inner_ty = resolve_type_node(ast, inner, module, state, type_params);
            state.types.arena_mut().optional_of(inner_ty)
        }
        NodeKind::SelfExpr => state.types.arena().self_type(),
        NodeKind::BlockTypeSignature {
            kind,
            optional,
            parameter_types,
            throw_type,
            return_type,
        } => {
            let return_ty = match return_type {
                Some(rt) => resolve_type_node(ast, rt, module, state, type_params),
                None => state.types.nil(),
            };
            let mut block = BlockType::new(kind, return_ty);
            for (index, param_node) in parameter_types.iter().enumerate() {
                let ty = resolve_type_node(ast, *param_node, module, state, type_params);
                block.arguments.insert(
                    index.to_string(),
                    Argument {
                        name: index.to_string(),
                        ty,
                        mutable: false,
                        default: false,
                        rest: false,
                    },
                );
            }
            if let Some(throw_node) = throw_type {
                block.throw_type = Some(resolve_type_node(ast, throw_node, module, state, type_params));
            }
            let block_ty = state.types.arena_mut().alloc(Type::Block(Box::new(block)));
            if optional {
                state.types.arena_mut().optional_of(block_ty)
            } else {
                block_ty
            }
        }
        _ => state.emit(
            DiagnosticKind::InvalidContext,
            "expected a type",
            inkoc_common::Location::new(module.location.file, ast.span(node)),
        ),
    }
}

fn resolve_constant(
    ast: &Arena,
    segments: &[String],
    type_arguments: &[NodeId],
    node: NodeId,
    module: &TirModule,
    state: &mut State,
    type_params: TypeParamScope,
) -> inkoc_types::TypeId {
    let Some((first, rest)) = segments.split_first() else {
        return state.types.arena().error();
    };

    let mut current = if let Some((_, ty)) = type_params.iter().find(|(name, _)| name == first) {
        *ty
    } else if let Some(symbol) = module.globals.lookup(first) {
        symbol.ty
    } else {
        return state.emit(
            DiagnosticKind::UndefinedConstant,
            format!("undefined constant '{first}'"),
            inkoc_common::Location::new(module.location.file, ast.span(node)),
        );
    };

    for segment in rest {
        let Some(object) = state.types.arena().get(current).as_object() else {
            return state.emit(
                DiagnosticKind::UndefinedConstant,
                format!("'{segment}' has no attributes to look up"),
                inkoc_common::Location::new(module.location.file, ast.span(node)),
            );
        };
        let Some(member) = object.attributes.get(segment) else {
            return state.emit(
                DiagnosticKind::UndefinedConstant,
                format!("undefined constant '{segment}'"),
                inkoc_common::Location::new(module.location.file, ast.span(node)),
            );
        };
        current = member.ty;
    }

    if type_arguments.is_empty() {
        return current;
    }

    let args: Vec<_> = type_arguments
        .iter()
        .map(|arg| resolve_type_node(ast, *arg, module, state, type_params))
        .collect();
    instantiate_checked(
        state,
        current,
        &args,
        inkoc_common::Location::new(module.location.file, ast.span(node)),
    )
}

/// Checks `current`'s declared type-parameter arity against `args.len()`
/// before instantiating, emitting `ArityMismatch` instead of silently
/// partial-binding a short or over-long argument list. Shared by type-position
/// constant resolution here and by value-position constant resolution in
/// `DefineType` so neither drifts out of sync with the other (§4.1.2).
pub fn instantiate_checked(state: &mut State, current: TypeId, args: &[TypeId], location: Location) -> TypeId {
    let declared_arity = match state.types.arena().get(current) {
        Type::Object(obj) => obj.type_parameters.len(),
        Type::Trait(t) => t.type_parameters.len(),
        _ => 0,
    };
    if declared_arity != args.len() {
        return state.emit(DiagnosticKind::ArityMismatch, "wrong number of type arguments", location);
    }
    instantiate(state.types.arena_mut(), current, args)
}
