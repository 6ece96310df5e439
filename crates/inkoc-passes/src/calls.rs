//! Method/field/closure-call argument checking (§4.5 "Method/field/closure-
//! call expressions").

use inkoc_common::{DiagnosticKind, Location};
use inkoc_symbols::State;
use inkoc_types::{instantiate, is_compatible, resolve_parameter, substitute, Type, TypeId};
use indexmap::IndexMap;
use std::collections::HashSet;

/// The result of resolving and checking a call against a `Block` signature:
/// the call's result type, plus the bindings the call initialized so the
/// caller (an `A.new(...)`-style constructor call) can reuse them without
/// mutating the method's own declaration.
pub struct CallResult {
    pub result_type: TypeId,
    pub bindings: IndexMap<TypeId, TypeId>,
}

/// Checks `positional`/`keyword` arguments (already-resolved types) against
/// `method`'s signature, binding the method's type parameters from argument
/// types as it goes (§4.5's "method and receiver type parameters are
/// initialized from the argument types"). `self_type` is the concrete type
/// `Self` names in this call's signature — the receiver the method was
/// resolved against — substituted into every argument/return type before
/// it's compared (§4.1.1 rule 9); `is_compatible` itself never special-cases
/// `Type::SelfType`, so this is the one place that resolution has to happen.
pub fn check_call(
    state: &mut State,
    method: TypeId,
    self_type: TypeId,
    explicit_type_arguments: &[TypeId],
    positional: &[(TypeId, Location)],
    keyword: &[(String, TypeId, Location)],
    call_location: Location,
) -> CallResult {
    let block = state
        .types
        .arena()
        .get(method)
        .as_block()
        .cloned();
    let Some(block) = block else {
        return CallResult {
            result_type: state.types.arena().error(),
            bindings: IndexMap::new(),
        };
    };

    let self_marker = state.types.arena().self_type();

    let mut bindings: IndexMap<TypeId, TypeId> = IndexMap::new();
    if !explicit_type_arguments.is_empty() {
        if explicit_type_arguments.len() != block.type_parameters.len() {
            state.emit(
                DiagnosticKind::ArityMismatch,
                "wrong number of explicit type arguments",
                call_location,
            );
        } else {
            for (param, arg) in block.type_parameters.iter().zip(explicit_type_arguments.iter()) {
                bindings.insert(*param, *arg);
            }
        }
    }

    let ordered_names: Vec<String> = block.arguments.keys().cloned().collect();
    let has_rest = block.arguments.values().any(|a| a.rest);
    let required_positional = ordered_names.len() - usize::from(has_rest);

    if positional.len() > required_positional && !has_rest {
        state.emit(
            DiagnosticKind::ArityMismatch,
            format!(
                "expected at most {} positional argument(s), found {}",
                required_positional,
                positional.len()
            ),
            call_location,
        );
    }

    // Names already bound, positionally or by keyword, so a later keyword
    // argument re-binding one is caught (§4.5's `InvalidKeywordArgument`
    // "...or re-binds an already-bound one").
    let mut bound_names: HashSet<String> = HashSet::new();

    for (index, (arg_ty, arg_loc)) in positional.iter().enumerate() {
        let arg_name = ordered_names.get(index.min(ordered_names.len().saturating_sub(1)));
        let Some(arg_name) = arg_name else { continue };
        let Some(param) = block.arguments.get(arg_name) else {
            continue;
        };
        if !param.rest {
            bound_names.insert(arg_name.clone());
        }
        bind_from_argument(state, &mut bindings, param.ty, *arg_ty);
        let expected = substitute_with_bindings(state, param.ty, &bindings);
        let expected = substitute(state.types.arena_mut(), expected, self_marker, self_type);
        if !is_compatible(state.types.arena(), *arg_ty, expected) {
            state.emit(
                DiagnosticKind::TypeMismatch,
                format!("argument {} has an incompatible type", index),
                *arg_loc,
            );
        }
    }

    for (name, arg_ty, arg_loc) in keyword {
        let Some(param) = block.arguments.get(name) else {
            state.emit(
                DiagnosticKind::InvalidKeywordArgument,
                format!("'{name}' is not a declared parameter"),
                *arg_loc,
            );
            continue;
        };
        if param.rest {
            state.emit(
                DiagnosticKind::InvalidKeywordArgument,
                format!("'{name}' is the rest parameter and cannot be named"),
                *arg_loc,
            );
            continue;
        }
        if bound_names.contains(name) {
            state.emit(
                DiagnosticKind::InvalidKeywordArgument,
                format!("'{name}' is already bound"),
                *arg_loc,
            );
            continue;
        }
        bound_names.insert(name.clone());
        bind_from_argument(state, &mut bindings, param.ty, *arg_ty);
        let expected = substitute_with_bindings(state, param.ty, &bindings);
        let expected = substitute(state.types.arena_mut(), expected, self_marker, self_type);
        if !is_compatible(state.types.arena(), *arg_ty, expected) {
            state.emit(
                DiagnosticKind::TypeMismatch,
                format!("argument '{name}' has an incompatible type"),
                *arg_loc,
            );
        }
    }

    let result_type = substitute_with_bindings(state, block.return_type, &bindings);
    let result_type = substitute(state.types.arena_mut(), result_type, self_marker, self_type);
    CallResult {
        result_type,
        bindings,
    }
}

/// If `declared` names a bare type parameter not yet bound, binds it to
/// `argument`'s type — "already-bound parameters are not re-bound" (§4.5).
fn bind_from_argument(
    state: &mut State,
    bindings: &mut IndexMap<TypeId, TypeId>,
    declared: TypeId,
    argument: TypeId,
) {
    if matches!(state.types.arena().get(declared), Type::TypeParameter(_))
        && !bindings.contains_key(&declared)
    {
        bindings.insert(declared, argument);
    }
}

fn substitute_with_bindings(state: &mut State, ty: TypeId, bindings: &IndexMap<TypeId, TypeId>) -> TypeId {
    let mut resolved = ty;
    for (param, bound) in bindings {
        resolved = substitute(state.types.arena_mut(), resolved, *param, *bound);
    }
    resolved
}

/// `A!(T…)`-style explicit instantiation of a generic declaration, used for
/// both constant type arguments and constructor calls like `A.new`. Never
/// mutates `base`'s own declaration (§4.1.2).
pub fn instantiate_generic(state: &mut State, base: TypeId, arguments: &[TypeId]) -> TypeId {
    instantiate(state.types.arena_mut(), base, arguments)
}

/// Looks up how a specific parameter resolves within an already-produced
/// instantiation (re-exported for callers outside this module that hold an
/// `InstanceType` directly rather than a raw bindings map).
pub fn resolve_in_instance(instance: &inkoc_types::InstanceType, param: TypeId) -> TypeId {
    resolve_parameter(instance, param)
}
