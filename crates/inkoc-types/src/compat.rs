//! Compatibility: "value of type V may flow into a position of type T"
//! (§4.1.1). A directed relation, computed recursively over the ten
//! numbered rules. `Self` resolution (rule 9) is the caller's job —
//! substitute the scope's concrete `self_type` in before calling
//! [`is_compatible`] (see [`crate::instantiate::substitute`]) — everything
//! here assumes both sides are already free of unresolved `Self` markers.

use crate::arena::{TypeArena, TypeId};
use crate::ty::{BlockType, Type};

/// Rule 3: identical nominal types with identical parameter instantiations.
fn types_equal(arena: &TypeArena, a: TypeId, b: TypeId) -> bool {
    if a.0 == b.0 {
        return true;
    }
    match (arena.get(a), arena.get(b)) {
        (Type::Instance(x), Type::Instance(y)) => {
            x.base.0 == y.base.0
                && x.bindings.len() == y.bindings.len()
                && x.bindings.iter().all(|(param, bound)| {
                    y.bindings
                        .get(param)
                        .is_some_and(|other| types_equal(arena, *bound, *other))
                })
        }
        (Type::Optional(x), Type::Optional(y)) => types_equal(arena, *x, *y),
        _ => false,
    }
}

/// Resolves `ty` to the `Object`/`Trait` declaration it names, unwrapping an
/// `Instance` wrapper if present. Returns `None` for anything else.
fn declaration_of(arena: &TypeArena, ty: TypeId) -> Option<TypeId> {
    match arena.get(ty) {
        Type::Object(_) | Type::Trait(_) => Some(ty),
        Type::Instance(inst) => Some(inst.base),
        _ => None,
    }
}

/// Rule 4: an `Object` is compatible with a `Trait` iff it implements it,
/// with a matching parameter instantiation (§4.1.3).
fn object_implements_trait(arena: &TypeArena, object_ty: TypeId, trait_ty: TypeId) -> bool {
    let Some(object_decl) = declaration_of(arena, object_ty) else {
        return false;
    };
    let Some(object) = arena.get(object_decl).as_object() else {
        return false;
    };
    let Some(trait_decl) = declaration_of(arena, trait_ty) else {
        return false;
    };
    let Some(implementation) = object.implemented_traits.get(&trait_decl) else {
        return false;
    };

    match arena.get(trait_ty) {
        Type::Instance(inst) => {
            let wanted: Vec<TypeId> = inst.bindings.values().copied().collect();
            wanted.len() == implementation.type_arguments.len()
                && wanted
                    .iter()
                    .zip(implementation.type_arguments.iter())
                    .all(|(w, g)| types_equal(arena, *w, *g))
        }
        _ => implementation.type_arguments.is_empty(),
    }
}

/// Rule 5: an `Object`/`Trait` is compatible with a `TypeParameter` iff the
/// value's type implements every trait the parameter requires.
fn satisfies_type_parameter(arena: &TypeArena, value: TypeId, param_ty: TypeId) -> bool {
    let Some(param) = arena.get(param_ty).as_type_parameter() else {
        return false;
    };
    param
        .required_traits
        .iter()
        .all(|required| is_compatible(arena, value, *required))
}

/// Rule 8: two `Block` signatures are compatible — `V` may stand in for `T`
/// — iff their kinds match, their arities match, each of `T`'s argument
/// types is compatible with the corresponding argument of `V`
/// (contravariant), `V`'s return type is compatible with `T`'s (covariant),
/// and `V`'s throw type is compatible with `T`'s or `V` throws nothing.
fn blocks_compatible(arena: &TypeArena, value: &BlockType, target: &BlockType) -> bool {
    if value.kind != target.kind || value.arguments.len() != target.arguments.len() {
        return false;
    }
    let arguments_ok = value
        .arguments
        .values()
        .zip(target.arguments.values())
        .all(|(v_arg, t_arg)| is_compatible(arena, t_arg.ty, v_arg.ty));
    if !arguments_ok {
        return false;
    }
    if !is_compatible(arena, value.return_type, target.return_type) {
        return false;
    }
    match (value.throw_type, target.throw_type) {
        (None, _) => true,
        (Some(v), Some(t)) => is_compatible(arena, v, t),
        (Some(_), None) => false,
    }
}

/// Is `value` compatible with `target`? See module docs for the rule
/// ordering this implements (§4.1.1).
pub fn is_compatible(arena: &TypeArena, value: TypeId, target: TypeId) -> bool {
    // Rule 1: Error absorbs in both directions.
    if matches!(arena.get(value), Type::Error) || matches!(arena.get(target), Type::Error) {
        return true;
    }
    // Rule 2: Dynamic is compatible with anything, in both directions.
    if matches!(arena.get(value), Type::Dynamic) || matches!(arena.get(target), Type::Dynamic) {
        return true;
    }
    // Rule 10: Void / Never.
    if matches!(arena.get(value), Type::Never) {
        return true;
    }
    if matches!(arena.get(value), Type::Void) {
        return !matches!(arena.get(target), Type::Never);
    }

    // Rule 3.
    if types_equal(arena, value, target) {
        return true;
    }

    match (arena.get(value), arena.get(target)) {
        // Rule 6: T is compatible with ?T (lifting). The reverse direction —
        // ?T into T — is deliberately absent; only an explicit dereference
        // produces that conversion (handled by the pass, not this relation).
        (_, Type::Optional(inner)) if !matches!(arena.get(value), Type::Optional(_)) => {
            is_compatible(arena, value, *inner)
        }
        // Rule 7: ?A compatible with ?B iff A compatible with B.
        (Type::Optional(a), Type::Optional(b)) => is_compatible(arena, *a, *b),
        // Rule 8.
        (Type::Block(v), Type::Block(t)) => blocks_compatible(arena, v, t),
        _ => {
            // Rule 5.
            if matches!(arena.get(target), Type::TypeParameter(_))
                && satisfies_type_parameter(arena, value, target)
            {
                return true;
            }
            // Rule 4.
            if matches!(arena.get(target), Type::Trait(_) | Type::Instance(_))
                && object_implements_trait(arena, value, target)
            {
                return true;
            }
            false
        }
    }
}
