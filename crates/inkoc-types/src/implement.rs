//! Recording "Object O implements Trait T[A…]" (§4.1.3). Pure type-system
//! logic: what counts as a valid implementation. The pass that calls this
//! (`ImplementTraits`) is responsible for turning a failure into a
//! diagnostic at the right source location.

use crate::arena::{TypeArena, TypeId};
use crate::compat::is_compatible;
use crate::ty::{TraitImplementation, Type};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImplementError {
    ArityMismatch { expected: usize, found: usize },
    DuplicateImplementation,
    MissingRequiredMethod(String),
    IncompatibleSignature(String),
    MissingRequiredTrait(TypeId),
}

/// Resolves `trait_ty` to its declaration id and the type arguments it was
/// instantiated with (empty for a non-generic trait reference).
fn trait_declaration_and_arguments(arena: &TypeArena, trait_ty: TypeId) -> Option<(TypeId, Vec<TypeId>)> {
    match arena.get(trait_ty) {
        Type::Trait(_) => Some((trait_ty, Vec::new())),
        Type::Instance(inst) => {
            if matches!(arena.get(inst.base), Type::Trait(_)) {
                Some((inst.base, inst.bindings.values().copied().collect()))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Attempts to record that `object_id` implements `trait_ty`. On success,
/// mutates `object_id`'s `implemented_traits` table; on failure, the object
/// is left untouched and the specific [`ImplementError`] is returned.
pub fn record_implementation(
    arena: &mut TypeArena,
    object_id: TypeId,
    trait_ty: TypeId,
) -> Result<(), ImplementError> {
    let Some((trait_decl, type_arguments)) = trait_declaration_and_arguments(arena, trait_ty) else {
        return Err(ImplementError::IncompatibleSignature(
            "not a trait".to_string(),
        ));
    };

    let trait_def = arena
        .get(trait_decl)
        .as_trait()
        .expect("trait_declaration_and_arguments only returns Trait ids")
        .clone();

    if type_arguments.len() != trait_def.type_parameters.len() {
        return Err(ImplementError::ArityMismatch {
            expected: trait_def.type_parameters.len(),
            found: type_arguments.len(),
        });
    }

    let object = arena
        .get(object_id)
        .as_object()
        .ok_or_else(|| ImplementError::IncompatibleSignature("not an object".to_string()))?
        .clone();

    if object.implemented_traits.contains_key(&trait_decl) {
        return Err(ImplementError::DuplicateImplementation);
    }

    for required_trait in &trait_def.required_traits {
        if !object.implemented_traits.contains_key(required_trait) {
            return Err(ImplementError::MissingRequiredTrait(*required_trait));
        }
    }

    for (name, required_method) in &trait_def.required_methods {
        let Some(provided) = object.methods.get(name) else {
            return Err(ImplementError::MissingRequiredMethod(name.clone()));
        };
        if !is_compatible(arena, *provided, *required_method) {
            return Err(ImplementError::IncompatibleSignature(name.clone()));
        }
    }

    let object_mut = arena
        .get_mut(object_id)
        .as_object_mut()
        .expect("checked above");
    object_mut.implemented_traits.insert(
        trait_decl,
        TraitImplementation {
            trait_declaration: trait_decl,
            type_arguments,
        },
    );
    Ok(())
}
