//! Generic instantiation (§4.1.2) and `Self` resolution (§4.1.1 rule 9).
//!
//! Both are the same underlying operation — structural substitution over a
//! type graph — so they share [`substitute`]. Instantiation substitutes
//! `TypeParameter` ids for bound arguments; `Self` resolution substitutes the
//! single `SelfType` marker for a concrete type. Neither ever mutates the
//! type being substituted into; unaffected subtrees are returned unchanged
//! by id, and only types that actually contain the thing being replaced get
//! a fresh arena slot.

use crate::arena::{TypeArena, TypeId};
use crate::ty::{InstanceType, Type};
use indexmap::IndexMap;

/// Produces a fresh instantiation of `base` (an `Object`, `Trait`, or
/// `Block` declaration) binding its declared type parameters to
/// `arguments`, positionally. Does not mutate `base` (§3.2, §9): the
/// bindings live only in the returned `Instance`.
pub fn instantiate(arena: &mut TypeArena, base: TypeId, arguments: &[TypeId]) -> TypeId {
    let declared_parameters = match arena.get(base) {
        Type::Object(obj) => obj.type_parameters.clone(),
        Type::Trait(t) => t.type_parameters.clone(),
        Type::Block(b) => b.type_parameters.clone(),
        _ => Vec::new(),
    };

    let mut bindings = IndexMap::new();
    for (param, arg) in declared_parameters.iter().zip(arguments.iter()) {
        bindings.insert(*param, *arg);
    }

    arena.alloc(Type::Instance(Box::new(InstanceType { base, bindings })))
}

/// Looks up how `param` is bound within a specific instantiation. Returns
/// `param` itself when unbound — §4.1.2's rule that uninstantiated generics
/// do not eagerly bind downstream parameters.
pub fn resolve_parameter(instance: &InstanceType, param: TypeId) -> TypeId {
    instance.bindings.get(&param).copied().unwrap_or(param)
}

/// Structurally substitutes every occurrence of `target` in `ty` with
/// `replacement`. Used both to resolve `Self` against a scope's concrete
/// `self_type` and, from [`instantiate`]'s callers, to push bindings down
/// into a `Block`'s argument/return/throw types.
pub fn substitute(arena: &mut TypeArena, ty: TypeId, target: TypeId, replacement: TypeId) -> TypeId {
    if ty.0 == target.0 {
        return replacement;
    }

    match arena.get(ty).clone() {
        Type::Optional(inner) => {
            let new_inner = substitute(arena, inner, target, replacement);
            if new_inner.0 == inner.0 {
                ty
            } else {
                arena.optional_of(new_inner)
            }
        }
        Type::Instance(inst) => {
            let mut changed = false;
            let mut bindings = IndexMap::new();
            for (param, bound) in inst.bindings.iter() {
                let new_bound = substitute(arena, *bound, target, replacement);
                changed |= new_bound.0 != bound.0;
                bindings.insert(*param, new_bound);
            }
            if changed {
                arena.alloc(Type::Instance(Box::new(InstanceType {
                    base: inst.base,
                    bindings,
                })))
            } else {
                ty
            }
        }
        Type::Block(block) => {
            let mut changed = false;
            let mut arguments = block.arguments.clone();
            for arg in arguments.values_mut() {
                let new_ty = substitute(arena, arg.ty, target, replacement);
                changed |= new_ty.0 != arg.ty.0;
                arg.ty = new_ty;
            }
            let return_type = substitute(arena, block.return_type, target, replacement);
            changed |= return_type.0 != block.return_type.0;
            let throw_type = match block.throw_type {
                Some(t) => {
                    let new_t = substitute(arena, t, target, replacement);
                    changed |= new_t.0 != t.0;
                    Some(new_t)
                }
                None => None,
            };
            if changed {
                let mut new_block = block;
                new_block.arguments = arguments;
                new_block.return_type = return_type;
                new_block.throw_type = throw_type;
                arena.alloc(Type::Block(new_block))
            } else {
                ty
            }
        }
        // Objects, traits, type parameters, and the remaining singletons
        // are not substituted into: `Self`/generic parameters referenced
        // from inside a declaration's own body are resolved at the use
        // site that reads the member, not by rewriting the declaration.
        _ => ty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{BlockKind, BlockType, ObjectType, TypeParameterType};

    #[test]
    fn instantiate_does_not_mutate_the_declaration() {
        let mut arena = TypeArena::new();
        let param = arena.alloc(Type::TypeParameter(Box::new(TypeParameterType {
            name: "T".into(),
            required_traits: Vec::new(),
        })));
        let mut list = ObjectType::new("List");
        list.type_parameters.push(param);
        let list_id = arena.alloc(Type::Object(Box::new(list)));

        let string_ty = arena.alloc(Type::Object(Box::new(ObjectType::new("String"))));
        let _instance = instantiate(&mut arena, list_id, &[string_ty]);

        let declared = arena.get(list_id).as_object().unwrap();
        assert_eq!(declared.type_parameters, vec![param]);
    }

    #[test]
    fn unbound_parameter_resolves_to_itself() {
        let mut arena = TypeArena::new();
        let param = arena.alloc(Type::TypeParameter(Box::new(TypeParameterType {
            name: "T".into(),
            required_traits: Vec::new(),
        })));
        let base = arena.alloc(Type::Object(Box::new({
            let mut o = ObjectType::new("Box");
            o.type_parameters.push(param);
            o
        })));
        let instance_id = instantiate(&mut arena, base, &[]);
        let instance = arena.get(instance_id).as_instance().unwrap().clone();
        assert_eq!(resolve_parameter(&instance, param), param);
    }

    #[test]
    fn substitute_self_into_a_block_return_type() {
        let mut arena = TypeArena::new();
        let self_marker = arena.self_type();
        let concrete = arena.alloc(Type::Object(Box::new(ObjectType::new("Counter"))));
        let block = arena.alloc(Type::Block(Box::new(BlockType::new(
            BlockKind::Method,
            self_marker,
        ))));
        let resolved = substitute(&mut arena, block, self_marker, concrete);
        let resolved_block = arena.get(resolved).as_block().unwrap();
        assert_eq!(resolved_block.return_type, concrete);
        // the original declaration is untouched
        let original_block = arena.get(block).as_block().unwrap();
        assert_eq!(original_block.return_type, self_marker);
    }
}
