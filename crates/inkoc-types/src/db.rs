//! The well-known prototype registry (§3.5): the handful of built-in types
//! the core must recognize by identity — integer, float, string, array,
//! boolean, nil, the `Block` and `Trait` prototypes, and the top-level
//! object — without knowing anything about the rest of the standard
//! library.

use crate::arena::{TypeArena, TypeId};
use crate::ty::{ObjectType, Type, TypeParameterType};
use inkoc_common::Config;

/// Registry of built-in prototype types, created once per compilation and
/// owned by `State` alongside the [`TypeArena`] (§3.5).
#[derive(Debug)]
pub struct TypeDb {
    arena: TypeArena,
    integer: TypeId,
    float: TypeId,
    string: TypeId,
    boolean: TypeId,
    nil: TypeId,
    block_prototype: TypeId,
    trait_prototype: TypeId,
    top_level: TypeId,
    array: TypeId,
    array_type_parameter: TypeId,
}

impl TypeDb {
    pub fn new(config: &Config) -> Self {
        let mut arena = TypeArena::new();

        let top_level = arena.alloc(Type::Object(Box::new(ObjectType::new("Object"))));
        let integer = arena.alloc(Type::Object(Box::new(prototype("Integer", top_level))));
        let float = arena.alloc(Type::Object(Box::new(prototype("Float", top_level))));
        let string = arena.alloc(Type::Object(Box::new(prototype("String", top_level))));
        let boolean = arena.alloc(Type::Object(Box::new(prototype("Boolean", top_level))));
        let nil = arena.alloc(Type::Object(Box::new(prototype("Nil", top_level))));
        let block_prototype = arena.alloc(Type::Object(Box::new(prototype("Block", top_level))));
        let trait_prototype = arena.alloc(Type::Object(Box::new(prototype(
            &config.trait_const,
            top_level,
        ))));

        let array_type_parameter = arena.alloc(Type::TypeParameter(Box::new(TypeParameterType {
            name: config.array_type_parameter.clone(),
            required_traits: Vec::new(),
        })));
        let mut array_object = prototype(&config.array_const, top_level);
        array_object.type_parameters.push(array_type_parameter);
        let array = arena.alloc(Type::Object(Box::new(array_object)));

        TypeDb {
            arena,
            integer,
            float,
            string,
            boolean,
            nil,
            block_prototype,
            trait_prototype,
            top_level,
            array,
            array_type_parameter,
        }
    }

    pub fn arena(&self) -> &TypeArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut TypeArena {
        &mut self.arena
    }

    pub fn integer(&self) -> TypeId {
        self.integer
    }

    pub fn float(&self) -> TypeId {
        self.float
    }

    pub fn string(&self) -> TypeId {
        self.string
    }

    pub fn boolean(&self) -> TypeId {
        self.boolean
    }

    pub fn nil(&self) -> TypeId {
        self.nil
    }

    pub fn block_prototype(&self) -> TypeId {
        self.block_prototype
    }

    pub fn trait_prototype(&self) -> TypeId {
        self.trait_prototype
    }

    pub fn top_level(&self) -> TypeId {
        self.top_level
    }

    pub fn array(&self) -> TypeId {
        self.array
    }

    pub fn array_type_parameter(&self) -> TypeId {
        self.array_type_parameter
    }
}

fn prototype(name: &str, top_level: TypeId) -> ObjectType {
    let mut obj = ObjectType::new(name);
    obj.prototype = Some(top_level);
    obj
}
