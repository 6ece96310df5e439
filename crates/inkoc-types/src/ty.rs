//! The tagged-union `Type` (§3.1) and the structs backing its larger
//! variants. Replaces the source's class hierarchy of mutable type objects
//! with a single enum and free functions that operate on it (§9).

use crate::arena::TypeId;
use indexmap::IndexMap;

/// `Method`, `Closure`, or `Lambda` — the three kinds a `Block` type can be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Method,
    Closure,
    Lambda,
}

/// An object attribute: its type and whether `@name = value` is legal
/// outside the defining constructor.
#[derive(Clone, Debug)]
pub struct Member {
    pub ty: TypeId,
    pub mutable: bool,
}

/// One entry of a `Block`'s ordered argument table.
#[derive(Clone, Debug)]
pub struct Argument {
    pub name: String,
    pub ty: TypeId,
    pub mutable: bool,
    pub default: bool,
    pub rest: bool,
}

/// `Object O implements Trait T[A…]`, recorded on `O` (§4.1.3). Keyed in
/// [`ObjectType::implemented_traits`] by the trait *declaration*'s id, never
/// by an instantiation of it — the open question in the design notes is
/// resolved as "at most one implementation per (object, trait-declaration)
/// pair", so the declaration id is the natural key.
#[derive(Clone, Debug)]
pub struct TraitImplementation {
    pub trait_declaration: TypeId,
    pub type_arguments: Vec<TypeId>,
}

/// A nominal, non-generic-by-default object type.
#[derive(Clone, Debug)]
pub struct ObjectType {
    pub name: String,
    pub prototype: Option<TypeId>,
    pub attributes: IndexMap<String, Member>,
    pub methods: IndexMap<String, TypeId>,
    /// Declared type parameters, in declaration order. Each id points at a
    /// `Type::TypeParameter` entry; the declaration's own parameter-instance
    /// map stays conceptually empty forever (§3.2) — only a [`Instance`]
    /// wrapper produced at a use site ever carries bindings.
    ///
    /// [`Instance`]: crate::ty::Type::Instance
    pub type_parameters: Vec<TypeId>,
    pub implemented_traits: IndexMap<TypeId, TraitImplementation>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        ObjectType {
            name: name.into(),
            prototype: None,
            attributes: IndexMap::new(),
            methods: IndexMap::new(),
            type_parameters: Vec::new(),
            implemented_traits: IndexMap::new(),
        }
    }
}

/// A trait declaration: required methods (no body), required traits, and any
/// type parameters of its own.
#[derive(Clone, Debug)]
pub struct TraitType {
    pub name: String,
    pub methods: IndexMap<String, TypeId>,
    pub required_methods: IndexMap<String, TypeId>,
    pub required_traits: Vec<TypeId>,
    pub type_parameters: Vec<TypeId>,
}

impl TraitType {
    pub fn new(name: impl Into<String>) -> Self {
        TraitType {
            name: name.into(),
            methods: IndexMap::new(),
            required_methods: IndexMap::new(),
            required_traits: Vec::new(),
            type_parameters: Vec::new(),
        }
    }
}

/// A single type parameter: a name and the traits a bound argument must
/// implement. Fixed at declaration or at `where`-clause introduction — it
/// never accumulates requirements across uses (§3.1 invariant).
#[derive(Clone, Debug)]
pub struct TypeParameterType {
    pub name: String,
    pub required_traits: Vec<TypeId>,
}

/// A method, closure, or lambda signature.
#[derive(Clone, Debug)]
pub struct BlockType {
    pub kind: BlockKind,
    pub arguments: IndexMap<String, Argument>,
    pub throw_type: Option<TypeId>,
    pub return_type: TypeId,
    pub type_parameters: Vec<TypeId>,
    /// `where P: Trait + Trait` bounds, keyed by the type-parameter id they
    /// shadow (§4.1.4). These layer on top of a parameter's own required
    /// traits for the duration of the method body; they never mutate the
    /// owning type's declaration of `P`.
    pub method_bounds: IndexMap<TypeId, Vec<TypeId>>,
}

impl BlockType {
    pub fn new(kind: BlockKind, return_type: TypeId) -> Self {
        BlockType {
            kind,
            arguments: IndexMap::new(),
            throw_type: None,
            return_type,
            type_parameters: Vec::new(),
            method_bounds: IndexMap::new(),
        }
    }

    /// The traits `param` must satisfy while type-checking this method's
    /// body: its own declared requirements plus any `where` bound this
    /// method layers on top (§4.1.4). The bound shadows — it is combined
    /// here, at read time — rather than being written back into `param`'s
    /// own declaration.
    pub fn effective_required_traits(&self, param: TypeId, declared: &[TypeId]) -> Vec<TypeId> {
        let mut traits = declared.to_vec();
        if let Some(extra) = self.method_bounds.get(&param) {
            traits.extend(extra.iter().copied());
        }
        traits
    }
}

/// A fresh instantiation of a generic `Object`/`Trait`/`Block`, produced at a
/// use site without mutating the declaration it instantiates (§4.1.2,
/// §9 "Parameter instances are maps, not fields"). `base` always points at
/// the declaration (never at another `Instance`); `bindings` maps a
/// `TypeParameter` id to the type bound to it. A parameter absent from
/// `bindings` is simply unbound — looked up, it resolves to itself.
#[derive(Clone, Debug)]
pub struct InstanceType {
    pub base: TypeId,
    pub bindings: IndexMap<TypeId, TypeId>,
}

/// The tagged union backing every type in the system (§3.1).
#[derive(Clone, Debug)]
pub enum Type {
    Object(Box<ObjectType>),
    Trait(Box<TraitType>),
    TypeParameter(Box<TypeParameterType>),
    Block(Box<BlockType>),
    Instance(Box<InstanceType>),
    /// `?T`; `T` is never itself `Optional` (enforced by
    /// [`TypeArena::optional_of`](crate::arena::TypeArena::optional_of)).
    Optional(TypeId),
    Dynamic,
    Error,
    SelfType,
    Void,
    Never,
}

impl Type {
    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            Type::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ObjectType> {
        match self {
            Type::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_trait(&self) -> Option<&TraitType> {
        match self {
            Type::Trait(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_trait_mut(&mut self) -> Option<&mut TraitType> {
        match self {
            Type::Trait(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&BlockType> {
        match self {
            Type::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_type_parameter(&self) -> Option<&TypeParameterType> {
        match self {
            Type::TypeParameter(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_type_parameter_mut(&mut self) -> Option<&mut TypeParameterType> {
        match self {
            Type::TypeParameter(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&InstanceType> {
        match self {
            Type::Instance(i) => Some(i),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Type::Object(obj) => Some(&obj.name),
            Type::Trait(t) => Some(&t.name),
            Type::TypeParameter(p) => Some(&p.name),
            _ => None,
        }
    }
}
