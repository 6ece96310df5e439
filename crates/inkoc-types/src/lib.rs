//! The Inko type system (§3.1, §4.1): a tagged-union `Type` stored in an
//! arena and addressed by [`TypeId`], the directed compatibility relation,
//! generic instantiation, and trait-implementation bookkeeping.
//!
//! The source organizes this as a class hierarchy of mutable type objects;
//! here it is one enum plus free functions, so the compatibility and
//! instantiation rules stay exhaustive and auditable (§9).

pub mod arena;
pub mod compat;
pub mod db;
pub mod implement;
pub mod instantiate;
pub mod ty;

pub use arena::{TypeArena, TypeId};
pub use compat::is_compatible;
pub use db::TypeDb;
pub use implement::{record_implementation, ImplementError};
pub use instantiate::{instantiate, resolve_parameter, substitute};
pub use ty::{
    Argument, BlockKind, BlockType, InstanceType, Member, ObjectType, TraitImplementation,
    TraitType, Type, TypeParameterType,
};
