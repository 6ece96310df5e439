//! The AST node contract the semantic core consumes (§6.1).
//!
//! Lexing and parsing are external collaborators: this crate does not parse
//! anything. It defines the *shape* the parser is expected to hand the core
//! — an arena of nodes addressed by stable indices, each with a span and a
//! mutable type slot the `DefineType` pass fills in — and nothing else.
//! Tests in this workspace build `Arena`s by hand in place of a parser.

pub mod arena;
pub mod node;

pub use arena::Arena;
pub use node::{
    BlockKind, ImportDecl, LetTarget, Node, NodeId, NodeKind, Parameter, TraitImplHeader,
    TypeParamDecl,
};
