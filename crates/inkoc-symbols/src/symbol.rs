//! A named binding (§3.3): a type, a mutability flag, and what kind of
//! binding it is.

use inkoc_types::TypeId;

/// What a [`Symbol`] names — used by passes to decide whether a given
/// lookup result is valid in a given context (e.g. `return` needs the
/// enclosing method, `@x` needs `Attribute`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Any,
    Method,
    Attribute,
    Constant,
    Global,
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub ty: TypeId,
    pub mutable: bool,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(ty: TypeId, mutable: bool, kind: SymbolKind) -> Self {
        Symbol { ty, mutable, kind }
    }
}
