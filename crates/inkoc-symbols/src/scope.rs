//! Scope chaining (§3.3 "tables form a stack") and [`TypeScope`] (§4.2).

use crate::symbol::Symbol;
use crate::table::SymbolTable;
use inkoc_types::TypeId;

/// Index of a [`Scope`] within a [`ScopeArena`]; matches the `u32` slot
/// `inkoc_ast::Arena` attaches to scope-bearing nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One entry in the scope stack: a local symbol table plus a link to the
/// enclosing scope it chains to for names not found locally.
#[derive(Debug, Default)]
pub struct Scope {
    pub table: SymbolTable,
    pub parent: Option<ScopeId>,
}

/// Owns every [`Scope`] created by `SetupSymbolTables` for a single module.
/// One arena per module, like `inkoc_ast::Arena`'s node storage.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        ScopeArena::default()
    }

    pub fn push(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope {
            table: SymbolTable::new(),
            parent,
        });
        ScopeId((self.scopes.len() - 1) as u32)
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    /// Looks up `name` in `id`'s table, falling back through `parent` links
    /// until it is found or the chain is exhausted — "locals chain to
    /// enclosing blocks" (§3.3).
    pub fn lookup(&self, id: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(id);
        while let Some(scope_id) = current {
            let scope = self.get(scope_id);
            if let Some(symbol) = scope.table.lookup(name) {
                return Some(symbol);
            }
            current = scope.parent;
        }
        None
    }
}

/// Bundles everything a pass needs to interpret a name or a bare `return`/
/// `throw` at a given point in the AST (§4.2).
#[derive(Clone, Copy, Debug)]
pub struct TypeScope {
    pub self_type: TypeId,
    pub block_type: Option<TypeId>,
    pub module: TypeId,
    pub locals: ScopeId,
    /// The method this scope is nested in, if any — `where`-introduced type
    /// parameters (§4.1.4) come from here, and `return`/`throw` are invalid
    /// outside of one.
    pub enclosing_method: Option<TypeId>,
    /// Whether this scope is the direct body of the object's constructor
    /// (named `Config::init_message`) — `let @attr = ...` is only legal
    /// there (§4.5 "Variable definitions").
    pub is_constructor: bool,
}

impl TypeScope {
    pub fn new(self_type: TypeId, module: TypeId, locals: ScopeId) -> Self {
        TypeScope {
            self_type,
            block_type: None,
            module,
            locals,
            enclosing_method: None,
            is_constructor: false,
        }
    }

    /// A scope nested one level deeper, inheriting everything but the
    /// locals table and — when entering a method/closure/lambda body —
    /// the block type.
    pub fn nested(&self, locals: ScopeId, block_type: Option<TypeId>) -> Self {
        TypeScope {
            self_type: self.self_type,
            block_type: block_type.or(self.block_type),
            module: self.module,
            locals,
            enclosing_method: self.enclosing_method,
            is_constructor: self.is_constructor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolKind;

    #[test]
    fn lookup_falls_back_through_parent_scopes() {
        let mut arena = ScopeArena::new();
        let outer = arena.push(None);
        arena
            .get_mut(outer)
            .table
            .define("x", Symbol::new(TypeId(0), false, SymbolKind::Any))
            .unwrap();
        let inner = arena.push(Some(outer));

        assert!(arena.lookup(inner, "x").is_some());
        assert!(arena.lookup(inner, "missing").is_none());
    }

    #[test]
    fn inner_definition_shadows_without_touching_outer() {
        let mut arena = ScopeArena::new();
        let outer = arena.push(None);
        arena
            .get_mut(outer)
            .table
            .define("x", Symbol::new(TypeId(0), false, SymbolKind::Any))
            .unwrap();
        let inner = arena.push(Some(outer));
        arena
            .get_mut(inner)
            .table
            .define("x", Symbol::new(TypeId(1), true, SymbolKind::Any))
            .unwrap();

        assert_eq!(arena.lookup(inner, "x").unwrap().ty, TypeId(1));
        assert_eq!(arena.lookup(outer, "x").unwrap().ty, TypeId(0));
    }
}
