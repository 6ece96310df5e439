//! An ordered, insertion-stable map from name to [`Symbol`] (§3.3). Backed
//! by an `IndexMap` rather than `rustc_hash`'s `FxHashMap` precisely because
//! iteration order must match declaration order — diagnostics and, later,
//! TIR output depend on it.

use crate::symbol::Symbol;
use indexmap::IndexMap;

/// The two failure modes §4.2's operation table lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymbolTableError {
    /// `define` found `name` already present in *this* table (parent tables
    /// are not consulted — shadowing an enclosing scope is fine).
    Redefined(String),
    /// `update` found no existing symbol named `name`.
    Undefined(String),
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Inserts `name` with a fresh [`Symbol`], failing if already present in
    /// this table (parents are irrelevant — shadowing is legal).
    pub fn define(&mut self, name: impl Into<String>, symbol: Symbol) -> Result<&Symbol, SymbolTableError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(SymbolTableError::Redefined(name));
        }
        let (index, _) = self.entries.insert_full(name, symbol);
        Ok(&self.entries[index])
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.entries.get(name)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.entries.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Mutates an existing symbol in place; fails with `Undefined` if
    /// `name` is not present in this table.
    pub fn update(
        &mut self,
        name: &str,
        update: impl FnOnce(&mut Symbol),
    ) -> Result<(), SymbolTableError> {
        match self.entries.get_mut(name) {
            Some(symbol) => {
                update(symbol);
                Ok(())
            }
            None => Err(SymbolTableError::Undefined(name.to_string())),
        }
    }

    /// Entries in declaration order — the contract that makes this table
    /// "insertion-stable" rather than just "ordered".
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.entries.iter().map(|(name, symbol)| (name.as_str(), symbol))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
