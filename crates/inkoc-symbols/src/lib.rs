//! Symbol tables, scopes, the TIR module unit, and `State` (§3.3–§3.5).

pub mod module;
pub mod scope;
pub mod state;
pub mod symbol;
pub mod table;

pub use module::{ImportEntry, ModuleRegistry, TirModule};
pub use scope::{Scope, ScopeArena, ScopeId, TypeScope};
pub use state::{DeferredMethod, State};
pub use symbol::{Symbol, SymbolKind};
pub use table::{SymbolTable, SymbolTableError};
