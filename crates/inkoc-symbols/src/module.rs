//! The typed intermediate representation's module unit (§3.4). Built by the
//! build driver (an external collaborator — out of scope, §1) and handed to
//! the passes; `SetupSymbolTables` through `ProcessDeferredMethods` fill in
//! its globals table and resolve its imports.

use crate::table::SymbolTable;
use indexmap::IndexMap;
use inkoc_common::Location;
use inkoc_types::TypeId;

/// One entry of a module's import list — resolved from the AST's
/// `ImportDecl` by `DefineImportTypes`, with implicit imports appended by
/// `InsertImplicitImports` ahead of it (§4.4's pipeline ordering).
#[derive(Clone, Debug)]
pub struct ImportEntry {
    pub module_path: Vec<String>,
    pub symbol: Option<String>,
    pub implicit: bool,
}

#[derive(Debug)]
pub struct TirModule {
    pub name: String,
    /// An `Object` type standing in for the module — the prototype against
    /// which `let X = ...` module globals and top-level methods resolve.
    pub module_type: TypeId,
    /// The `Block` type of the module's top-level executable body.
    pub body_type: TypeId,
    pub globals: SymbolTable,
    pub imports: Vec<ImportEntry>,
    pub location: Location,
}

impl TirModule {
    pub fn new(name: impl Into<String>, module_type: TypeId, body_type: TypeId, location: Location) -> Self {
        TirModule {
            name: name.into(),
            module_type,
            body_type,
            globals: SymbolTable::new(),
            imports: Vec::new(),
            location,
        }
    }
}

/// The set of sibling modules available to `DefineImportTypes` (§6's
/// supplemented pass). Populated by the build driver as each module clears
/// `DefineThisModuleType`; the core only ever reads from it.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: IndexMap<String, TirModule>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        ModuleRegistry::default()
    }

    pub fn insert(&mut self, module: TirModule) {
        self.modules.insert(module.name.clone(), module);
    }

    pub fn get(&self, name: &str) -> Option<&TirModule> {
        self.modules.get(name)
    }
}
