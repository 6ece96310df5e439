//! `DefineThisModuleType` (§6).
//!
//! Creates the module's own `Object` type and stores it under
//! `Config::module_global` (`ThisModule`) in the module's globals table.
//! Must run before `InsertImplicitImports`/`DefineImportTypes`: imported
//! modules are resolved as attributes reachable from their own
//! `ThisModule`, which has to exist first.

use inkoc_symbols::{State, Symbol, SymbolKind, TirModule};
use inkoc_types::{ObjectType, Type};

#[tracing::instrument(skip_all, fields(pass = "DefineThisModuleType", module = %module.name))]
pub fn run(state: &mut State, module: &mut TirModule) {
    let mut object = ObjectType::new(module.name.clone());
    object.prototype = Some(state.types.top_level());
    let module_type = state.types.arena_mut().alloc(Type::Object(Box::new(object)));
    module.module_type = module_type;

    let _ = module.globals.define(
        state.config.module_global.clone(),
        Symbol::new(module_type, false, SymbolKind::Global),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkoc_common::{Config, FileId, Location, Span};

    #[test]
    fn this_module_global_is_defined_with_the_configured_name() {
        let mut state = State::new(Config::default());
        let error = state.types.arena().error();
        let mut module = TirModule::new(
            "main",
            error,
            error,
            Location::new(FileId(0), Span::new(0, 0)),
        );

        run(&mut state, &mut module);

        let global = module.globals.lookup(&state.config.module_global).unwrap();
        assert_eq!(global.ty, module.module_type);
    }
}
