//! The eight passes `run_pipeline` drives in order (§2, §6).

pub mod define_import_types;
pub mod define_this_module_type;
pub mod define_type;
pub mod define_type_signatures;
pub mod implement_traits;
pub mod insert_implicit_imports;
pub mod process_deferred_methods;
pub mod setup_symbol_tables;
