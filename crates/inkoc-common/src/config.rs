//! Fixed configuration the core expects (§6.3).
//!
//! `Config` is created once per compilation and handed to [`State`] by
//! value; no pass mutates it. Defaults reproduce Inko's own well-known
//! names so a caller that doesn't care can just use [`Config::default`].
//!
//! [`State`]: inkoc_symbols::State

use std::collections::HashSet;
use thiserror::Error;

/// Why [`Config::from_identifiers`] rejected a set of identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("identifier for '{field}' must not be empty")]
    Empty { field: &'static str },
    #[error("'{module_global}' cannot double as both the module global and a reserved constant")]
    ModuleGlobalReserved { module_global: String },
}

/// The handful of identifiers the semantic core must agree with the rest of
/// the toolchain (parser, standard library, backend) about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Name of the global that holds the module's own type (`ThisModule`).
    pub module_global: String,
    /// Method name treated as a constructor for attribute definitions (`init`).
    pub init_message: String,
    /// Method name used for array and generic constructors (`new`).
    pub new_message: String,
    /// Attribute on every object holding its name as a string (`@name`).
    pub object_name_instance_attribute: String,
    /// Name of `Array`'s single element type parameter (`T`).
    pub array_type_parameter: String,
    /// Global name of the `Array` prototype.
    pub array_const: String,
    /// Global name of the `Trait` prototype.
    pub trait_const: String,
    /// Names that may never be redefined as a constant (§4.5: "Reserved
    /// constants ... may not be redefined").
    pub reserved_constants: HashSet<String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut reserved_constants = HashSet::new();
        for name in ["Self", "Dynamic", "Void", "Never"] {
            reserved_constants.insert(name.to_string());
        }

        Config {
            module_global: "ThisModule".to_string(),
            init_message: "init".to_string(),
            new_message: "new".to_string(),
            object_name_instance_attribute: "@name".to_string(),
            array_type_parameter: "T".to_string(),
            array_const: "Array".to_string(),
            trait_const: "Trait".to_string(),
            reserved_constants,
        }
    }
}

impl Config {
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_constants.contains(name)
    }

    /// Builds a [`Config`] from caller-supplied identifiers, for a driver
    /// that loads these from a build manifest instead of using the
    /// well-known Inko defaults. Rejects an empty identifier and a
    /// `module_global` that collides with a reserved constant, both of
    /// which would make the pipeline's name resolution ambiguous.
    pub fn from_identifiers(
        module_global: String,
        init_message: String,
        new_message: String,
        object_name_instance_attribute: String,
        array_type_parameter: String,
        array_const: String,
        trait_const: String,
        reserved_constants: HashSet<String>,
    ) -> Result<Self, ConfigError> {
        for (field, value) in [
            ("module_global", &module_global),
            ("init_message", &init_message),
            ("new_message", &new_message),
            ("object_name_instance_attribute", &object_name_instance_attribute),
            ("array_type_parameter", &array_type_parameter),
            ("array_const", &array_const),
            ("trait_const", &trait_const),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Empty { field });
            }
        }
        if reserved_constants.contains(&module_global) {
            return Err(ConfigError::ModuleGlobalReserved { module_global });
        }

        Ok(Config {
            module_global,
            init_message,
            new_message,
            object_name_instance_attribute,
            array_type_parameter,
            array_const,
            trait_const,
            reserved_constants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_reserves_self() {
        let config = Config::default();
        assert!(config.is_reserved("Self"));
        assert!(!config.is_reserved("Integer"));
    }

    #[test]
    fn from_identifiers_rejects_an_empty_field() {
        let err = Config::from_identifiers(
            "ThisModule".into(),
            "init".into(),
            "new".into(),
            "@name".into(),
            String::new(),
            "Array".into(),
            "Trait".into(),
            HashSet::new(),
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::Empty { field: "array_type_parameter" });
    }

    #[test]
    fn from_identifiers_rejects_a_reserved_module_global() {
        let mut reserved = HashSet::new();
        reserved.insert("ThisModule".to_string());
        let err = Config::from_identifiers(
            "ThisModule".into(),
            "init".into(),
            "new".into(),
            "@name".into(),
            "T".into(),
            "Array".into(),
            "Trait".into(),
            reserved,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::ModuleGlobalReserved { module_global: "ThisModule".to_string() }
        );
    }

    #[test]
    fn from_identifiers_accepts_valid_input() {
        let config = Config::from_identifiers(
            "ThisModule".into(),
            "init".into(),
            "new".into(),
            "@name".into(),
            "T".into(),
            "Array".into(),
            "Trait".into(),
            HashSet::new(),
        )
        .unwrap();
        assert_eq!(config.module_global, "ThisModule");
    }
}
