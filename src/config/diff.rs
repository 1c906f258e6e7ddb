//! Field-by-field comparison of two configurations

use super::types::Config;

/// What a config replacement means for the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigDiff {
    pub class_location_changed: bool,
    pub interface_location_changed: bool,
    pub declaration_path_changed: bool,
    /// Something the model is built from changed; the tree must be rescanned
    pub requires_rebuild: bool,
}

impl ConfigDiff {
    pub fn between(old: &Config, new: &Config) -> Self {
        let declaration_path_changed = old.declaration_path != new.declaration_path;

        // Every field except the two output locations feeds the model.
        let requires_rebuild = declaration_path_changed
            || old.module != new.module
            || old.js_runtime != new.js_runtime
            || old.promise_function != new.promise_function
            || old.function_name_pattern != new.function_name_pattern
            || old.preload_name_pattern != new.preload_name_pattern
            || old.preload_all_modules_name != new.preload_all_modules_name
            || old.using_statements != new.using_statements
            || old.type_map != new.type_map;

        Self {
            class_location_changed: old.file_output.class != new.file_output.class,
            interface_location_changed: old.file_output.interface != new.file_output.interface,
            declaration_path_changed,
            requires_rebuild,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
