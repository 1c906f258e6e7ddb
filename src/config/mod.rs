//! Configuration module for dtswatch
//!
//! The config file (`tsconfig.tsruntime.json`) lives in the watched base
//! directory. Missing keys take defaults; a missing file means all
//! defaults, never an error.

mod diff;
mod loader;
mod types;

pub use diff::ConfigDiff;
pub use loader::{from_json_with_warnings, load_or_default, load_with_warnings, ConfigWarning};
pub use types::{
    Config, FileOutputConfig, FunctionNamePattern, InvokeToggles, NameTransform,
    PreloadNamePattern, PromiseFunctionConfig, CONFIG_FILE_NAME,
};
