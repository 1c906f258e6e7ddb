//! Configuration type definitions
//!
//! Field names follow the consumer's JSON file, which uses space-separated
//! keys such as `"declaration path"`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Name of the config file in the watched base directory
pub const CONFIG_FILE_NAME: &str = "tsconfig.tsruntime.json";

const FUNCTION_PLACEHOLDERS: [&str; 3] = ["#function#", "#module#", "#action#"];
const PRELOAD_PLACEHOLDERS: [&str; 1] = ["#module#"];

/// Upper/lower case transform applied to a name-pattern placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NameTransform {
    #[default]
    None,
    FirstUpperCase,
    FirstLowerCase,
    UpperCase,
    LowerCase,
}

impl NameTransform {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameTransform::None => "None",
            NameTransform::FirstUpperCase => "FirstUpperCase",
            NameTransform::FirstLowerCase => "FirstLowerCase",
            NameTransform::UpperCase => "UpperCase",
            NameTransform::LowerCase => "LowerCase",
        }
    }
}

impl fmt::Display for NameTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NameTransform {
    type Err = String;

    /// Case-insensitive, spaces ignored: `"first upper case"` works
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "none" => Ok(NameTransform::None),
            "firstuppercase" => Ok(NameTransform::FirstUpperCase),
            "firstlowercase" => Ok(NameTransform::FirstLowerCase),
            "uppercase" => Ok(NameTransform::UpperCase),
            "lowercase" => Ok(NameTransform::LowerCase),
            _ => Err(format!(
                "unknown name transform '{s}' (expected None, FirstUpperCase, FirstLowerCase, UpperCase or LowerCase)"
            )),
        }
    }
}

impl Serialize for NameTransform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NameTransform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Output file locations of the generated code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub class: String,
    pub interface: String,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            class: "TSRuntime/TSRuntime.cs".to_string(),
            interface: "TSRuntime/ITSRuntime.cs".to_string(),
        }
    }
}

/// The three method-generation toggles (sync, try-sync, async)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvokeToggles {
    #[serde(rename = "invoke enabled")]
    pub invoke_enabled: bool,
    #[serde(rename = "trysync enabled")]
    pub trysync_enabled: bool,
    #[serde(rename = "async enabled")]
    pub async_enabled: bool,
}

impl InvokeToggles {
    /// Defaults for per-module methods
    pub const MODULE: Self = Self {
        invoke_enabled: false,
        trysync_enabled: true,
        async_enabled: false,
    };

    /// Defaults for the generic runtime methods
    pub const JS_RUNTIME: Self = Self {
        invoke_enabled: false,
        trysync_enabled: false,
        async_enabled: false,
    };
}

/// Toggles as read from JSON, before defaults are filled in
#[derive(Debug, Default, Deserialize)]
struct PartialToggles {
    #[serde(rename = "invoke enabled")]
    invoke_enabled: Option<bool>,
    #[serde(rename = "trysync enabled")]
    trysync_enabled: Option<bool>,
    #[serde(rename = "async enabled")]
    async_enabled: Option<bool>,
}

impl PartialToggles {
    fn or(self, defaults: InvokeToggles) -> InvokeToggles {
        InvokeToggles {
            invoke_enabled: self.invoke_enabled.unwrap_or(defaults.invoke_enabled),
            trysync_enabled: self.trysync_enabled.unwrap_or(defaults.trysync_enabled),
            async_enabled: self.async_enabled.unwrap_or(defaults.async_enabled),
        }
    }
}

fn module_toggles<'de, D: Deserializer<'de>>(deserializer: D) -> Result<InvokeToggles, D::Error> {
    Ok(PartialToggles::deserialize(deserializer)?.or(InvokeToggles::MODULE))
}

fn js_runtime_toggles<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<InvokeToggles, D::Error> {
    Ok(PartialToggles::deserialize(deserializer)?.or(InvokeToggles::JS_RUNTIME))
}

/// Handling of functions returning a promise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromiseFunctionConfig {
    #[serde(rename = "only async enabled")]
    pub only_async: bool,
    #[serde(rename = "append Async")]
    pub append_async: bool,
}

impl Default for PromiseFunctionConfig {
    fn default() -> Self {
        Self {
            only_async: true,
            append_async: false,
        }
    }
}

/// Naming of generated methods that invoke module functions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionNamePattern {
    pub pattern: String,
    #[serde(rename = "function transform")]
    pub function_transform: NameTransform,
    #[serde(rename = "module transform")]
    pub module_transform: NameTransform,
    #[serde(rename = "action transform")]
    pub action_transform: NameTransform,
}

impl Default for FunctionNamePattern {
    fn default() -> Self {
        Self {
            pattern: "#function#".to_string(),
            function_transform: NameTransform::FirstUpperCase,
            module_transform: NameTransform::None,
            action_transform: NameTransform::None,
        }
    }
}

/// Naming of generated methods that preload one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreloadNamePattern {
    pub pattern: String,
    #[serde(rename = "module transform")]
    pub module_transform: NameTransform,
}

impl Default for PreloadNamePattern {
    fn default() -> Self {
        Self {
            pattern: "Preload#module#".to_string(),
            module_transform: NameTransform::None,
        }
    }
}

/// Configuration consumed by the pipeline and the code generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder of the declaration files, relative to the config file
    #[serde(rename = "declaration path")]
    pub declaration_path: String,

    #[serde(rename = "file output")]
    pub file_output: FileOutputConfig,

    #[serde(rename = "module", deserialize_with = "module_toggles")]
    pub module: InvokeToggles,

    #[serde(rename = "js runtime", deserialize_with = "js_runtime_toggles")]
    pub js_runtime: InvokeToggles,

    #[serde(rename = "promise function")]
    pub promise_function: PromiseFunctionConfig,

    #[serde(rename = "function name pattern")]
    pub function_name_pattern: FunctionNamePattern,

    #[serde(rename = "preload name pattern")]
    pub preload_name_pattern: PreloadNamePattern,

    #[serde(rename = "preload all modules name")]
    pub preload_all_modules_name: String,

    #[serde(rename = "using statements")]
    pub using_statements: Vec<String>,

    /// Declared type (key) to generated type (value); unlisted types map to themselves
    #[serde(rename = "type map")]
    pub type_map: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            declaration_path: String::new(),
            file_output: FileOutputConfig::default(),
            module: InvokeToggles::MODULE,
            js_runtime: InvokeToggles::JS_RUNTIME,
            promise_function: PromiseFunctionConfig::default(),
            function_name_pattern: FunctionNamePattern::default(),
            preload_name_pattern: PreloadNamePattern::default(),
            preload_all_modules_name: "PreloadAllModules".to_string(),
            using_statements: vec!["Microsoft.AspNetCore.Components".to_string()],
            type_map: default_type_map(),
        }
    }
}

fn default_type_map() -> BTreeMap<String, String> {
    [
        ("number", "double"),
        ("boolean", "bool"),
        ("bigint", "long"),
        ("HTMLElement", "ElementReference"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Config {
    /// Directory holding the declaration files
    pub fn declaration_root(&self, base_dir: &Path) -> PathBuf {
        if self.declaration_path.is_empty() {
            base_dir.to_path_buf()
        } else {
            base_dir.join(&self.declaration_path)
        }
    }

    /// Generated type for a declared one
    pub fn map_type<'a>(&'a self, declared: &'a str) -> &'a str {
        self.type_map.get(declared).map(String::as_str).unwrap_or(declared)
    }

    /// Use `/` separators and drop a trailing slash from the declaration path
    pub fn normalize(&mut self) {
        let mut path = self.declaration_path.replace('\\', "/");
        while path.ends_with('/') {
            path.pop();
        }
        self.declaration_path = path;
    }

    /// Check name patterns for unknown `#placeholder#`s
    pub fn validate(&self) -> Result<(), String> {
        check_placeholders(
            "function name pattern",
            &self.function_name_pattern.pattern,
            &FUNCTION_PLACEHOLDERS,
        )?;
        check_placeholders(
            "preload name pattern",
            &self.preload_name_pattern.pattern,
            &PRELOAD_PLACEHOLDERS,
        )
    }
}

fn check_placeholders(field: &str, pattern: &str, allowed: &[&str]) -> Result<(), String> {
    let mut rest = pattern;
    while let Some(start) = rest.find('#') {
        let tail = &rest[start..];
        match allowed.iter().find(|p| tail.starts_with(*p)) {
            Some(placeholder) => rest = &tail[placeholder.len()..],
            None => {
                return Err(format!(
                    "{field} '{pattern}' uses an unknown placeholder; allowed: {}",
                    allowed.join(", ")
                ))
            }
        }
    }
    Ok(())
}
