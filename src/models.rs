//! Core data models for dtswatch
//!
//! A declaration file becomes a [`Module`] holding an ordered list of
//! [`FunctionSignature`]s. Everything here is plain data; parsing lives in
//! [`crate::parser`] and assembly in [`crate::scan`].

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

/// File suffix of declaration files
pub const DECLARATION_SUFFIX: &str = ".d.ts";

/// Suffix of the module path consumers load at runtime
const MODULE_PATH_SUFFIX: &str = ".js";

/// Name given to the pseudo-parameter describing a return type
pub const RETURN_VALUE_NAME: &str = "ReturnValue";

/// Check whether a path names a declaration file
pub fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.len() > DECLARATION_SUFFIX.len() && n.ends_with(DECLARATION_SUFFIX))
        .unwrap_or(false)
}

/// Declared type with its decoration flags, as written after a `:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeShape {
    pub type_name: String,
    pub nullable: bool,
    pub array: bool,
    pub array_nullable: bool,
}

impl TypeShape {
    /// Bare, undecorated type
    pub fn plain(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            nullable: false,
            array: false,
            array_nullable: false,
        }
    }
}

/// A function parameter (or a return type, see [`RETURN_VALUE_NAME`])
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub nullable: bool,
    pub array: bool,
    pub array_nullable: bool,
    /// Declared as `name?: type`
    pub optional: bool,
}

impl Parameter {
    /// Build a parameter from its name and parsed type
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            type_name: shape.type_name,
            nullable: shape.nullable,
            array: shape.array,
            array_nullable: shape.array_nullable,
            optional: false,
        }
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// The type as TypeScript-like text, e.g. `number?[]?`
    pub fn declared_type(&self) -> String {
        let mut out = self.type_name.clone();
        if self.nullable {
            out.push('?');
        }
        if self.array {
            out.push_str("[]");
            if self.array_nullable {
                out.push('?');
            }
        }
        out
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.optional { "?" } else { "" };
        write!(f, "{}{}: {}", self.name, marker, self.declared_type())
    }
}

/// A parsed `export declare function` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSignature {
    pub name: String,
    /// In call-site argument order
    pub parameters: Vec<Parameter>,
    pub return_type: Parameter,
    /// The declared return type was `Promise<...>`
    pub return_promise: bool,
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{parameter}")?;
        }
        if self.return_promise {
            write!(f, "): Promise<{}>", self.return_type.declared_type())
        } else {
            write!(f, "): {}", self.return_type.declared_type())
        }
    }
}

/// Content hash of a declaration file
///
/// Wraps a SHA-256 hex digest. Used to skip re-parses when an editor
/// rewrites a file without changing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn from_content(content: &str) -> Self {
        use sha2::{Digest, Sha256};
        Self(format!("{:x}", Sha256::digest(content.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One declaration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    /// Absolute path, unique key within a structure tree
    pub file_path: PathBuf,
    /// Path below the declaration root, `/`-separated
    pub relative_path: String,
    /// Path consumers import at runtime, e.g. `/sub/foo.js`
    pub module_path: String,
    /// Identifier derived from the relative path, e.g. `sub_foo`
    pub module_name: String,
    pub functions: Vec<FunctionSignature>,
    #[serde(skip)]
    pub content_hash: Option<ContentHash>,
}

impl Module {
    /// Create an empty module for `file_path` below `root`.
    ///
    /// Returns `None` if the path is not below `root` or is not a
    /// declaration file.
    pub fn new(file_path: &Path, root: &Path) -> Option<Self> {
        let (relative_path, module_path, module_name) = derive_names(file_path, root)?;
        Some(Self {
            file_path: file_path.to_path_buf(),
            relative_path,
            module_path,
            module_name,
            functions: Vec::new(),
            content_hash: None,
        })
    }

    /// Point the module at a new file, keeping its functions.
    ///
    /// Returns `false` (and leaves the module unchanged) if the new path is
    /// not a declaration file below `root`.
    pub fn relocate(&mut self, file_path: &Path, root: &Path) -> bool {
        match derive_names(file_path, root) {
            Some((relative_path, module_path, module_name)) => {
                self.file_path = file_path.to_path_buf();
                self.relative_path = relative_path;
                self.module_path = module_path;
                self.module_name = module_name;
                true
            }
            None => false,
        }
    }
}

fn derive_names(file_path: &Path, root: &Path) -> Option<(String, String, String)> {
    if !is_declaration_file(file_path) {
        return None;
    }
    let relative = file_path.strip_prefix(root).ok()?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            _ => return None,
        }
    }
    let relative_path = segments.join("/");
    let stem = relative_path.strip_suffix(DECLARATION_SUFFIX)?;

    let module_path = format!("/{stem}{MODULE_PATH_SUFFIX}");
    let module_name = stem
        .split('/')
        .map(sanitize_identifier)
        .collect::<Vec<_>>()
        .join("_");

    Some((relative_path, module_path, module_name))
}

fn sanitize_identifier(segment: &str) -> String {
    let mut out: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
