//! Structure tree: the ordered set of known modules
//!
//! The module list and the path→index lookup are private and only changed
//! together, so every entry in one has exactly one partner in the other.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::models::{ContentHash, FunctionSignature, Module};

/// Ordered collection of modules with a lookup by absolute file path
#[derive(Debug, Clone, Default, Serialize)]
pub struct StructureTree {
    modules: Vec<Module>,
    #[serde(skip)]
    index: HashMap<PathBuf, usize>,
}

impl StructureTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from modules in the given order.
    ///
    /// A module whose path already appeared replaces the earlier one in place.
    pub fn from_modules(modules: impl IntoIterator<Item = Module>) -> Self {
        let mut tree = Self::new();
        for module in modules {
            tree.insert(module);
        }
        tree
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn index_of(&self, path: &Path) -> Option<usize> {
        self.index.get(path).copied()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Option<&Module> {
        self.index_of(path).map(|i| &self.modules[i])
    }

    /// Check whether any module lives at or below `dir`
    pub fn has_under(&self, dir: &Path) -> bool {
        self.modules.iter().any(|m| m.file_path.starts_with(dir))
    }

    /// Append a new module, or replace the module with the same path in place.
    ///
    /// Returns the module's index.
    pub fn insert(&mut self, module: Module) -> usize {
        if let Some(i) = self.index_of(&module.file_path) {
            self.modules[i] = module;
            return i;
        }
        let i = self.modules.len();
        self.index.insert(module.file_path.clone(), i);
        self.modules.push(module);
        i
    }

    /// Swap in a freshly parsed function list. Returns `false` if the path is unknown.
    pub fn replace_functions(
        &mut self,
        path: &Path,
        functions: Vec<FunctionSignature>,
        hash: Option<ContentHash>,
    ) -> bool {
        match self.index_of(path) {
            Some(i) => {
                let module = &mut self.modules[i];
                module.functions = functions;
                module.content_hash = hash;
                true
            }
            None => false,
        }
    }

    /// Remove a module, shifting later modules down by one
    pub fn remove(&mut self, path: &Path) -> Option<Module> {
        let i = self.index.remove(path)?;
        let module = self.modules.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(module)
    }

    /// Remove every module at or below `dir`, keeping the order of the rest
    pub fn remove_under(&mut self, dir: &Path) -> Vec<Module> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.modules)
            .into_iter()
            .partition(|m| m.file_path.starts_with(dir));
        self.modules = kept;
        self.reindex();
        removed
    }

    /// Move a module to a new path, keeping its position and functions.
    ///
    /// Returns `false` if `from` is unknown, `to` is already taken, or `to` is
    /// not a declaration file below `root`.
    pub fn rename(&mut self, from: &Path, to: &Path, root: &Path) -> bool {
        if self.contains(to) {
            return false;
        }
        let Some(i) = self.index_of(from) else {
            return false;
        };
        if !self.modules[i].relocate(to, root) {
            return false;
        }
        self.index.remove(from);
        self.index.insert(to.to_path_buf(), i);
        true
    }

    /// Verify the list and the lookup agree entry for entry
    pub fn is_consistent(&self) -> bool {
        self.index.len() == self.modules.len()
            && self
                .modules
                .iter()
                .enumerate()
                .all(|(i, m)| self.index.get(&m.file_path) == Some(&i))
    }

    fn reindex(&mut self) {
        self.index = self
            .modules
            .iter()
            .enumerate()
            .map(|(i, m)| (m.file_path.clone(), i))
            .collect();
    }
}

impl<'a> IntoIterator for &'a StructureTree {
    type Item = &'a Module;
    type IntoIter = std::slice::Iter<'a, Module>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.iter()
    }
}
