//! Module and structure tree assembly
//!
//! Reads declaration files, feeds matching lines to the parser and builds
//! [`Module`]s and [`StructureTree`]s. A grammar error aborts only the file
//! it occurs in.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::debug;

use crate::error::{DtsError, DtsResult};
use crate::fs::DeclarationSource;
use crate::models::{is_declaration_file, ContentHash, FunctionSignature, Module};
use crate::parser::parse_declaration;
use crate::tree::StructureTree;

/// Result of scanning a whole directory
#[derive(Debug, Default)]
pub struct ScanReport {
    pub tree: StructureTree,
    /// One entry per file that could not be turned into a module
    pub failures: Vec<DtsError>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse every declaration line of a file's contents, in file order
pub fn parse_declarations(content: &str, file: &Path) -> DtsResult<Vec<FunctionSignature>> {
    let mut functions = Vec::new();
    for (i, line) in content.lines().enumerate() {
        match parse_declaration(line) {
            Ok(Some(function)) => functions.push(function),
            Ok(None) => {}
            Err(source) => {
                return Err(DtsError::Grammar {
                    file: file.to_path_buf(),
                    line: i + 1,
                    source,
                })
            }
        }
    }
    Ok(functions)
}

/// Read and parse one declaration file below `root`
pub fn load_module(
    file_path: &Path,
    root: &Path,
    source: &dyn DeclarationSource,
) -> DtsResult<Module> {
    let mut module = Module::new(file_path, root).ok_or_else(|| DtsError::ReadFailed {
        file: file_path.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a declaration file below the declaration root",
        ),
    })?;

    let content = source
        .read_to_string(file_path)
        .map_err(|source| DtsError::ReadFailed {
            file: file_path.to_path_buf(),
            source,
        })?;

    module.functions = parse_declarations(&content, file_path)?;
    module.content_hash = Some(ContentHash::from_content(&content));
    Ok(module)
}

/// List declaration files below `root`, path-sorted.
///
/// Hidden directories and files are skipped.
pub fn declaration_files(root: &Path) -> DtsResult<Vec<PathBuf>> {
    let (files, errors) = walk_declaration_files(root)?;
    match errors.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(files),
    }
}

/// Scan `root` and build a fresh tree
pub fn parse_directory(root: &Path, source: &dyn DeclarationSource) -> DtsResult<ScanReport> {
    parse_directory_with_fallback(root, source, &StructureTree::new())
}

/// Scan `root`, keeping `previous`'s module for any file that now fails.
///
/// The resulting tree is ordered by file path so identical directory
/// contents always give the same tree.
pub fn parse_directory_with_fallback(
    root: &Path,
    source: &dyn DeclarationSource,
    previous: &StructureTree,
) -> DtsResult<ScanReport> {
    let (files, mut failures) = walk_declaration_files(root)?;

    let mut modules = Vec::with_capacity(files.len());
    for file in files {
        match load_module(&file, root, source) {
            Ok(module) => modules.push(module),
            Err(err) => {
                // The root may have moved since the kept parse.
                if let Some(mut kept) = previous.get(&file).cloned() {
                    if kept.relocate(&file, root) {
                        debug!(file = %file.display(), "keeping last good parse");
                        modules.push(kept);
                    }
                }
                failures.push(err);
            }
        }
    }

    Ok(ScanReport {
        tree: StructureTree::from_modules(modules),
        failures,
    })
}

fn walk_declaration_files(root: &Path) -> DtsResult<(Vec<PathBuf>, Vec<DtsError>)> {
    if !root.is_dir() {
        return Err(DtsError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(true)
        .follow_links(false)
        .build();

    let mut files = Vec::new();
    let mut errors = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) => {
                let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
                if is_file && is_declaration_file(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            Err(err) => errors.push(DtsError::Walk(err)),
        }
    }
    files.sort();

    Ok((files, errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFs;
    use std::fs;
    use tempfile::tempdir;

    const ADD: &str = "export declare function add(a: number, b: number): number;\n";

    #[test]
    fn test_parse_declarations_skips_other_lines() {
        let content = "/** docs */\nexport declare function a(): void;\nexport {};\nexport declare function b(x: string): string;\n";
        let functions = parse_declarations(content, Path::new("m.d.ts")).unwrap();
        let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_declarations_reports_line_number() {
        let content = "export declare function a(): void;\n\nexport declare function b(x: string) string;\n";
        let err = parse_declarations(content, Path::new("m.d.ts")).unwrap_err();
        match err {
            DtsError::Grammar { file, line, .. } => {
                assert_eq!(file, Path::new("m.d.ts"));
                assert_eq!(line, 3);
            }
            other => panic!("expected grammar error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_module_sets_hash_and_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("math.d.ts");
        fs::write(&path, ADD).unwrap();

        let module = load_module(&path, dir.path(), &LocalFs).unwrap();
        assert_eq!(module.module_name, "math");
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.content_hash, Some(ContentHash::from_content(ADD)));
    }

    #[test]
    fn test_parse_directory_is_path_sorted_and_skips_hidden() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join("z.d.ts"), ADD).unwrap();
        fs::write(dir.path().join("a.d.ts"), ADD).unwrap();
        fs::write(dir.path().join("sub/m.d.ts"), ADD).unwrap();
        fs::write(dir.path().join(".cache/x.d.ts"), ADD).unwrap();
        fs::write(dir.path().join("notes.ts"), ADD).unwrap();

        let report = parse_directory(dir.path(), &LocalFs).unwrap();
        assert!(report.is_clean());
        let names: Vec<_> = report.tree.modules().iter().map(|m| m.relative_path.as_str()).collect();
        assert_eq!(names, vec!["a.d.ts", "sub/m.d.ts", "z.d.ts"]);
    }

    #[test]
    fn test_parse_directory_isolates_malformed_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.d.ts"), ADD).unwrap();
        fs::write(dir.path().join("b.d.ts"), "export declare function broken(a: number;\n").unwrap();
        fs::write(dir.path().join("c.d.ts"), ADD).unwrap();

        let report = parse_directory(dir.path(), &LocalFs).unwrap();
        assert_eq!(report.tree.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].to_string().contains("b.d.ts"));
        assert!(report.tree.is_consistent());
    }

    #[test]
    fn test_fallback_keeps_previous_module() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.d.ts");
        fs::write(&path, ADD).unwrap();
        let first = parse_directory(dir.path(), &LocalFs).unwrap();

        fs::write(&path, "export declare function add(a: number\n").unwrap();
        let second = parse_directory_with_fallback(dir.path(), &LocalFs, &first.tree).unwrap();

        assert_eq!(second.failures.len(), 1);
        assert_eq!(second.tree.len(), 1);
        assert_eq!(second.tree.modules()[0].functions[0].name, "add");
    }

    #[test]
    fn test_parse_directory_missing_root() {
        let dir = tempdir().unwrap();
        let err = parse_directory(&dir.path().join("missing"), &LocalFs).unwrap_err();
        assert!(matches!(err, DtsError::DirectoryNotFound { .. }));
    }
}
