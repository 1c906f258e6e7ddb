//! File access used by scanning and the watch pipeline
//!
//! Reads go through [`DeclarationSource`] so tests can simulate locked or
//! half-written files.

use std::io;
use std::path::Path;

/// Read-only access to declaration and config files
pub trait DeclarationSource: Send + Sync {
    /// Read a whole file as UTF-8
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Local disk implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

impl DeclarationSource for LocalFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// How a failed read should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFailure {
    /// The file is gone
    Missing,
    /// The file exists but is not text
    Undecodable,
    /// Likely locked or mid-write; try again later
    Transient,
}

impl ReadFailure {
    pub fn classify(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ReadFailure::Missing,
            io::ErrorKind::InvalidData => ReadFailure::Undecodable,
            _ => ReadFailure::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_local_fs_reads_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.d.ts");
        std::fs::write(&path, "export declare function f(): void;\n").unwrap();

        let content = LocalFs::new().read_to_string(&path).unwrap();
        assert!(content.starts_with("export declare"));
    }

    #[test]
    fn test_classify_read_failures() {
        let dir = tempdir().unwrap();

        let missing = LocalFs.read_to_string(&dir.path().join("nope.d.ts")).unwrap_err();
        assert_eq!(ReadFailure::classify(&missing), ReadFailure::Missing);

        let binary = dir.path().join("bin.d.ts");
        std::fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();
        let undecodable = LocalFs.read_to_string(&binary).unwrap_err();
        assert_eq!(ReadFailure::classify(&undecodable), ReadFailure::Undecodable);

        let locked = io::Error::new(io::ErrorKind::PermissionDenied, "locked");
        assert_eq!(ReadFailure::classify(&locked), ReadFailure::Transient);
    }
}
