//! dtswatch - TypeScript declaration watcher
//!
//! Parses `export declare function` lines from `.d.ts` files into a
//! structure tree of modules and keeps that tree current while the
//! declaration directory and its config file change on disk. A code
//! generator consumes the published tree snapshots.

pub mod config;
pub mod error;
pub mod fs;
pub mod models;
pub mod parser;
pub mod scan;
pub mod tree;
pub mod watcher;

// Re-exports for convenience
pub use config::{Config, ConfigDiff};
pub use error::{DtsError, DtsResult, GrammarError};
pub use models::{FunctionSignature, Module, Parameter};
pub use parser::parse_declaration;
pub use scan::{parse_directory, ScanReport};
pub use tree::StructureTree;
pub use watcher::{DeclarationWatcher, WatchEvent, WatchEventSink, WatchHandle, WatchOptions};
