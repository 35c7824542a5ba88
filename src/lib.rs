//! Metadata extraction for typings packages.
//!
//! Given one package directory of a DefinitelyTyped-style checkout, find
//! every file the package consists of, classify declarations and tests,
//! collect dependencies, globals and ambient modules, validate the directory
//! conventions, and produce one [`TypingsData`] record per major version.
//!
//! ```no_run
//! use typings_meta::{DiskTree, Settings, build_package};
//!
//! let tree = DiskTree::new("DefinitelyTyped/types/react");
//! let versions = build_package("react", &tree, &Settings::default())?;
//! for (major, data) in &versions {
//!     println!("{major}: {} ({})", data.full_npm_name(), data.content_hash);
//! }
//! # Ok::<(), typings_meta::TypingsError>(())
//! ```

// Error type shared by every stage
pub mod error;
pub use error::{Result, TypingsError};

// Slash-separated path helpers and scoped-name mangling
pub mod paths;

// Read-only file tree abstraction (disk and in-memory)
pub mod file_tree;
pub use file_tree::{Dir, DiskTree, FileTree, InMemoryTree};

// Tokenizer and statement-level skim of declaration files
pub mod scanner;
pub mod source_file;
pub use source_file::{DeclarationFile, FileKind};

// Reference graph builder
pub mod references;
pub use references::{FileMap, FileSets, SourceCache, resolve_graph};

// Dependencies, globals and ambient modules of a file set
pub mod module_info;
pub use module_info::{ModuleInfo, extract_module_info, extract_test_dependencies};

// Root declaration header
pub mod header;

// Build manifest, package manifest and repository conventions
pub mod package_json;
pub mod settings;
pub mod tsconfig;
pub use settings::Settings;

// Accounting of every file in a package directory
pub mod unused_files;

pub mod content_hash;

// Output records
pub mod packages;
pub use packages::{DependencyVersion, PackageId, PathMapping, TypeScriptVersion, TypingsData};

// Per-package driver
pub mod definition_parser;
pub use definition_parser::{TypingsVersions, build_package, calculate_dependencies, get_typing_info};

pub mod tracing_config;

// Miniature checkout shared by the unit tests
#[cfg(test)]
#[path = "tests/mock_dt.rs"]
pub(crate) mod mock_dt;
