//! Reference graph: the transitive closure of files a package consists of.
//!
//! Starting from the `files` list of a build manifest, every local
//! `<reference path>`, every self-referencing `<reference types>` and every
//! relative (or self-package) import is followed. Files are split into
//! declaration files (`types`) and everything else (`tests`), both in
//! discovery order.
//!
//! References to other packages are not traversed; they are dependency
//! evidence, picked up later by [`crate::module_info`].

use crate::error::{Result, TypingsError};
use crate::file_tree::FileTree;
use crate::paths::{
    dirname, has_windows_slashes, is_declaration_file, is_own_package, join_paths, normalize,
    own_subpath, pinned_major_version,
};
use crate::source_file::DeclarationFile;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Parsed files keyed by package-relative path, in discovery order.
pub type FileMap = IndexMap<String, Arc<DeclarationFile>>;

#[derive(Debug, Clone, Default)]
pub struct FileSets {
    pub types: FileMap,
    pub tests: FileMap,
}

impl FileSets {
    pub fn contains(&self, path: &str) -> bool {
        self.types.contains_key(path) || self.tests.contains_key(path)
    }
}

/// Read a file, rejecting text that starts with a byte-order mark.
pub fn read_file_and_throw_on_bom(tree: &dyn FileTree, path: &str) -> Result<String> {
    let text = tree.read_file(path)?;
    if text.starts_with('\u{feff}') {
        return Err(TypingsError::BOMDetected {
            path: path.to_string(),
        });
    }
    Ok(text)
}

/// Per-directory parse cache: each path is read and parsed at most once.
pub struct SourceCache<'t> {
    tree: &'t dyn FileTree,
    parsed: FxHashMap<String, Arc<DeclarationFile>>,
}

impl<'t> SourceCache<'t> {
    pub fn new(tree: &'t dyn FileTree) -> Self {
        Self {
            tree,
            parsed: FxHashMap::default(),
        }
    }

    pub fn tree(&self) -> &'t dyn FileTree {
        self.tree
    }

    pub fn get_or_parse(&mut self, path: &str) -> Result<Arc<DeclarationFile>> {
        if let Some(file) = self.parsed.get(path) {
            return Ok(Arc::clone(file));
        }
        let text = read_file_and_throw_on_bom(self.tree, path)?;
        let file = Arc::new(DeclarationFile::parse(path, text));
        self.parsed.insert(path.to_string(), Arc::clone(&file));
        Ok(file)
    }

    pub fn len(&self) -> usize {
        self.parsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Reference {
    text: String,
    /// Exact references name a file; others are module specifiers that go
    /// through [`resolve_module`].
    exact: bool,
}

/// Discover every file reachable from `entry_files`.
///
/// `base_directory` is the location of the cache's tree relative to the
/// package root: empty for the package root itself, `ts3.1` for a toolchain
/// directory. It decides whether a `../` reference still lands inside the
/// package.
pub fn resolve_graph(
    entry_files: &[String],
    cache: &mut SourceCache<'_>,
    package_name: &str,
    base_directory: &str,
) -> Result<FileSets> {
    let tree = cache.tree();
    let mut sets = FileSets::default();
    let mut seen_references: rustc_hash::FxHashSet<String> = Default::default();

    let mut stack: Vec<Reference> = entry_files
        .iter()
        .rev()
        .map(|text| Reference {
            text: text.clone(),
            exact: true,
        })
        .collect();

    while let Some(reference) = stack.pop() {
        if !seen_references.insert(reference.text.clone()) {
            continue;
        }

        let resolved = if reference.exact {
            reference.text.clone()
        } else {
            resolve_module(&reference.text, tree)
        };
        if sets.contains(&resolved) {
            continue;
        }
        if !tree.exists(&resolved) {
            debug!(
                package = package_name,
                reference = %reference.text,
                resolved = %resolved,
                "skipping reference to missing file"
            );
            continue;
        }

        let src = cache.get_or_parse(&resolved)?;
        let refs = find_referenced_files(&src, package_name, dirname(&resolved), base_directory)?;
        trace!(file = %resolved, refs = refs.len(), "discovered");

        if is_declaration_file(&resolved) {
            sets.types.insert(resolved, src);
        } else {
            sets.tests.insert(resolved, src);
        }
        stack.extend(refs.into_iter().rev());
    }

    Ok(sets)
}

/// `./foo` → `foo.d.ts`, `foo.ts`, `foo.tsx` or `foo/index.d.ts`.
fn resolve_module(specifier: &str, tree: &dyn FileTree) -> String {
    let specifier = specifier.strip_suffix('/').unwrap_or(specifier);
    if specifier != "." && specifier != ".." {
        for ext in [".d.ts", ".ts", ".tsx"] {
            let candidate = format!("{specifier}{ext}");
            if tree.exists(&candidate) {
                return candidate;
            }
        }
    }
    if specifier == "." {
        "index.d.ts".to_string()
    } else {
        join_paths(specifier, "index.d.ts")
    }
}

fn find_referenced_files(
    src: &DeclarationFile,
    package_name: &str,
    sub_directory: &str,
    base_directory: &str,
) -> Result<Vec<Reference>> {
    let parent_self_prefix = format!("../{package_name}/");
    let mut refs = Vec::new();

    // Any <reference path="foo"> is local.
    for target in src.path_references() {
        refs.push(local_reference(src, target, true, package_name, sub_directory, base_directory)?);
    }

    for target in src.type_references() {
        if target.starts_with(&parent_self_prefix) {
            refs.push(local_reference(src, target, false, package_name, sub_directory, base_directory)?);
        } else if let Some(rest) = own_subpath(package_name, target) {
            let relative = relative_to_package_root(rest, sub_directory);
            refs.push(local_reference(src, &relative, false, package_name, sub_directory, base_directory)?);
        } else if let Some((other, _)) = pinned_major_version(target) {
            if !is_own_package(package_name, other) {
                return Err(TypingsError::ForeignVersionReference {
                    file: src.path.clone(),
                    reference: target.to_string(),
                    package: other.to_string(),
                });
            }
        }
    }

    for specifier in &src.imports {
        if specifier.starts_with('.') {
            refs.push(local_reference(src, specifier, false, package_name, sub_directory, base_directory)?);
        } else if let Some(rest) = own_subpath(package_name, specifier) {
            let relative = relative_to_package_root(rest, sub_directory);
            refs.push(local_reference(src, &relative, false, package_name, sub_directory, base_directory)?);
        }
    }

    Ok(refs)
}

/// `pkg/foo` seen from `sub/dir` is `./../../foo`.
fn relative_to_package_root(rest: &str, sub_directory: &str) -> String {
    let depth = sub_directory
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .count();
    format!(".{}/{}", "/..".repeat(depth), rest)
}

fn local_reference(
    src: &DeclarationFile,
    text: &str,
    exact: bool,
    package_name: &str,
    sub_directory: &str,
    base_directory: &str,
) -> Result<Reference> {
    if has_windows_slashes(text) {
        return Err(TypingsError::WindowsSlash {
            package: package_name.to_string(),
            path: format!("{} (referenced from {})", text, src.path),
        });
    }
    let full = normalize(&join_paths(sub_directory, text));

    // Toolchain directories may reach back into the package root.
    if let Some(rest) = full.strip_prefix(&format!("../{package_name}/")) {
        return Ok(Reference {
            text: rest.to_string(),
            exact,
        });
    }
    if full.starts_with("..")
        && (base_directory.is_empty() || normalize(&join_paths(base_directory, &full)).starts_with(".."))
    {
        return Err(TypingsError::ParentReference {
            file: src.path.clone(),
            reference: text.to_string(),
        });
    }
    Ok(Reference { text: full, exact })
}

#[cfg(test)]
#[path = "tests/references_tests.rs"]
mod tests;
