//! Dependency, global and ambient-module summary of a package's files.

use crate::error::{Result, TypingsError};
use crate::paths::{is_own_package, pinned_major_version, root_name};
use crate::references::{FileMap, SourceCache};
use crate::source_file::DeclarationFile;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleInfo {
    /// External packages referenced by import or `<reference types>`.
    pub dependencies: BTreeSet<String>,
    /// Names declared with `declare module "x"` anywhere in the package.
    pub declared_modules: BTreeSet<String>,
    /// Identifiers the package adds to the global scope.
    pub globals: BTreeSet<String>,
}

/// Summarize the declaration files of one package version.
///
/// Names the package declares as ambient modules are never reported as
/// dependencies, even when the declaring file is not the importing one.
pub fn extract_module_info(package_name: &str, types: &FileMap) -> Result<ModuleInfo> {
    let mut info = ModuleInfo::default();

    for src in types.values() {
        for target in src.type_references() {
            if let Some(name) = external_type_reference(package_name, src, target)? {
                info.dependencies.insert(name);
            }
        }
        for specifier in &src.imports {
            if let Some(name) = external_import(package_name, specifier)? {
                info.dependencies.insert(name);
            }
        }
        info.declared_modules
            .extend(src.declared_modules.iter().cloned());
        info.globals.extend(src.globals.iter().cloned());
    }

    let declared = &info.declared_modules;
    info.dependencies.retain(|name| !declared.contains(name));

    debug!(
        package = package_name,
        files = types.len(),
        dependencies = info.dependencies.len(),
        globals = info.globals.len(),
        declared_modules = info.declared_modules.len(),
        "module info"
    );
    Ok(info)
}

/// Packages needed only to compile the tests.
///
/// Returns names imported or type-referenced by `test_paths` that are not in
/// `known`, not the package itself, and not declared as an ambient module by
/// any file in `types`.
pub fn extract_test_dependencies<'p>(
    package_name: &str,
    types: &FileMap,
    test_paths: impl IntoIterator<Item = &'p str>,
    known: &BTreeSet<String>,
    cache: &mut SourceCache<'_>,
) -> Result<BTreeSet<String>> {
    let declared: BTreeSet<&str> = types
        .values()
        .flat_map(|src| src.declared_modules.iter().map(String::as_str))
        .collect();

    let mut found = BTreeSet::new();
    for path in test_paths {
        if types.contains_key(path) {
            continue;
        }
        let src = cache.get_or_parse(path)?;
        let mut candidates = Vec::new();
        for target in src.type_references() {
            candidates.extend(external_type_reference(package_name, &src, target)?);
        }
        for specifier in &src.imports {
            candidates.extend(external_import(package_name, specifier)?);
        }
        for name in candidates {
            if !known.contains(&name) && !declared.contains(name.as_str()) {
                found.insert(name);
            }
        }
    }

    debug!(package = package_name, test_dependencies = found.len(), "test dependencies");
    Ok(found)
}

/// Package named by a `<reference types>` directive, unless it is local.
fn external_type_reference(
    package_name: &str,
    src: &DeclarationFile,
    target: &str,
) -> Result<Option<String>> {
    if target.starts_with('.') {
        return Ok(None);
    }
    if let Some((root, _)) = pinned_major_version(target) {
        if !is_own_package(package_name, root) {
            return Err(TypingsError::ForeignVersionReference {
                file: src.path.clone(),
                reference: target.to_string(),
                package: root.to_string(),
            });
        }
    }
    let root = root_name(target);
    Ok((!is_own_package(package_name, root)).then(|| root.to_string()))
}

/// Package named by a bare import specifier, unless it is local.
fn external_import(package_name: &str, specifier: &str) -> Result<Option<String>> {
    if specifier.starts_with('.') || specifier.is_empty() {
        return Ok(None);
    }
    if let Some((root, _)) = pinned_major_version(specifier) {
        if !is_own_package(package_name, root) {
            return Err(TypingsError::ForeignVersionImport {
                specifier: specifier.to_string(),
                package: root.to_string(),
            });
        }
    }
    let root = root_name(specifier);
    Ok((!is_own_package(package_name, root)).then(|| root.to_string()))
}

#[cfg(test)]
#[path = "tests/module_info_tests.rs"]
mod tests;
