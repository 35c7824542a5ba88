//! Turns a package directory into validated [`TypingsData`] records.
//!
//! Layout of a package directory:
//!
//! ```text
//! types/foo/
//!   index.d.ts          latest major version, carries the header
//!   tsconfig.json
//!   OTHER_FILES.txt     optional
//!   package.json        optional
//!   ts3.1/              optional alternate declarations for older compilers
//!   v2/                 older major version, laid out the same way
//! ```
//!
//! One record is produced per major version; toolchain directories are
//! folded into the record of the version they belong to.

use crate::content_hash::content_hash;
use crate::error::{Result, TypingsError};
use crate::file_tree::FileTree;
use crate::header::{Header, parse_header};
use crate::module_info::{extract_module_info, extract_test_dependencies};
use crate::package_json::{PackageJsonInfo, check_package_json};
use crate::packages::{DependencyVersion, PackageId, PathMapping, TypeScriptVersion, TypingsData};
use crate::paths::{
    is_own_package, join_paths, mangle_scoped_package, normalize, parse_major_version_from_directory_name,
    unmangle_scoped_package, without_end, without_start,
};
use crate::references::{SourceCache, read_file_and_throw_on_bom, resolve_graph};
use crate::settings::{INDEX_DECLARATION, PACKAGE_JSON_NAME, Settings, TSCONFIG_NAME, TSLINT_NAME};
use crate::tsconfig::{TsConfig, check_files, read_tsconfig};
use crate::unused_files::check_all_files_used;
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info_span};

/// Records of one package, keyed by major version.
pub type TypingsVersions = BTreeMap<u32, TypingsData>;

static TS_VERSION_DIRECTORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ts(\d+\.\d+)$").unwrap());

/// Build every major version of `package_name`. `tree` is rooted at the
/// package directory, e.g. `types/abs`.
pub fn build_package(
    package_name: &str,
    tree: &dyn FileTree,
    settings: &Settings,
) -> Result<TypingsVersions> {
    let _span = info_span!("build_package", package = package_name).entered();

    if package_name != package_name.to_lowercase() {
        return Err(TypingsError::PackageNameNotLowercase {
            package: package_name.to_string(),
        });
    }

    let mut root_ls = Vec::new();
    let mut older_versions = Vec::new();
    for name in tree.read_dir("")? {
        match parse_major_version_from_directory_name(&name) {
            Some(major) if tree.is_directory(&name) => older_versions.push((name, major)),
            _ => root_ls.push(name),
        }
    }

    let latest = combine_data_for_all_types_versions(package_name, &root_ls, tree, None, settings)?;
    let latest_version = latest.library_major_version;

    let older = older_versions
        .par_iter()
        .map(|(directory, major)| {
            if *major == latest_version {
                return Err(TypingsError::DuplicateMajorVersion {
                    package: package_name.to_string(),
                    version: latest_version,
                });
            }
            let sub = tree.sub_dir(directory)?;
            let ls = sub.read_dir("")?;
            let data =
                combine_data_for_all_types_versions(package_name, &ls, sub.as_ref(), Some(*major), settings)?;
            if data.library_major_version != *major {
                return Err(TypingsError::MajorVersionMismatch {
                    directory: directory.clone(),
                    directory_version: *major,
                    header_version: data.library_major_version,
                });
            }
            Ok(data)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut versions = TypingsVersions::new();
    versions.insert(latest_version, latest);
    for data in older {
        versions.insert(data.library_major_version, data);
    }
    debug!(package = package_name, versions = versions.len(), "built package");
    Ok(versions)
}

/// Same as [`build_package`] with default [`Settings`].
pub fn get_typing_info(package_name: &str, tree: &dyn FileTree) -> Result<TypingsVersions> {
    build_package(package_name, tree, &Settings::default())
}

struct DirectoryListing {
    remaining: Vec<String>,
    types_versions: Vec<TypeScriptVersion>,
    has_package_json: bool,
}

fn split_types_versions(ls: &[String]) -> Result<DirectoryListing> {
    let mut listing = DirectoryListing {
        remaining: Vec::new(),
        types_versions: Vec::new(),
        has_package_json: false,
    };
    for name in ls {
        if name == PACKAGE_JSON_NAME {
            listing.has_package_json = true;
            continue;
        }
        match TS_VERSION_DIRECTORY_RE.captures(name) {
            Some(caps) => {
                let version = caps[1].parse::<TypeScriptVersion>().map_err(|_| {
                    TypingsError::InvalidTypeScriptVersionDirectory {
                        directory: name.clone(),
                    }
                })?;
                listing.types_versions.push(version);
            }
            None => listing.remaining.push(name.clone()),
        }
    }
    Ok(listing)
}

/// Data of one major version directory, with all its toolchain directories.
fn combine_data_for_all_types_versions(
    package_name: &str,
    ls: &[String],
    tree: &dyn FileTree,
    old_major_version: Option<u32>,
    settings: &Settings,
) -> Result<TypingsData> {
    let listing = split_types_versions(ls)?;

    // Every toolchain directory has an index.d.ts, but only the root one has a header.
    let header = read_header(tree)?;

    let root = get_typing_data_for_single_types_version(
        None,
        package_name,
        &listing.remaining,
        tree,
        old_major_version,
        settings,
    )?;
    let others = listing
        .types_versions
        .par_iter()
        .map(|version| {
            let sub = tree.sub_dir(&format!("ts{version}"))?;
            let ls = sub.read_dir("")?;
            get_typing_data_for_single_types_version(
                Some(*version),
                package_name,
                &ls,
                sub.as_ref(),
                old_major_version,
                settings,
            )
        })
        .collect::<Result<Vec<_>>>()?;
    let all: Vec<&SingleVersionData> = std::iter::once(&root).chain(others.iter()).collect();

    let package_json = if listing.has_package_json {
        let path = join_paths(&tree.debug_path(), PACKAGE_JSON_NAME);
        check_package_json(&tree.read_json(PACKAGE_JSON_NAME)?, &path, settings)?
    } else {
        PackageJsonInfo::default()
    };

    let files: Vec<String> = all
        .iter()
        .flat_map(|data| {
            data.decl_files.iter().map(move |file| match data.typescript_version {
                None => file.clone(),
                Some(version) => normalize(&format!("ts{version}/{file}")),
            })
        })
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect();

    let hashed_paths: Vec<String> = all
        .iter()
        .filter_map(|data| data.tsconfig_paths_for_hash.clone())
        .collect();
    let hashed_files = files
        .iter()
        .map(String::as_str)
        .chain(listing.has_package_json.then_some(PACKAGE_JSON_NAME));
    let content_hash = content_hash(hashed_files, &hashed_paths, tree)?;

    let Header {
        library_name,
        library_major_version,
        library_minor_version,
        typescript_version,
        mut projects,
        contributors,
    } = header;

    Ok(TypingsData {
        library_name,
        typings_package_name: package_name.to_string(),
        project_name: if projects.is_empty() {
            String::new()
        } else {
            projects.swap_remove(0)
        },
        contributors,
        library_major_version,
        library_minor_version,
        min_ts_version: typescript_version,
        types_versions: listing.types_versions,
        files,
        license: package_json.license,
        dependencies: unique_values(&all, |d| &d.dependencies),
        test_dependencies: unique_values(&all, |d| &d.test_dependencies),
        path_mappings: unique_values(&all, |d| &d.path_mappings),
        package_json_dependencies: package_json.dependencies,
        content_hash,
        globals: unique_values(&all, |d| &d.globals),
        declared_modules: unique_values(&all, |d| &d.declared_modules),
    })
}

fn read_header(tree: &dyn FileTree) -> Result<Header> {
    let text = read_file_and_throw_on_bom(tree, INDEX_DECLARATION)?;
    parse_header(&text).map_err(|message| TypingsError::Header {
        path: join_paths(&tree.debug_path(), INDEX_DECLARATION),
        message,
    })
}

fn unique_values<T: Clone + Eq + std::hash::Hash>(
    all: &[&SingleVersionData],
    field: impl Fn(&SingleVersionData) -> &Vec<T>,
) -> Vec<T> {
    all.iter()
        .flat_map(|data| field(data).iter().cloned())
        .collect::<IndexSet<T>>()
        .into_iter()
        .collect()
}

/// What one directory (package root or `ts<x.y>`) contributes.
#[derive(Debug, Clone)]
struct SingleVersionData {
    /// `None` for the package root, whose version comes from the header.
    typescript_version: Option<TypeScriptVersion>,
    dependencies: Vec<PackageId>,
    test_dependencies: Vec<String>,
    path_mappings: Vec<PathMapping>,
    decl_files: Vec<String>,
    tsconfig_paths_for_hash: Option<String>,
    globals: Vec<String>,
    declared_modules: Vec<String>,
}

/// `ls` lists the entries of the directory `tree` is rooted at.
fn get_typing_data_for_single_types_version(
    typescript_version: Option<TypeScriptVersion>,
    package_name: &str,
    ls: &[String],
    tree: &dyn FileTree,
    old_major_version: Option<u32>,
    settings: &Settings,
) -> Result<SingleVersionData> {
    let _span = info_span!(
        "types_version",
        directory = %tree.debug_path(),
        typescript = ?typescript_version
    )
    .entered();

    let tsconfig = read_tsconfig(tree)?;
    let entry_files = check_files(package_name, &tsconfig, &tree.debug_path())?;

    let base_directory = typescript_version
        .map(|version| format!("ts{version}"))
        .unwrap_or_default();
    let mut cache = SourceCache::new(tree);
    let sets = resolve_graph(entry_files, &mut cache, package_name, &base_directory)?;

    let used_files = sets
        .types
        .keys()
        .chain(sets.tests.keys())
        .map(String::as_str)
        .chain([TSCONFIG_NAME, TSLINT_NAME]);
    let other_files = read_other_files(ls, tree, settings)?;
    check_all_files_used(ls, used_files, &other_files, package_name, tree, settings)?;

    let mut types = sets.types;
    // Listed declaration files count for dependencies but are not traversed.
    for untested in other_files.iter().filter(|name| name.ends_with(".d.ts")) {
        let src = cache.get_or_parse(untested)?;
        types.insert(untested.clone(), src);
    }

    let info = extract_module_info(package_name, &types)?;
    let test_dependencies = extract_test_dependencies(
        package_name,
        &types,
        sets.tests.keys().map(String::as_str),
        &info.dependencies,
        &mut cache,
    )?;
    let (dependencies, path_mappings) = calculate_dependencies(
        package_name,
        &tsconfig,
        &info.dependencies,
        old_major_version,
        settings,
    )?;

    let mut decl_files: Vec<String> = types.keys().cloned().collect();
    decl_files.sort();

    debug!(
        package = package_name,
        files = decl_files.len(),
        tests = sets.tests.len(),
        parsed = cache.len(),
        "resolved types version"
    );

    Ok(SingleVersionData {
        typescript_version,
        dependencies,
        test_dependencies: test_dependencies.into_iter().collect(),
        path_mappings,
        decl_files,
        tsconfig_paths_for_hash: tsconfig.paths_for_hash(),
        globals: info.globals.into_iter().collect(),
        declared_modules: info.declared_modules.into_iter().collect(),
    })
}

fn read_other_files(ls: &[String], tree: &dyn FileTree, settings: &Settings) -> Result<Vec<String>> {
    if !ls.iter().any(|name| *name == settings.other_files_name) {
        return Ok(Vec::new());
    }
    let text = tree.read_file(&settings.other_files_name)?;
    Ok(text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Reconcile `compilerOptions.paths` with the dependencies found in source.
///
/// Every discovered dependency without a version pin gets
/// [`DependencyVersion::Any`], except Node built-in modules.
pub fn calculate_dependencies(
    package_name: &str,
    tsconfig: &TsConfig,
    dependency_names: &BTreeSet<String>,
    old_major_version: Option<u32>,
    settings: &Settings,
) -> Result<(Vec<PackageId>, Vec<PathMapping>)> {
    let mut dependencies: Vec<PackageId> = Vec::new();
    let mut path_mappings = Vec::new();

    for (dependency_name, targets) in tsconfig.paths() {
        // "foo/*" supports sub-directory imports and needs a "foo" entry.
        if let Some(root) = without_end(dependency_name, "/*") {
            if !tsconfig.has_path_mapping(root) {
                return Err(TypingsError::PathMappingWithoutRoot {
                    package: package_name.to_string(),
                    pattern: dependency_name.to_string(),
                    root: root.to_string(),
                });
            }
            continue;
        }

        let [target] = targets else {
            return Err(TypingsError::PathMappingMultipleTargets {
                package: package_name.to_string(),
                dependency: dependency_name.to_string(),
            });
        };

        let Some(major_version) = mapped_major_version(package_name, dependency_name, target)? else {
            continue;
        };

        if is_self_mapping(package_name, dependency_name) {
            match old_major_version {
                None => {
                    return Err(TypingsError::SelfPathMappingInLatest {
                        package: package_name.to_string(),
                    });
                }
                Some(old) if old != major_version => {
                    return Err(TypingsError::WrongSelfPathMapping {
                        package: package_name.to_string(),
                        version: old,
                    });
                }
                Some(_) => {}
            }
        } else if dependency_names.contains(dependency_name) {
            dependencies.push(PackageId::new(
                dependency_name,
                DependencyVersion::Major(major_version),
            ));
        }
        // Mappings for dependencies of dependencies are kept too.
        path_mappings.push(PathMapping {
            package_name: dependency_name.to_string(),
            major_version,
        });
    }

    if let Some(old) = old_major_version {
        if !tsconfig.paths().any(|(name, _)| is_self_mapping(package_name, name)) {
            return Err(TypingsError::MissingSelfPathMapping {
                package: package_name.to_string(),
                version: old,
            });
        }
    }

    for dependency in dependency_names {
        if !dependencies.iter().any(|d| d.name == *dependency) && !settings.is_node_builtin(dependency) {
            dependencies.push(PackageId::new(dependency.clone(), DependencyVersion::Any));
        }
    }

    Ok((dependencies, path_mappings))
}

/// `foo__bar` is mapped under its scoped name `@foo/bar`.
fn is_self_mapping(package_name: &str, dependency_name: &str) -> bool {
    is_own_package(package_name, dependency_name)
}

/// Major version a `paths` entry pins, or `None` for a plain scoped-name
/// redirect (`"@foo/bar": ["foo__bar"]`).
fn mapped_major_version(package_name: &str, dependency_name: &str, target: &str) -> Result<Option<u32>> {
    let (directory, rest) = match target.split_once('/') {
        Some((directory, rest)) => (directory, Some(rest)),
        None => (target, None),
    };

    if dependency_name.starts_with('@') {
        let expected = mangle_scoped_package(dependency_name);
        let invalid = || TypingsError::InvalidScopedPathMapping {
            package: package_name.to_string(),
            dependency: dependency_name.to_string(),
            target: target.to_string(),
        };
        if directory != expected {
            return Err(match unmangle_scoped_package(directory) {
                Some(_) => TypingsError::ScopedPathMappingMismatch {
                    dependency: dependency_name.to_string(),
                    target: target.to_string(),
                },
                None => invalid(),
            });
        }
        return match rest {
            None => Ok(None),
            Some(version) => parse_major_version_from_directory_name(version)
                .map(Some)
                .ok_or_else(invalid),
        };
    }

    if unmangle_scoped_package(directory).is_some() {
        return Err(TypingsError::ScopedPathMappingMismatch {
            dependency: dependency_name.to_string(),
            target: target.to_string(),
        });
    }

    without_start(target, &format!("{dependency_name}/"))
        .and_then(parse_major_version_from_directory_name)
        .map(Some)
        .ok_or_else(|| TypingsError::UnexpectedPathMapping {
            package: package_name.to_string(),
            dependency: dependency_name.to_string(),
            target: target.to_string(),
        })
}

#[cfg(test)]
#[path = "tests/definition_parser_tests.rs"]
mod tests;
