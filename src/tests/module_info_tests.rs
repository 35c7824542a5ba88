use super::*;
use crate::file_tree::{Dir, FileTree};
use crate::mock_dt::{mock_package, package_tree};
use crate::references::{FileSets, resolve_graph};
use std::sync::Arc;

fn sets(tree: &dyn FileTree, package: &str, entries: &[&str]) -> FileSets {
    let entries: Vec<String> = entries.iter().map(|e| e.to_string()).collect();
    let mut cache = SourceCache::new(tree);
    resolve_graph(&entries, &mut cache, package, "").unwrap()
}

fn names(set: &BTreeSet<String>) -> Vec<&str> {
    set.iter().map(String::as_str).collect()
}

fn file_map(files: &[(&str, &str)]) -> FileMap {
    files
        .iter()
        .map(|(path, text)| (path.to_string(), Arc::new(DeclarationFile::parse(*path, *text))))
        .collect()
}

#[test]
fn collects_dependencies_across_the_whole_file_set() {
    let tree = mock_package("boring");
    let mut cache = SourceCache::new(tree.as_ref());
    let entries = vec!["index.d.ts".to_string(), "boring-tests.ts".to_string()];
    let mut types = resolve_graph(&entries, &mut cache, "boring", "").unwrap().types;
    types.insert(
        "untested.d.ts".to_string(),
        cache.get_or_parse("untested.d.ts").unwrap(),
    );

    let info = extract_module_info("boring", &types).unwrap();
    assert_eq!(
        names(&info.dependencies),
        vec!["manual", "react", "react-default", "things", "vorticon"]
    );
    assert!(info.declared_modules.is_empty());
    assert!(info.globals.is_empty());
}

#[test]
fn type_references_in_unlisted_files_count() {
    let tree = mock_package("globby");
    let types = sets(
        tree.as_ref(),
        "globby",
        &["index.d.ts", "globby-tests.ts", "test/other-tests.ts"],
    )
    .types;
    assert_eq!(
        types.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["index.d.ts", "sneaky.d.ts", "merges.d.ts"]
    );

    let info = extract_module_info("globby", &types).unwrap();
    assert_eq!(names(&info.dependencies), vec!["andere"]);
    assert_eq!(names(&info.globals), vec!["globby", "sneaky"]);
}

#[test]
fn global_script_globals() {
    let tree = mock_package("jquery");
    let types = sets(tree.as_ref(), "jquery", &["index.d.ts"]).types;
    let info = extract_module_info("jquery", &types).unwrap();
    assert_eq!(names(&info.globals), vec!["$", "jQuery"]);
    assert!(info.dependencies.is_empty());
}

#[test]
fn declared_modules_are_not_dependencies() {
    let types = file_map(&[
        ("index.d.ts", "import * as fs from 'fs';\nimport 'ambient';\nexport {};\n"),
        ("ambient.d.ts", "declare module 'ambient' {\n    const x: number;\n}\n"),
    ]);
    let info = extract_module_info("pkg", &types).unwrap();
    assert_eq!(names(&info.dependencies), vec!["fs"]);
    assert_eq!(names(&info.declared_modules), vec!["ambient"]);
}

#[test]
fn subpaths_and_scoped_names_reduce_to_the_package() {
    let types = file_map(&[(
        "index.d.ts",
        "/// <reference types=\"node/fs\" />\n\
         import { a } from 'lodash/fp';\n\
         import { b } from '@scope/thing/deep/path';\n\
         import { c } from 'pkg/sub';\n\
         import { d } from './local';\n\
         export {};\n",
    )]);
    let info = extract_module_info("pkg", &types).unwrap();
    assert_eq!(names(&info.dependencies), vec!["@scope/thing", "lodash", "node"]);
}

#[test]
fn pinned_type_reference_to_another_package_fails() {
    let types = file_map(&[("index.d.ts", "/// <reference types=\"elser/v3\" />\n")]);
    let err = extract_module_info("typeref-fails", &types).unwrap_err();
    assert!(matches!(err, TypingsError::ForeignVersionReference { ref package, .. } if package == "elser"));
    assert!(
        err.to_string()
            .contains("do not directly import specific versions of another types package")
    );
}

#[test]
fn pinned_import_of_another_package_fails() {
    let types = file_map(&[("index.d.ts", "import * as r from 'react/v15';\nexport {};\n")]);
    let err = extract_module_info("mine", &types).unwrap_err();
    assert!(matches!(err, TypingsError::ForeignVersionImport { .. }), "{err}");
}

#[test]
fn pinned_self_reference_is_allowed() {
    let types = file_map(&[("index.d.ts", "/// <reference types=\"mine/v2\" />\nexport {};\n")]);
    let info = extract_module_info("mine", &types).unwrap();
    assert!(info.dependencies.is_empty());
}

#[test]
fn test_dependencies_exclude_known_and_own_names() {
    let tree = mock_package("boring");
    let mut cache = SourceCache::new(tree.as_ref());
    let entries = vec!["index.d.ts".to_string(), "boring-tests.ts".to_string()];
    let sets = resolve_graph(&entries, &mut cache, "boring", "").unwrap();
    let info = extract_module_info("boring", &sets.types).unwrap();

    let test_deps = extract_test_dependencies(
        "boring",
        &sets.types,
        sets.tests.keys().map(String::as_str),
        &info.dependencies,
        &mut cache,
    )
    .unwrap();
    assert_eq!(names(&test_deps), vec!["super-big-fun-hus"]);
}

#[test]
fn test_dependencies_skip_declaration_files_and_declared_modules() {
    let tree = package_tree(
        "pkg",
        Dir::new()
            .with_file("index.d.ts", "declare module 'virtual' {}\n")
            .with_file(
                "pkg-tests.ts",
                "/// <reference types=\"jest\" />\nimport 'virtual';\nimport 'chai';\n",
            ),
    );
    let mut cache = SourceCache::new(&tree);
    let types = file_map(&[("index.d.ts", "declare module 'virtual' {}\n")]);

    let test_deps = extract_test_dependencies(
        "pkg",
        &types,
        ["index.d.ts", "pkg-tests.ts"],
        &BTreeSet::new(),
        &mut cache,
    )
    .unwrap();
    assert_eq!(names(&test_deps), vec!["chai", "jest"]);
}

#[test]
fn scoped_package_does_not_depend_on_itself() {
    let tree = mock_package("foo__bar");
    let mut cache = SourceCache::new(tree.as_ref());
    let entries = vec!["index.d.ts".to_string(), "foo__bar-tests.ts".to_string()];
    let sets = resolve_graph(&entries, &mut cache, "foo__bar", "").unwrap();

    let info = extract_module_info("foo__bar", &sets.types).unwrap();
    assert!(info.dependencies.is_empty(), "{:?}", info.dependencies);

    let test_deps = extract_test_dependencies(
        "foo__bar",
        &sets.types,
        sets.tests.keys().map(String::as_str),
        &info.dependencies,
        &mut cache,
    )
    .unwrap();
    assert_eq!(names(&test_deps), vec!["chai"]);
}

#[test]
fn pinned_scoped_self_reference_is_allowed() {
    let types = file_map(&[("index.d.ts", "/// <reference types=\"@foo/bar/v2\" />\nexport {};\n")]);
    let info = extract_module_info("foo__bar", &types).unwrap();
    assert!(info.dependencies.is_empty());
}
