use super::*;
use crate::file_tree::Dir;
use crate::mock_dt::{mock_package, package_tree};

fn resolve(tree: &dyn FileTree, package: &str, entries: &[&str]) -> Result<FileSets> {
    let entries: Vec<String> = entries.iter().map(|e| e.to_string()).collect();
    let mut cache = SourceCache::new(tree);
    resolve_graph(&entries, &mut cache, package, "")
}

fn keys(map: &FileMap) -> Vec<&str> {
    map.keys().map(String::as_str).collect()
}

#[test]
fn follows_references_and_self_imports_in_discovery_order() {
    let tree = mock_package("boring");
    let sets = resolve(tree.as_ref(), "boring", &["index.d.ts", "boring-tests.ts"]).unwrap();
    assert_eq!(
        keys(&sets.types),
        vec![
            "index.d.ts",
            "secondary.d.ts",
            "commonjs.d.ts",
            "v1.d.ts",
            "quaternary.d.ts",
            "tertiary.d.ts",
        ]
    );
    assert_eq!(keys(&sets.tests), vec!["boring-tests.ts"]);
}

#[test]
fn tests_alone_still_reach_declarations() {
    let tree = mock_package("boring");
    let sets = resolve(tree.as_ref(), "boring", &["boring-tests.ts"]).unwrap();
    assert_eq!(
        keys(&sets.types),
        vec![
            "secondary.d.ts",
            "commonjs.d.ts",
            "v1.d.ts",
            "quaternary.d.ts",
            "tertiary.d.ts",
        ]
    );
    assert!(!sets.contains("index.d.ts"));
}

#[test]
fn global_script_references() {
    let tree = mock_package("jquery");
    let sets = resolve(tree.as_ref(), "jquery", &["jquery-tests.ts", "index.d.ts"]).unwrap();
    assert_eq!(keys(&sets.types), vec!["index.d.ts", "JQuery.d.ts"]);
    assert_eq!(keys(&sets.tests), vec!["jquery-tests.ts"]);
}

#[test]
fn self_type_references_from_nested_tests() {
    let tree = mock_package("globby");
    let sets = resolve(
        tree.as_ref(),
        "globby",
        &["globby-tests.ts", "test/other-tests.ts"],
    )
    .unwrap();
    assert_eq!(keys(&sets.types), vec!["merges.d.ts"]);
    assert_eq!(keys(&sets.tests), vec!["globby-tests.ts", "test/other-tests.ts"]);
}

#[test]
fn types_and_tests_are_disjoint_and_stable() {
    let tree = mock_package("boring");
    let entries = ["index.d.ts", "boring-tests.ts"];
    let first = resolve(tree.as_ref(), "boring", &entries).unwrap();
    let second = resolve(tree.as_ref(), "boring", &entries).unwrap();

    for path in first.types.keys() {
        assert!(!first.tests.contains_key(path), "{path} in both sets");
    }
    assert_eq!(keys(&first.types), keys(&second.types));
    assert_eq!(keys(&first.tests), keys(&second.tests));
}

#[test]
fn cache_parses_each_file_once() {
    let tree = mock_package("boring");
    let mut cache = SourceCache::new(tree.as_ref());
    let entries = vec!["index.d.ts".to_string(), "boring-tests.ts".to_string()];
    resolve_graph(&entries, &mut cache, "boring", "").unwrap();
    assert_eq!(cache.len(), 7);

    let again = cache.get_or_parse("secondary.d.ts").unwrap();
    assert_eq!(again.path, "secondary.d.ts");
    assert_eq!(cache.len(), 7);
}

#[test]
fn directory_imports_resolve_to_index() {
    let tree = package_tree(
        "dirs",
        Dir::new()
            .with_file("index.d.ts", "export * from './lib';\nexport * from './util/';\n")
            .with_file("lib/index.d.ts", "export const lib: number;\n")
            .with_file("util.d.ts", "export const util: number;\n"),
    );
    let sets = resolve(&tree, "dirs", &["index.d.ts"]).unwrap();
    assert_eq!(
        keys(&sets.types),
        vec!["index.d.ts", "lib/index.d.ts", "util.d.ts"]
    );
}

#[test]
fn missing_references_are_skipped() {
    let tree = package_tree(
        "holes",
        Dir::new().with_file(
            "index.d.ts",
            "/// <reference path=\"missing.d.ts\" />\nimport './gone';\nexport {};\n",
        ),
    );
    let sets = resolve(&tree, "holes", &["index.d.ts"]).unwrap();
    assert_eq!(keys(&sets.types), vec!["index.d.ts"]);
    assert!(sets.tests.is_empty());
}

#[test]
fn parent_references_are_rejected() {
    let tree = package_tree(
        "escape",
        Dir::new().with_file("index.d.ts", "/// <reference path=\"../other/index.d.ts\" />\n"),
    );
    let err = resolve(&tree, "escape", &["index.d.ts"]).unwrap_err();
    assert!(matches!(err, TypingsError::ParentReference { .. }), "{err}");
    assert!(err.to_string().contains("not parent (\"../xxx\") references"));
}

#[test]
fn parent_reference_through_own_directory_is_local() {
    let tree = package_tree(
        "loopy",
        Dir::new()
            .with_file("index.d.ts", "/// <reference path=\"../loopy/other.d.ts\" />\n")
            .with_file("other.d.ts", "declare var other: number;\n"),
    );
    let sets = resolve(&tree, "loopy", &["index.d.ts"]).unwrap();
    assert_eq!(keys(&sets.types), vec!["index.d.ts", "other.d.ts"]);
}

#[test]
fn toolchain_directory_may_reach_the_package_root() {
    let package = mock_package("ts-versioned");
    let ts31 = package.sub_dir("ts3.1").unwrap();
    let mut cache = SourceCache::new(ts31.as_ref());
    let sets = resolve_graph(&["index.d.ts".to_string()], &mut cache, "ts-versioned", "ts3.1").unwrap();
    assert_eq!(keys(&sets.types), vec!["index.d.ts", "../globals.d.ts"]);
}

#[test]
fn toolchain_directory_may_not_leave_the_package() {
    let tree = package_tree(
        "deep",
        Dir::new().with_file("ts3.1/index.d.ts", "/// <reference path=\"../../other/index.d.ts\" />\n"),
    );
    let ts31 = tree.sub_dir("ts3.1").unwrap();
    let mut cache = SourceCache::new(ts31.as_ref());
    let err = resolve_graph(&["index.d.ts".to_string()], &mut cache, "deep", "ts3.1").unwrap_err();
    assert!(matches!(err, TypingsError::ParentReference { .. }), "{err}");
}

#[test]
fn pinned_foreign_type_reference_fails() {
    let tree = package_tree(
        "typeref-fails",
        Dir::new().with_file("index.d.ts", "/// <reference types=\"elser/v3\" />\n"),
    );
    let err = resolve(&tree, "typeref-fails", &["index.d.ts"]).unwrap_err();
    assert!(
        err.to_string()
            .contains("do not directly import specific versions of another types package"),
        "{err}"
    );
}

#[test]
fn windows_slashes_are_rejected() {
    let tree = package_tree(
        "win",
        Dir::new().with_file("index.d.ts", "/// <reference path=\"sub\\file.d.ts\" />\n"),
    );
    let err = resolve(&tree, "win", &["index.d.ts"]).unwrap_err();
    assert!(matches!(err, TypingsError::WindowsSlash { .. }), "{err}");
}

#[test]
fn byte_order_mark_is_an_error() {
    let tree = package_tree(
        "bom",
        Dir::new().with_file("index.d.ts", "\u{feff}export const x: number;\n"),
    );
    let err = resolve(&tree, "bom", &["index.d.ts"]).unwrap_err();
    assert!(matches!(err, TypingsError::BOMDetected { ref path } if path == "index.d.ts"));
    assert!(err.to_string().contains("strip-bom index.d.ts > fix"));
}

#[test]
fn scoped_self_imports_are_local() {
    let tree = mock_package("foo__bar");
    let sets = resolve(tree.as_ref(), "foo__bar", &["index.d.ts", "foo__bar-tests.ts"]).unwrap();
    assert_eq!(keys(&sets.types), vec!["index.d.ts", "sub.d.ts"]);
    assert_eq!(keys(&sets.tests), vec!["foo__bar-tests.ts"]);
}
