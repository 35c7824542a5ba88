use super::*;

#[test]
fn join_treats_empty_and_dot_base_as_root() {
    assert_eq!(join_paths("", "a.d.ts"), "a.d.ts");
    assert_eq!(join_paths(".", "a.d.ts"), "a.d.ts");
    assert_eq!(join_paths("lib/", "a.d.ts"), "lib/a.d.ts");
    assert_eq!(join_paths("lib", ""), "lib");
}

#[test]
fn normalize_collapses_dots() {
    assert_eq!(normalize("./a/./b"), "a/b");
    assert_eq!(normalize("a/../b"), "b");
    assert_eq!(normalize("test/./../merges"), "merges");
    assert_eq!(normalize("../a"), "../a");
    assert_eq!(normalize("../../a/../b"), "../../b");
    assert_eq!(normalize("a/.."), ".");
}

#[test]
fn dirname_of_bare_file_is_dot() {
    assert_eq!(dirname("index.d.ts"), ".");
    assert_eq!(dirname("test/other-tests.ts"), "test");
    assert_eq!(dirname("a/b/c.d.ts"), "a/b");
}

#[test]
fn major_version_directories_are_strict() {
    assert_eq!(parse_major_version_from_directory_name("v1"), Some(1));
    assert_eq!(parse_major_version_from_directory_name("v15"), Some(15));
    assert_eq!(parse_major_version_from_directory_name("v"), None);
    assert_eq!(parse_major_version_from_directory_name("v1.d.ts"), None);
    assert_eq!(parse_major_version_from_directory_name("v1.5"), None);
    assert_eq!(parse_major_version_from_directory_name("ts3.1"), None);
}

#[test]
fn scoped_names_mangle_both_ways() {
    assert_eq!(unmangle_scoped_package("babel__core").as_deref(), Some("@babel/core"));
    assert_eq!(unmangle_scoped_package("react"), None);
    assert_eq!(mangle_scoped_package("@babel/core"), "babel__core");
    assert_eq!(mangle_scoped_package("react"), "react");
}

#[test]
fn package_specifiers_keep_scope() {
    assert_eq!(split_package_specifier("react"), ("react", None));
    assert_eq!(split_package_specifier("react/jsx-runtime"), ("react", Some("jsx-runtime")));
    assert_eq!(split_package_specifier("@babel/core"), ("@babel/core", None));
    assert_eq!(
        split_package_specifier("@babel/core/lib/parse"),
        ("@babel/core", Some("lib/parse"))
    );
    assert_eq!(root_name("lodash/fp/map"), "lodash");
}

#[test]
fn pinned_versions_are_detected_on_the_last_segment() {
    assert_eq!(pinned_major_version("elser/v3"), Some(("elser", 3)));
    assert_eq!(pinned_major_version("@scope/pkg/v2"), Some(("@scope/pkg", 2)));
    assert_eq!(pinned_major_version("elser"), None);
    assert_eq!(pinned_major_version("elser/v3/extra"), None);
    assert_eq!(pinned_major_version("elser/version"), None);
}

#[test]
fn windows_slashes_and_declaration_files() {
    assert!(has_windows_slashes("lib\\a.d.ts"));
    assert!(!has_windows_slashes("lib/a.d.ts"));
    assert!(is_declaration_file("index.d.ts"));
    assert!(!is_declaration_file("index.ts"));
    assert_eq!(without_start("foo/v2", "foo/"), Some("v2"));
    assert_eq!(without_end("foo/*", "/*"), Some("foo"));
}

#[test]
fn own_package_matches_directory_and_scoped_names() {
    assert!(is_own_package("foo__bar", "foo__bar"));
    assert!(is_own_package("foo__bar", "@foo/bar"));
    assert!(!is_own_package("foo__bar", "@foo/baz"));
    assert!(!is_own_package("bar", "@foo/bar"));
    assert_eq!(own_subpath("foo__bar", "@foo/bar/sub/deep"), Some("sub/deep"));
    assert_eq!(own_subpath("foo__bar", "@foo/bar"), None);
    assert_eq!(own_subpath("boring", "boring/secondary"), Some("secondary"));
    assert_eq!(own_subpath("boring", "boringer/secondary"), None);
}
