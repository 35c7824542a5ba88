//! Slash-separated relative path helpers.
//!
//! Package-relative paths are always `/`-separated strings, independent of the
//! host platform, so they can be used directly as map keys and hashed.

/// Join two relative paths, treating an empty or `.` base as the root.
pub fn join_paths(base: &str, rest: &str) -> String {
    if base.is_empty() || base == "." {
        rest.to_string()
    } else if rest.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), rest)
    }
}

/// Collapse `.` and `..` segments. Leading `..` segments that cannot be
/// collapsed are preserved, so `../a` stays `../a`.
pub fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(out.last(), Some(last) if *last != "..") {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            _ => out.push(segment),
        }
    }
    if out.is_empty() {
        ".".to_string()
    } else {
        out.join("/")
    }
}

/// Directory part of a relative path (`.` for a bare file name).
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => ".",
    }
}

pub fn has_windows_slashes(path: &str) -> bool {
    path.contains('\\')
}

pub fn without_start<'a>(s: &'a str, start: &str) -> Option<&'a str> {
    s.strip_prefix(start)
}

pub fn without_end<'a>(s: &'a str, end: &str) -> Option<&'a str> {
    s.strip_suffix(end)
}

/// Parse a strict `v<digits>` directory name.
pub fn parse_major_version_from_directory_name(name: &str) -> Option<u32> {
    let digits = name.strip_prefix('v')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `foo__bar` names the directory holding the types for `@foo/bar`.
///
/// Returns `None` when the name is not in mangled form.
pub fn unmangle_scoped_package(name: &str) -> Option<String> {
    let (scope, package) = name.split_once("__")?;
    Some(format!("@{scope}/{package}"))
}

/// Inverse of [`unmangle_scoped_package`]. Unscoped names are returned as-is.
pub fn mangle_scoped_package(name: &str) -> String {
    match name.strip_prefix('@').and_then(|rest| rest.split_once('/')) {
        Some((scope, package)) => format!("{scope}__{package}"),
        None => name.to_string(),
    }
}

/// Whether `name` refers to the package stored in directory `package_name`,
/// either directly or through its scoped name (`@foo/bar` for `foo__bar`).
pub fn is_own_package(package_name: &str, name: &str) -> bool {
    name == package_name || (name.starts_with('@') && mangle_scoped_package(name) == package_name)
}

/// Sub-path of a specifier that points into the package itself, e.g. `sub`
/// for `@foo/bar/sub` inside `foo__bar`.
pub fn own_subpath<'a>(package_name: &str, specifier: &'a str) -> Option<&'a str> {
    let (root, subpath) = split_package_specifier(specifier);
    if is_own_package(package_name, root) { subpath } else { None }
}

/// Whether a path names a TypeScript declaration file.
pub fn is_declaration_file(path: &str) -> bool {
    path.ends_with(".d.ts")
}

/// Split a bare module specifier into its package name and sub-path.
///
/// Scoped names keep their `@scope/name` prefix: `@foo/bar/baz` splits into
/// `@foo/bar` and `baz`.
pub fn split_package_specifier(specifier: &str) -> (&str, Option<&str>) {
    let name_end = if specifier.starts_with('@') {
        specifier
            .find('/')
            .and_then(|scope_end| specifier[scope_end + 1..].find('/').map(|i| scope_end + 1 + i))
    } else {
        specifier.find('/')
    };
    match name_end {
        Some(end) => (&specifier[..end], Some(&specifier[end + 1..])),
        None => (specifier, None),
    }
}

/// The package a bare specifier belongs to.
pub fn root_name(specifier: &str) -> &str {
    split_package_specifier(specifier).0
}

/// `<package>/v<N>` pins major version `N` of `<package>`.
pub fn pinned_major_version(specifier: &str) -> Option<(&str, u32)> {
    let (root, subpath) = split_package_specifier(specifier);
    let last = subpath?.rsplit('/').next()?;
    parse_major_version_from_directory_name(last).map(|version| (root, version))
}

#[cfg(test)]
#[path = "tests/paths_tests.rs"]
mod tests;
