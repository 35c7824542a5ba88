//! Conventions of a typings repository checkout.

use rustc_hash::FxHashSet;

/// Name of the manifest listing files that are shipped but not reachable
/// from `tsconfig.json`.
pub const OTHER_FILES_NAME: &str = "OTHER_FILES.txt";

pub const TSCONFIG_NAME: &str = "tsconfig.json";
pub const TSLINT_NAME: &str = "tslint.json";
pub const PACKAGE_JSON_NAME: &str = "package.json";
pub const INDEX_DECLARATION: &str = "index.d.ts";

/// Node core modules. Imports of these are satisfied by the `node` typings
/// and never become package dependencies.
pub const NODE_BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "timers",
    "tls",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "zlib",
];

/// Libraries that ship their own typings and may appear in a package's
/// `package.json`.
pub const DEFAULT_DEPENDENCY_WHITELIST: &[&str] = &[
    "@babel/parser",
    "@babel/types",
    "@firebase/app-types",
    "ast-types",
    "axios",
    "csstype",
    "date-fns",
    "decimal.js",
    "graphql",
    "immutable",
    "moment",
    "popper.js",
    "redux",
    "rxjs",
    "typescript",
    "vue",
];

/// Directory entries that never need to be referenced, besides a readme.
const IGNORED_FILES: &[&str] = &["NOTICE", ".editorconfig"];
/// Directories skipped by the unused-file audit.
const IGNORED_DIRECTORIES: &[&str] = &["node_modules", "scripts"];

#[derive(Debug, Clone)]
pub struct Settings {
    pub other_files_name: String,
    node_builtins: FxHashSet<String>,
    dependency_whitelist: FxHashSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            other_files_name: OTHER_FILES_NAME.to_string(),
            node_builtins: NODE_BUILTINS.iter().map(|s| s.to_string()).collect(),
            dependency_whitelist: DEFAULT_DEPENDENCY_WHITELIST
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Settings {
    /// Replace the `package.json` dependency whitelist.
    pub fn with_dependency_whitelist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependency_whitelist = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_node_builtin(&self, name: &str) -> bool {
        self.node_builtins.contains(name)
    }

    pub fn is_whitelisted_dependency(&self, name: &str) -> bool {
        self.dependency_whitelist.contains(name)
    }

    /// Files that may sit in a package directory without being referenced.
    pub fn is_ignored_file(&self, name: &str) -> bool {
        name == self.other_files_name
            || name.eq_ignore_ascii_case("readme.md")
            || IGNORED_FILES.contains(&name)
    }

    pub fn is_ignored_directory(&self, name: &str) -> bool {
        IGNORED_DIRECTORIES.contains(&name)
    }
}

/// Parse a newline-delimited whitelist. Blank lines and `#` comments are
/// skipped.
pub fn parse_whitelist(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignored_files_follow_repository_conventions() {
        let settings = Settings::default();
        assert!(settings.is_ignored_file("README.md"));
        assert!(settings.is_ignored_file("readme.md"));
        assert!(settings.is_ignored_file("NOTICE"));
        assert!(!settings.is_ignored_file("notice"));
        assert!(settings.is_ignored_file(".editorconfig"));
        assert!(settings.is_ignored_file("OTHER_FILES.txt"));
        assert!(!settings.is_ignored_file("index.js"));
    }

    #[test]
    fn whitelist_override_replaces_defaults() {
        let settings = Settings::default().with_dependency_whitelist(["left-pad"]);
        assert!(settings.is_whitelisted_dependency("left-pad"));
        assert!(!settings.is_whitelisted_dependency("moment"));
    }

    #[test]
    fn parse_whitelist_skips_comments_and_blank_lines() {
        let names = parse_whitelist("# header\nmoment\n\n  rxjs  # streams\n");
        assert_eq!(names, vec!["moment".to_string(), "rxjs".to_string()]);
    }

    #[test]
    fn node_builtins_are_recognized() {
        let settings = Settings::default();
        assert!(settings.is_node_builtin("fs"));
        assert!(settings.is_node_builtin("zlib"));
        assert!(!settings.is_node_builtin("react"));
    }
}
