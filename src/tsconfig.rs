//! The build manifest (`tsconfig.json`) of a package version directory.

use crate::error::{Result, TypingsError};
use crate::file_tree::FileTree;
use crate::paths::{is_declaration_file, join_paths};
use crate::settings::{INDEX_DECLARATION, TSCONFIG_NAME};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TsConfig {
    /// Any value here is rejected; kept loose so the error names the real problem.
    #[serde(default)]
    pub include: Option<serde_json::Value>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub compiler_options: CompilerOptions,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    #[serde(default)]
    pub paths: Option<IndexMap<String, Vec<String>>>,
}

impl TsConfig {
    /// Path mappings in file order; empty when `paths` is absent.
    pub fn paths(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.compiler_options
            .paths
            .iter()
            .flatten()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn has_path_mapping(&self, name: &str) -> bool {
        self.compiler_options
            .paths
            .as_ref()
            .is_some_and(|paths| paths.contains_key(name))
    }

    /// Canonical JSON of `compilerOptions.paths`, sorted by key, for the
    /// content hash. `None` when there are no mappings.
    pub fn paths_for_hash(&self) -> Option<String> {
        let paths = self.compiler_options.paths.as_ref()?;
        let sorted: BTreeMap<&str, &Vec<String>> =
            paths.iter().map(|(k, v)| (k.as_str(), v)).collect();
        serde_json::to_string(&sorted).ok()
    }
}

/// Read and deserialize `tsconfig.json` from `tree`.
pub fn read_tsconfig(tree: &dyn FileTree) -> Result<TsConfig> {
    let text = tree.read_file(TSCONFIG_NAME)?;
    let path = join_paths(&tree.debug_path(), TSCONFIG_NAME);
    parse_tsconfig(&text).map_err(|source| {
        // Well-formed JSON of the wrong shape, e.g. `"files": "index.d.ts"`.
        if source.is_data() {
            TypingsError::InvalidManifest {
                path,
                message: source.to_string(),
            }
        } else {
            TypingsError::InvalidJson { path, source }
        }
    })
}

/// Parse manifest text. Comments and trailing commas are tolerated.
pub fn parse_tsconfig(text: &str) -> std::result::Result<TsConfig, serde_json::Error> {
    serde_json::from_str(&remove_trailing_commas(&strip_jsonc(text)))
}

/// Validate the `files` list and return it.
///
/// Only `index.d.ts` may be listed among declaration files; anything else
/// must be a test: `<package>-tests.ts[x]` or a file under `test/`.
pub fn check_files<'c>(
    package_name: &str,
    tsconfig: &'c TsConfig,
    directory_path: &str,
) -> Result<&'c [String]> {
    let tsconfig_path = join_paths(directory_path, TSCONFIG_NAME);
    if tsconfig.include.as_ref().is_some_and(|v| !v.is_null()) {
        return Err(TypingsError::ManifestMustUseFiles {
            path: tsconfig_path,
        });
    }
    let files = tsconfig
        .files
        .as_deref()
        .ok_or_else(|| TypingsError::ManifestMissingFiles {
            path: tsconfig_path.clone(),
        })?;

    let expected_test = format!("{package_name}-tests.ts");
    for file in files {
        if file.starts_with("./") {
            return Err(TypingsError::UnnecessaryRelativePrefix {
                path: tsconfig_path,
                file: file.clone(),
            });
        }
        if is_declaration_file(file) {
            if file != INDEX_DECLARATION {
                return Err(TypingsError::OnlyRootDeclarationAllowedInManifest {
                    package: package_name.to_string(),
                    file: file.clone(),
                });
            }
            continue;
        }
        if file.starts_with("test/") {
            continue;
        }
        if *file == expected_test || *file == format!("{expected_test}x") {
            continue;
        }
        return Err(if file.ends_with(".ts") || file.ends_with(".tsx") {
            TypingsError::UnexpectedTestFileName {
                file: file.clone(),
                expected: expected_test,
                directory: directory_path.to_string(),
            }
        } else {
            TypingsError::UnexpectedFileExtension { file: file.clone() }
        });
    }
    Ok(files)
}

/// Drop `//` and `/* */` comments outside strings.
fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Drop commas directly followed (modulo whitespace) by `}` or `]`.
/// Runs after [`strip_jsonc`], so comments are already gone.
fn remove_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            ',' => {
                let mut lookahead = chars.clone();
                let next = loop {
                    match lookahead.next() {
                        Some(c) if c.is_whitespace() => continue,
                        other => break other,
                    }
                };
                if !matches!(next, Some('}' | ']')) {
                    out.push(ch);
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(json: &str) -> TsConfig {
        parse_tsconfig(json).unwrap()
    }

    #[test]
    fn malformed_and_misshapen_manifests() {
        use crate::file_tree::{Dir, InMemoryTree};

        let broken = InMemoryTree::new(Dir::new().with_file("tsconfig.json", "{ \"files\": ["), "types/x");
        assert!(matches!(read_tsconfig(&broken), Err(TypingsError::InvalidJson { .. })));

        let misshapen = InMemoryTree::new(
            Dir::new().with_file("tsconfig.json", r#"{ "files": "index.d.ts" }"#),
            "types/x",
        );
        let err = read_tsconfig(&misshapen).unwrap_err();
        assert!(
            matches!(err, TypingsError::InvalidManifest { ref path, .. } if path == "types/x/tsconfig.json"),
            "{err}"
        );
    }

    #[test]
    fn include_is_rejected() {
        let tsconfig = config(r#"{ "include": ["*.ts"], "files": ["index.d.ts"] }"#);
        let err = check_files("boring", &tsconfig, "types/boring").unwrap_err();
        assert!(
            err.to_string()
                .contains(r#"In tsconfig, don't use "include", must use "files""#),
            "{err}"
        );
    }

    #[test]
    fn missing_files_is_rejected() {
        let err = check_files("boring", &config("{}"), "types/boring").unwrap_err();
        assert!(matches!(err, TypingsError::ManifestMissingFiles { .. }));
    }

    #[test]
    fn leading_dot_slash_is_rejected() {
        let tsconfig = config(r#"{ "files": ["./index.d.ts"] }"#);
        let err = check_files("boring", &tsconfig, "types/boring").unwrap_err();
        assert!(matches!(err, TypingsError::UnnecessaryRelativePrefix { .. }));
    }

    #[test]
    fn only_index_declaration_may_be_listed() {
        let tsconfig = config(r#"{ "files": ["index.d.ts", "other.d.ts"] }"#);
        let err = check_files("boring", &tsconfig, "types/boring").unwrap_err();
        assert!(matches!(
            err,
            TypingsError::OnlyRootDeclarationAllowedInManifest { ref file, .. } if file == "other.d.ts"
        ));
    }

    #[test]
    fn test_files_follow_naming_convention() {
        let ok = config(r#"{ "files": ["index.d.ts", "boring-tests.tsx", "test/anything.ts"] }"#);
        assert_eq!(check_files("boring", &ok, "types/boring").unwrap().len(), 3);

        let misnamed = config(r#"{ "files": ["index.d.ts", "boring-test.ts"] }"#);
        let err = check_files("boring", &misnamed, "types/boring").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected file 'boring-test.ts' to be named 'boring-tests.ts' or to be inside a 'types/boring/test/' directory"
        );

        let extension = config(r#"{ "files": ["index.d.ts", "notes.md"] }"#);
        let err = check_files("boring", &extension, "types/boring").unwrap_err();
        assert!(matches!(err, TypingsError::UnexpectedFileExtension { .. }));
    }

    #[test]
    fn comments_and_trailing_commas_are_tolerated() {
        let tsconfig = config(
            r#"{
                // compiler settings
                "compilerOptions": {
                    "paths": { "react": ["react/v15"], /* pinned */ },
                },
                "files": ["index.d.ts", "boring-tests.ts",],
            }"#,
        );
        assert_eq!(tsconfig.files.as_deref().map(<[String]>::len), Some(2));
        assert!(tsconfig.has_path_mapping("react"));
    }

    #[test]
    fn paths_for_hash_is_key_sorted() {
        let a = config(r#"{ "compilerOptions": { "paths": { "b": ["b/v1"], "a": ["a/v2"] } } }"#);
        let b = config(r#"{ "compilerOptions": { "paths": { "a": ["a/v2"], "b": ["b/v1"] } } }"#);
        assert_eq!(a.paths_for_hash(), b.paths_for_hash());
        assert_eq!(
            a.paths_for_hash().as_deref(),
            Some(r#"{"a":["a/v2"],"b":["b/v1"]}"#)
        );
        assert_eq!(config("{}").paths_for_hash(), None);
    }
}
