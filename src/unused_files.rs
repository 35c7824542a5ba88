//! Every file in a package directory must be accounted for.
//!
//! An entry is fine when it is used (reachable from `tsconfig.json`), listed
//! in `OTHER_FILES.txt`, or one of the conventionally ignored names. Each
//! directory level owns the slice of the used and listed sets that falls
//! under it; nothing is shared between sibling directories.

use crate::error::{Result, TypingsError};
use crate::file_tree::FileTree;
use crate::paths::{has_windows_slashes, join_paths};
use crate::settings::Settings;
use std::collections::BTreeSet;
use tracing::trace;

/// Paths relative to the directory currently being audited.
#[derive(Debug, Clone, Default)]
struct Accounting {
    used: BTreeSet<String>,
    listed: BTreeSet<String>,
}

impl Accounting {
    /// Move every path under `dir/` into a new accounting for that directory.
    fn split_off_directory(&mut self, dir: &str) -> Accounting {
        let prefix = format!("{dir}/");
        Accounting {
            used: take_prefixed(&mut self.used, &prefix),
            listed: take_prefixed(&mut self.listed, &prefix),
        }
    }
}

fn take_prefixed(set: &mut BTreeSet<String>, prefix: &str) -> BTreeSet<String> {
    let matching: Vec<String> = set
        .iter()
        .filter(|path| path.starts_with(prefix))
        .cloned()
        .collect();
    matching
        .into_iter()
        .map(|path| {
            set.remove(&path);
            path[prefix.len()..].to_string()
        })
        .collect()
}

/// Audit the entries `ls` of the directory `tree` is rooted at.
pub fn check_all_files_used<'a>(
    ls: &[String],
    used_files: impl IntoIterator<Item = &'a str>,
    other_files: &[String],
    package_name: &str,
    tree: &dyn FileTree,
    settings: &Settings,
) -> Result<()> {
    let used: BTreeSet<String> = used_files.into_iter().map(str::to_string).collect();
    if let Some(path) = used.iter().find(|path| has_windows_slashes(path)) {
        return Err(TypingsError::WindowsSlash {
            package: package_name.to_string(),
            path: path.clone(),
        });
    }
    let accounting = Accounting {
        used,
        listed: other_files.iter().cloned().collect(),
    };
    audit_directory(ls.to_vec(), accounting, tree, settings)
}

fn audit_directory(
    ls: Vec<String>,
    mut accounting: Accounting,
    tree: &dyn FileTree,
    settings: &Settings,
) -> Result<()> {
    for entry in ls {
        if accounting.used.contains(&entry) || accounting.listed.remove(&entry) {
            continue;
        }

        if tree.is_directory(&entry) {
            if settings.is_ignored_directory(&entry) {
                continue;
            }
            let sub = tree.sub_dir(&entry)?;
            let sub_ls = sub.read_dir("")?;
            if sub_ls.is_empty() {
                return Err(TypingsError::EmptyDirectory {
                    path: sub.debug_path(),
                    used: accounting.used.into_iter().collect(),
                });
            }
            trace!(directory = %sub.debug_path(), entries = sub_ls.len(), "auditing");
            let nested = accounting.split_off_directory(&entry);
            audit_directory(sub_ls, nested, sub.as_ref(), settings)?;
        } else if !settings.is_ignored_file(&entry) {
            return Err(TypingsError::UnusedFile {
                path: join_paths(&tree.debug_path(), &entry),
                used: accounting.used.into_iter().collect(),
            });
        }
    }

    if let Some(leftover) = accounting.listed.into_iter().next() {
        let path = join_paths(&tree.debug_path(), &leftover);
        return Err(if accounting.used.contains(&leftover) {
            TypingsError::RedundantOtherFilesEntry { path }
        } else {
            TypingsError::MissingOtherFilesEntry { path }
        });
    }
    Ok(())
}
