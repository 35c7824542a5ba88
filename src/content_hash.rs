//! Change-detection digest of a package version.

use crate::error::Result;
use crate::file_tree::FileTree;
use crate::references::read_file_and_throw_on_bom;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// SHA-256 (lowercase hex) over every counted file and the canonical
/// `paths` JSON of each build manifest.
///
/// Files are hashed as `path**text`, joined with `||`, in sorted path order,
/// so the digest does not depend on discovery order. A file starting with a
/// byte-order mark is an error.
pub fn content_hash<'a>(
    files: impl IntoIterator<Item = &'a str>,
    tsconfig_paths: &[String],
    tree: &dyn FileTree,
) -> Result<String> {
    let files: BTreeSet<&str> = files.into_iter().collect();
    let mut hasher = Sha256::new();
    for (i, path) in files.into_iter().enumerate() {
        if i > 0 {
            hasher.update(b"||");
        }
        let text = read_file_and_throw_on_bom(tree, path)?;
        hasher.update(path.as_bytes());
        hasher.update(b"**");
        hasher.update(text.as_bytes());
    }
    for paths in tsconfig_paths {
        hasher.update(paths.as_bytes());
    }
    Ok(hex::encode(hasher.finalize()))
}
