//! Read-only directory abstraction the resolver works against.
//!
//! A [`FileTree`] is rooted at some directory (typically one package, e.g.
//! `types/abs`) and answers queries with `/`-separated paths relative to that
//! root. `..` segments are allowed and resolve against the enclosing tree, so
//! a toolchain directory such as `types/abs/ts3.1` can still read
//! `../index.d.ts`.
//!
//! Two implementations are provided:
//! - [`DiskTree`] reads from the local file system
//! - [`InMemoryTree`] serves a [`Dir`] fixture, used heavily by tests

use crate::error::{Result, TypingsError};
use crate::paths::join_paths;
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;

pub trait FileTree: Send + Sync {
    /// Names of the entries directly inside `dir` (`""` for the root).
    fn read_dir(&self, dir: &str) -> Result<Vec<String>>;

    fn is_directory(&self, path: &str) -> bool;

    fn exists(&self, path: &str) -> bool;

    fn read_file(&self, path: &str) -> Result<String>;

    fn read_json(&self, path: &str) -> Result<serde_json::Value> {
        let text = self.read_file(path)?;
        serde_json::from_str(&text).map_err(|source| TypingsError::InvalidJson {
            path: join_paths(&self.debug_path(), path),
            source,
        })
    }

    /// A tree rooted at the child directory `path`.
    fn sub_dir(&self, path: &str) -> Result<Box<dyn FileTree>>;

    /// Human-readable location of this tree's root, for diagnostics.
    fn debug_path(&self) -> String;
}

// =============================================================================
// In-memory fixture tree
// =============================================================================

#[derive(Debug, Clone)]
pub enum Entry {
    File(String),
    Dir(Dir),
}

/// A mutable directory fixture. Entry order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct Dir {
    entries: IndexMap<String, Entry>,
}

impl Dir {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file. `path` may contain `/`; intermediate
    /// directories are created as needed.
    pub fn set(&mut self, path: &str, content: impl Into<String>) -> &mut Self {
        match path.rsplit_once('/') {
            Some((dir, name)) => {
                self.subdir(dir).set(name, content);
            }
            None => {
                self.entries
                    .insert(path.to_string(), Entry::File(content.into()));
            }
        }
        self
    }

    /// Get or create the sub-directory at `path`.
    pub fn subdir(&mut self, path: &str) -> &mut Dir {
        let mut current = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let entry = current
                .entries
                .entry(segment.to_string())
                .or_insert_with(|| Entry::Dir(Dir::new()));
            if let Entry::File(_) = entry {
                *entry = Entry::Dir(Dir::new());
            }
            current = match entry {
                Entry::Dir(dir) => dir,
                Entry::File(_) => unreachable!("replaced above"),
            };
        }
        current
    }

    pub fn with_file(mut self, path: &str, content: impl Into<String>) -> Self {
        self.set(path, content);
        self
    }

    pub fn with_dir(mut self, name: &str, dir: Dir) -> Self {
        self.entries.insert(name.to_string(), Entry::Dir(dir));
        self
    }
}

enum Node<'a> {
    Dir(&'a Dir),
    File(&'a str),
}

/// A [`FileTree`] view into a shared [`Dir`] fixture.
#[derive(Debug, Clone)]
pub struct InMemoryTree {
    root: Arc<Dir>,
    base: Vec<String>,
    label: String,
}

impl InMemoryTree {
    pub fn new(root: Dir, label: impl Into<String>) -> Self {
        Self {
            root: Arc::new(root),
            base: Vec::new(),
            label: label.into(),
        }
    }

    /// Absolute segment list for `path`, or `None` if it escapes the fixture root.
    fn segments(&self, path: &str) -> Option<Vec<String>> {
        let mut segments = self.base.clone();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop()?;
                }
                _ => segments.push(segment.to_string()),
            }
        }
        Some(segments)
    }

    fn lookup(&self, path: &str) -> Option<Node<'_>> {
        let segments = self.segments(path)?;
        let mut node = Node::Dir(&self.root);
        for segment in &segments {
            node = match node {
                Node::Dir(dir) => match dir.entries.get(segment)? {
                    Entry::Dir(child) => Node::Dir(child),
                    Entry::File(text) => Node::File(text),
                },
                Node::File(_) => return None,
            };
        }
        Some(node)
    }

    fn display(&self, path: &str) -> String {
        join_paths(&self.debug_path(), path)
    }
}

impl FileTree for InMemoryTree {
    fn read_dir(&self, dir: &str) -> Result<Vec<String>> {
        match self.lookup(dir) {
            Some(Node::Dir(d)) => Ok(d.entries.keys().cloned().collect()),
            Some(Node::File(_)) => Err(TypingsError::NotADirectory {
                path: self.display(dir),
            }),
            None => Err(TypingsError::MissingFile {
                path: self.display(dir),
            }),
        }
    }

    fn is_directory(&self, path: &str) -> bool {
        matches!(self.lookup(path), Some(Node::Dir(_)))
    }

    fn exists(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    fn read_file(&self, path: &str) -> Result<String> {
        match self.lookup(path) {
            Some(Node::File(text)) => Ok(text.to_string()),
            Some(Node::Dir(_)) => Err(TypingsError::Io {
                path: self.display(path),
                message: "is a directory".to_string(),
            }),
            None => Err(TypingsError::MissingFile {
                path: self.display(path),
            }),
        }
    }

    fn sub_dir(&self, path: &str) -> Result<Box<dyn FileTree>> {
        if !self.is_directory(path) {
            return Err(TypingsError::NotADirectory {
                path: self.display(path),
            });
        }
        let base = self.segments(path).ok_or_else(|| TypingsError::NotADirectory {
            path: self.display(path),
        })?;
        Ok(Box::new(InMemoryTree {
            root: Arc::clone(&self.root),
            base,
            label: self.label.clone(),
        }))
    }

    fn debug_path(&self) -> String {
        let mut out = self.label.clone();
        for segment in &self.base {
            out = join_paths(&out, segment);
        }
        out
    }
}

// =============================================================================
// On-disk tree
// =============================================================================

#[derive(Debug, Clone)]
pub struct DiskTree {
    root: PathBuf,
}

impl DiskTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let mut full = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            full.push(segment);
        }
        full
    }
}

impl FileTree for DiskTree {
    fn read_dir(&self, dir: &str) -> Result<Vec<String>> {
        let full = self.resolve(dir);
        let entries = std::fs::read_dir(&full)
            .map_err(|e| TypingsError::io(full.display().to_string(), &e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TypingsError::io(full.display().to_string(), &e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        // read_dir order is platform-dependent.
        names.sort();
        Ok(names)
    }

    fn is_directory(&self, path: &str) -> bool {
        self.resolve(path).is_dir()
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn read_file(&self, path: &str) -> Result<String> {
        let full = self.resolve(path);
        std::fs::read_to_string(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TypingsError::MissingFile {
                path: full.display().to_string(),
            },
            _ => TypingsError::io(full.display().to_string(), &e),
        })
    }

    fn sub_dir(&self, path: &str) -> Result<Box<dyn FileTree>> {
        let full = self.resolve(path);
        if !full.is_dir() {
            return Err(TypingsError::NotADirectory {
                path: full.display().to_string(),
            });
        }
        Ok(Box::new(DiskTree::new(full)))
    }

    fn debug_path(&self) -> String {
        self.root.display().to_string()
    }
}
