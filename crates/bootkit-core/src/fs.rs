//! Filesystem boundary for the pipeline.
//!
//! Validators, planners and the gate see the project only through
//! [`ProjectFs`], with every path relative to the project root. [`DiskFs`]
//! backs the CLI; [`MemFs`] keeps gate and planner tests off the disk.

use crate::error::{BootkitError, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

pub trait ProjectFs {
    /// Read a UTF-8 file. `Ok(None)` when nothing exists at `rel`.
    fn read(&self, rel: &Path) -> Result<Option<String>>;

    fn exists(&self, rel: &Path) -> bool;

    fn create_dir_all(&self, rel: &Path) -> Result<()>;

    /// Create a file that must not exist yet. Fails with
    /// [`BootkitError::PathExists`] instead of overwriting.
    fn create_new(&self, rel: &Path, contents: &str) -> Result<()>;

    /// Replace the whole file.
    fn write(&self, rel: &Path, contents: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// DiskFs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DiskFs {
    root: PathBuf,
}

impl DiskFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ProjectFs for DiskFs {
    fn read(&self, rel: &Path) -> Result<Option<String>> {
        let path = self.root.join(rel);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn exists(&self, rel: &Path) -> bool {
        self.root.join(rel).exists()
    }

    fn create_dir_all(&self, rel: &Path) -> Result<()> {
        std::fs::create_dir_all(self.root.join(rel))?;
        Ok(())
    }

    fn create_new(&self, rel: &Path, contents: &str) -> Result<()> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(BootkitError::PathExists(rel.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(contents.as_bytes())?;
        Ok(())
    }

    fn write(&self, rel: &Path, contents: &str) -> Result<()> {
        crate::io::atomic_write(&self.root.join(rel), contents.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// MemFs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Dir,
    File(String),
}

/// In-memory project tree. Parents are created implicitly on every write.
#[derive(Debug, Default)]
pub struct MemFs {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, rel: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.insert_file(rel, contents);
        self
    }

    /// Put a file in place, overwriting whatever was there.
    pub fn insert_file(&self, rel: impl AsRef<Path>, contents: impl Into<String>) {
        let rel = rel.as_ref();
        self.insert_parents(rel);
        self.nodes
            .borrow_mut()
            .insert(rel.to_path_buf(), Node::File(contents.into()));
    }

    pub fn remove(&self, rel: impl AsRef<Path>) {
        let rel = rel.as_ref();
        self.nodes.borrow_mut().retain(|p, _| !p.starts_with(rel));
    }

    pub fn file(&self, rel: impl AsRef<Path>) -> Option<String> {
        match self.nodes.borrow().get(rel.as_ref()) {
            Some(Node::File(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn is_dir(&self, rel: impl AsRef<Path>) -> bool {
        matches!(self.nodes.borrow().get(rel.as_ref()), Some(Node::Dir))
    }

    fn insert_parents(&self, rel: &Path) {
        let mut nodes = self.nodes.borrow_mut();
        for ancestor in rel.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
        }
    }
}

impl ProjectFs for MemFs {
    fn read(&self, rel: &Path) -> Result<Option<String>> {
        match self.nodes.borrow().get(rel) {
            Some(Node::File(s)) => Ok(Some(s.clone())),
            Some(Node::Dir) => Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{} is a directory", rel.display()),
            )
            .into()),
            None => Ok(None),
        }
    }

    fn exists(&self, rel: &Path) -> bool {
        self.nodes.borrow().contains_key(rel)
    }

    fn create_dir_all(&self, rel: &Path) -> Result<()> {
        self.insert_parents(rel);
        self.nodes
            .borrow_mut()
            .entry(rel.to_path_buf())
            .or_insert(Node::Dir);
        Ok(())
    }

    fn create_new(&self, rel: &Path, contents: &str) -> Result<()> {
        if self.exists(rel) {
            return Err(BootkitError::PathExists(rel.to_path_buf()));
        }
        self.insert_file(rel, contents);
        Ok(())
    }

    fn write(&self, rel: &Path, contents: &str) -> Result<()> {
        self.insert_file(rel, contents);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
