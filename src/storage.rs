use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::NamedTempFile;

use crate::error::{GridError, Result};

/// Byte-level persistence used by a document
pub trait Storage {
    fn load(&self, path: &Path) -> Result<Vec<u8>>;
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;
    fn delete(&self, path: &Path) -> Result<()>;
}

/// Local file system. Writes go to a sibling temp file which is then renamed
/// over the target, so a failed write leaves the old file intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStorage;

impl Storage for FileStorage {
    fn load(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| GridError::io(path, e))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| GridError::io(path, e))?;
        tmp.write_all(bytes).map_err(|e| GridError::io(path, e))?;
        tmp.flush().map_err(|e| GridError::io(path, e))?;
        tmp.persist(path).map_err(|e| GridError::io(path, e.error))?;
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| GridError::io(path, e))
    }
}

/// In-memory storage. Clones share the same files.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Rc<RefCell<HashMap<PathBuf, Vec<u8>>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        let storage = Self::new();
        storage.insert(path, bytes);
        storage
    }

    pub fn insert(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.borrow_mut().insert(path.into(), bytes.into());
    }

    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.borrow().get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }

    /// Make every subsequent write and delete fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        if self.fail_writes.get() {
            return Err(GridError::io(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "writes disabled"),
            ));
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn load(&self, path: &Path) -> Result<Vec<u8>> {
        self.get(path)
            .ok_or_else(|| GridError::io(path, io::Error::from(io::ErrorKind::NotFound)))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.check_writable(path)?;
        self.insert(path, bytes);
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<()> {
        self.check_writable(path)?;
        match self.files.borrow_mut().remove(path) {
            Some(_) => Ok(()),
            None => Err(GridError::io(path, io::Error::from(io::ErrorKind::NotFound))),
        }
    }
}
