//! Host-directory VFS implementation.
//!
//! Maps VFS paths onto a directory of the host file system, standing in for
//! the removable storage root. Mounting fails while that directory is
//! missing.

use std::fs;
use std::path::{Component, Path, PathBuf};

use amiibox_types::error::{AmiiboxError, Result};

use crate::{EntryKind, Vfs, VfsEntry, VfsMetadata};

/// A VFS rooted at a host directory.
#[derive(Debug, Clone)]
pub struct RealVfs {
    root: PathBuf,
}

impl RealVfs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a VFS path to a host path, rejecting `..` escapes.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let mut host = self.root.clone();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => host.push(part),
                Component::CurDir | Component::RootDir => {},
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(AmiiboxError::Vfs(format!(
                        "path escapes storage root: {path}"
                    )));
                },
            }
        }
        Ok(host)
    }
}

fn kind_of(file_type: fs::FileType) -> EntryKind {
    if file_type.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

impl Vfs for RealVfs {
    fn readdir(&self, path: &str) -> Result<Vec<VfsEntry>> {
        let host = self.resolve(path)?;
        let mut entries = Vec::new();
        for entry in fs::read_dir(&host)? {
            let entry = entry?;
            // Follow symlinks; a dangling link is listed as itself.
            let meta = match fs::metadata(entry.path()) {
                Ok(meta) => meta,
                Err(_) => entry.metadata()?,
            };
            entries.push(VfsEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind: kind_of(meta.file_type()),
                size: if meta.is_dir() { 0 } else { meta.len() },
            });
        }
        Ok(entries)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.resolve(path)?)?)
    }

    fn write(&mut self, path: &str, data: &[u8]) -> Result<()> {
        Ok(fs::write(self.resolve(path)?, data)?)
    }

    fn stat(&self, path: &str) -> Result<VfsMetadata> {
        let meta = fs::metadata(self.resolve(path)?)?;
        Ok(VfsMetadata {
            kind: kind_of(meta.file_type()),
            size: if meta.is_dir() { 0 } else { meta.len() },
        })
    }

    fn mkdir(&mut self, path: &str) -> Result<()> {
        Ok(fs::create_dir_all(self.resolve(path)?)?)
    }

    fn remove(&mut self, path: &str) -> Result<()> {
        let host = self.resolve(path)?;
        if host == self.root {
            return Err(AmiiboxError::Vfs("cannot remove root".to_string()));
        }
        if host.is_dir() {
            fs::remove_dir(host)?;
        } else {
            fs::remove_file(host)?;
        }
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_ok_and(|p| p.exists())
    }

    fn mount(&self) -> Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(AmiiboxError::Vfs(format!(
                "storage not present at {}",
                self.root.display()
            )))
        }
    }
}
