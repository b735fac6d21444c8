//! Storage abstraction for amiibox.
//!
//! Virtual amiibo definitions live on removable storage that may be absent.
//! Every core access goes through [`with_storage`], which mounts the medium
//! for the duration of a closure and unmounts it afterwards.

mod memory;
mod real;

pub use memory::MemoryVfs;
pub use real::RealVfs;

use amiibox_types::error::Result;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A single entry returned by [`Vfs::readdir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
}

/// Metadata returned by [`Vfs::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VfsMetadata {
    pub kind: EntryKind,
    pub size: u64,
}

impl VfsMetadata {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// File system operations over `/`-separated absolute paths.
///
/// Enumeration order of [`Vfs::readdir`] is implementation-defined.
pub trait Vfs {
    fn readdir(&self, path: &str) -> Result<Vec<VfsEntry>>;
    fn read(&self, path: &str) -> Result<Vec<u8>>;
    fn write(&mut self, path: &str, data: &[u8]) -> Result<()>;
    fn stat(&self, path: &str) -> Result<VfsMetadata>;
    fn mkdir(&mut self, path: &str) -> Result<()>;
    fn remove(&mut self, path: &str) -> Result<()>;
    fn exists(&self, path: &str) -> bool;

    /// Acquire the storage medium. Fails when it is not present.
    fn mount(&self) -> Result<()> {
        Ok(())
    }

    /// Release the storage medium acquired by [`Vfs::mount`].
    fn unmount(&self) {}
}

/// Mounted storage; unmounts on drop.
pub struct StorageGuard<'a> {
    vfs: &'a dyn Vfs,
}

impl<'a> StorageGuard<'a> {
    /// Mount `vfs`, failing if the medium is absent.
    pub fn acquire(vfs: &'a dyn Vfs) -> Result<Self> {
        if let Err(e) = vfs.mount() {
            log::debug!("Storage unavailable: {e}");
            return Err(e);
        }
        Ok(Self { vfs })
    }

    pub fn vfs(&self) -> &'a dyn Vfs {
        self.vfs
    }
}

impl Drop for StorageGuard<'_> {
    fn drop(&mut self) {
        self.vfs.unmount();
    }
}

/// Run `f` with the storage medium mounted.
pub fn with_storage<T>(vfs: &dyn Vfs, f: impl FnOnce(&dyn Vfs) -> T) -> Result<T> {
    let guard = StorageGuard::acquire(vfs)?;
    Ok(f(guard.vfs()))
}

/// Join a directory path and a child name.
pub fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Last component of a path (`"/a/b"` -> `"b"`, `"/"` -> `"/"`).
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind('/') {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    }
}
