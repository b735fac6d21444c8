//! In-memory VFS implementation.
//!
//! Used by tests and the demo front end. The tree lives in a `BTreeMap`
//! keyed by normalized absolute paths, so `readdir` yields names in
//! lexicographic order. A `mounted` switch simulates pulled storage.

use std::borrow::Cow;
use std::collections::BTreeMap;

use amiibox_types::error::{AmiiboxError, Result};

use crate::{EntryKind, Vfs, VfsEntry, VfsMetadata};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

/// A fully in-memory virtual file system.
#[derive(Debug, Clone)]
pub struct MemoryVfs {
    nodes: BTreeMap<String, Node>,
    mounted: bool,
}

impl MemoryVfs {
    /// Create a VFS with only the root directory, storage present.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir);
        Self {
            nodes,
            mounted: true,
        }
    }

    /// Simulate inserting or removing the storage medium.
    pub fn set_mounted(&mut self, mounted: bool) {
        self.mounted = mounted;
    }

    /// Create `path` and all missing parents, then write `data` to it.
    pub fn write_all(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let path = normalize(path);
        let par = parent(&path).to_string();
        self.mkdir(&par)?;
        self.write(&path, data)
    }
}

impl Default for MemoryVfs {
    fn default() -> Self {
        Self::new()
    }
}

/// Already in normal form: leading `/`, no `//`, no trailing `/` unless root.
fn is_normalized(path: &str) -> bool {
    if !path.starts_with('/') {
        return false;
    }
    if path.len() > 1 && path.ends_with('/') {
        return false;
    }
    !path.contains("//")
}

/// Normalize a path. Zero-alloc when already in normal form.
fn normalize(path: &str) -> Cow<'_, str> {
    if is_normalized(path) {
        return Cow::Borrowed(path);
    }
    let mut result = String::with_capacity(path.len() + 1);
    result.push('/');
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if result.len() > 1 {
            result.push('/');
        }
        result.push_str(segment);
    }
    Cow::Owned(result)
}

fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

impl Vfs for MemoryVfs {
    fn readdir(&self, path: &str) -> Result<Vec<VfsEntry>> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::Dir) => {},
            Some(Node::File(_)) => {
                return Err(AmiiboxError::Vfs(format!("not a directory: {path}")));
            },
            None => {
                return Err(AmiiboxError::Vfs(format!("no such directory: {path}")));
            },
        }

        let prefix = if path.as_ref() == "/" {
            "/".to_string()
        } else {
            format!("{path}/")
        };

        let mut entries = Vec::new();
        for (key, node) in self.nodes.range(prefix.clone()..) {
            if !key.starts_with(&prefix) {
                break;
            }
            // Direct children only.
            let rest = &key[prefix.len()..];
            if rest.is_empty() || rest.contains('/') {
                continue;
            }
            let (kind, size) = match node {
                Node::Dir => (EntryKind::Directory, 0),
                Node::File(data) => (EntryKind::File, data.len() as u64),
            };
            entries.push(VfsEntry {
                name: rest.to_string(),
                kind,
                size,
            });
        }
        Ok(entries)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::File(data)) => Ok(data.clone()),
            Some(Node::Dir) => Err(AmiiboxError::Vfs(format!("is a directory: {path}"))),
            None => Err(AmiiboxError::Vfs(format!("no such file: {path}"))),
        }
    }

    fn write(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let path = normalize(path);
        let par = parent(&path);
        if !matches!(self.nodes.get(par), Some(Node::Dir)) {
            return Err(AmiiboxError::Vfs(format!(
                "parent directory does not exist: {par}"
            )));
        }
        if matches!(self.nodes.get(path.as_ref()), Some(Node::Dir)) {
            return Err(AmiiboxError::Vfs(format!("is a directory: {path}")));
        }
        self.nodes
            .insert(path.into_owned(), Node::File(data.to_vec()));
        Ok(())
    }

    fn stat(&self, path: &str) -> Result<VfsMetadata> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::File(data)) => Ok(VfsMetadata {
                kind: EntryKind::File,
                size: data.len() as u64,
            }),
            Some(Node::Dir) => Ok(VfsMetadata {
                kind: EntryKind::Directory,
                size: 0,
            }),
            None => Err(AmiiboxError::Vfs(format!("no such path: {path}"))),
        }
    }

    fn mkdir(&mut self, path: &str) -> Result<()> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::Dir) => return Ok(()),
            Some(Node::File(_)) => {
                return Err(AmiiboxError::Vfs(format!("file exists: {path}")));
            },
            None => {},
        }
        let par = parent(&path).to_string();
        if par != path.as_ref() {
            self.mkdir(&par)?;
        }
        self.nodes.insert(path.into_owned(), Node::Dir);
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<()> {
        let path = normalize(path);
        if path.as_ref() == "/" {
            return Err(AmiiboxError::Vfs("cannot remove root".to_string()));
        }
        match self.nodes.get(path.as_ref()) {
            Some(Node::Dir) => {
                let prefix = format!("{path}/");
                let has_children = self
                    .nodes
                    .range(prefix.clone()..)
                    .next()
                    .is_some_and(|(k, _)| k.starts_with(&prefix));
                if has_children {
                    return Err(AmiiboxError::Vfs(format!("directory not empty: {path}")));
                }
            },
            Some(Node::File(_)) => {},
            None => {
                return Err(AmiiboxError::Vfs(format!("no such path: {path}")));
            },
        }
        self.nodes.remove(path.as_ref());
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.nodes.contains_key(normalize(path).as_ref())
    }

    fn mount(&self) -> Result<()> {
        if self.mounted {
            Ok(())
        } else {
            Err(AmiiboxError::Vfs("storage not mounted".to_string()))
        }
    }
}
