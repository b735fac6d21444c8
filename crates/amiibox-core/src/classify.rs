//! Classification of storage directories into amiibo leaves and categories.

use amiibox_platform::AmiiboMetadata;
use amiibox_vfs::{EntryKind, Vfs, file_name, join, with_storage};

use crate::session::SessionState;

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEntry {
    /// Entry point to the service's virtual amiibo root directory.
    SyntheticRoot { path: String },
    /// A directory that is not itself a virtual amiibo.
    Category { path: String, display_name: String },
    /// A directory holding a parseable virtual amiibo.
    AmiiboLeaf { path: String, metadata: AmiiboMetadata },
}

impl ListingEntry {
    pub fn path(&self) -> &str {
        match self {
            Self::SyntheticRoot { path }
            | Self::Category { path, .. }
            | Self::AmiiboLeaf { path, .. } => path,
        }
    }

    /// Text shown for the entry.
    pub fn label(&self) -> &str {
        match self {
            Self::SyntheticRoot { path } => path,
            Self::Category { display_name, .. } => display_name,
            Self::AmiiboLeaf { metadata, .. } => metadata.name(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::AmiiboLeaf { .. })
    }
}

/// Turns storage paths into [`ListingEntry`] values.
pub struct DirectoryClassifier<'a> {
    vfs: &'a dyn Vfs,
    session: &'a SessionState,
}

impl<'a> DirectoryClassifier<'a> {
    pub fn new(vfs: &'a dyn Vfs, session: &'a SessionState) -> Self {
        Self { vfs, session }
    }

    /// Leaf if the service parses `path`, category if it is a directory,
    /// `None` otherwise.
    pub fn classify(&self, path: &str) -> Option<ListingEntry> {
        if let Some(metadata) = self.session.try_parse_virtual_amiibo(path) {
            return Some(ListingEntry::AmiiboLeaf {
                path: path.to_string(),
                metadata,
            });
        }
        match with_storage(self.vfs, |vfs| vfs.stat(path)) {
            Ok(Ok(meta)) if meta.is_dir() => Some(ListingEntry::Category {
                path: path.to_string(),
                display_name: file_name(path).to_string(),
            }),
            _ => None,
        }
    }

    /// Classified subdirectories of `path`. Empty when storage is absent
    /// or the directory cannot be read.
    pub fn list_children(&self, path: &str) -> Vec<ListingEntry> {
        let entries = match with_storage(self.vfs, |vfs| vfs.readdir(path)) {
            Ok(Ok(entries)) => entries,
            Ok(Err(e)) | Err(e) => {
                log::debug!("Cannot list {path}: {e}");
                return Vec::new();
            },
        };
        let listing: Vec<ListingEntry> = entries
            .into_iter()
            .filter(|entry| entry.kind == EntryKind::Directory)
            .filter_map(|entry| self.classify(&join(path, &entry.name)))
            .collect();
        log::debug!("Listed {path}: {} entries", listing.len());
        listing
    }
}
