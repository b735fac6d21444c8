//! Navigation over the virtual amiibo tree.
//!
//! The controller holds the current location, its listing, the focused
//! row and a history stack for back navigation. Activating a row either
//! descends into it or forwards a selection change to the session. Both
//! thumbnail slots are refreshed here.

use amiibox_platform::ConnectionStatus;
use amiibox_types::config::OverlayConfig;
use amiibox_vfs::{Vfs, join};

use crate::classify::{DirectoryClassifier, ListingEntry};
use crate::session::SessionState;
use crate::thumbnail::{DecodeOptions, ImageDecoder, Thumbnail};

/// Where the listing comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationLocation {
    /// Top level, above the storage root.
    Root,
    Directory(String),
}

/// A location left by descending, with the focus it had.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub location: NavigationLocation,
    pub focus: usize,
}

/// Result of [`NavigationController::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Descended into a category or the storage root.
    Entered,
    /// A different amiibo was requested; `changed` tells whether the
    /// service accepted it.
    Selected { changed: bool },
    /// The active amiibo was activated again.
    ConnectionToggled(ConnectionStatus),
    /// The active amiibo was activated again with toggling disabled.
    Unchanged,
    /// No row at that index.
    Nothing,
}

pub struct NavigationController {
    location: NavigationLocation,
    entries: Vec<ListingEntry>,
    focus: usize,
    history: Vec<HistoryEntry>,
    show_root_entry: bool,
    reselect_toggles_connection: bool,
    icon_file_name: String,
    active_thumbnail: ImageDecoder,
    focused_thumbnail: ImageDecoder,
}

impl NavigationController {
    pub fn new(config: &OverlayConfig) -> Self {
        let options = DecodeOptions::from_config(config);
        Self {
            location: NavigationLocation::Root,
            entries: Vec::new(),
            focus: 0,
            history: Vec::new(),
            show_root_entry: config.show_root_entry,
            reselect_toggles_connection: config.reselect_toggles_connection,
            icon_file_name: config.icon_file_name.clone(),
            active_thumbnail: ImageDecoder::new(config.active_thumbnail, options),
            focused_thumbnail: ImageDecoder::new(config.focused_thumbnail, options),
        }
    }

    pub fn location(&self) -> &NavigationLocation {
        &self.location
    }

    pub fn entries(&self) -> &[ListingEntry] {
        &self.entries
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused_entry(&self) -> Option<&ListingEntry> {
        self.entries.get(self.focus)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Number of virtual amiibos in the current listing.
    pub fn leaf_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_leaf()).count()
    }

    pub fn active_thumbnail(&self) -> &Thumbnail {
        self.active_thumbnail.thumbnail()
    }

    pub fn focused_thumbnail(&self) -> &Thumbnail {
        self.focused_thumbnail.thumbnail()
    }

    /// Show `location` with a freshly built listing and focus on the first
    /// row.
    pub fn enter(&mut self, location: NavigationLocation, vfs: &dyn Vfs, session: &SessionState) {
        self.enter_at(location, 0, vfs, session);
    }

    /// List `location` with `focus` (clamped) preselected. The focused icon
    /// is loaded once, for the final focus.
    fn enter_at(
        &mut self,
        location: NavigationLocation,
        focus: usize,
        vfs: &dyn Vfs,
        session: &SessionState,
    ) {
        let location = match (location, session.root_directory()) {
            (NavigationLocation::Root, Some(root)) if !self.show_root_entry => {
                NavigationLocation::Directory(root.to_string())
            },
            (location, _) => location,
        };
        self.entries = match &location {
            NavigationLocation::Root => match session.root_directory() {
                Some(root) if self.show_root_entry => vec![ListingEntry::SyntheticRoot {
                    path: root.to_string(),
                }],
                _ => Vec::new(),
            },
            NavigationLocation::Directory(path) => {
                DirectoryClassifier::new(vfs, session).list_children(path)
            },
        };
        log::debug!("Entered {location:?} ({} entries)", self.entries.len());
        self.location = location;
        self.focus = focus.min(self.entries.len().saturating_sub(1));
        self.on_focus_changed(vfs);
    }

    /// Act on the row at `index`.
    pub fn activate(
        &mut self,
        index: usize,
        vfs: &dyn Vfs,
        session: &mut SessionState,
    ) -> Activation {
        let Some(entry) = self.entries.get(index).cloned() else {
            return Activation::Nothing;
        };
        match entry {
            ListingEntry::SyntheticRoot { path } | ListingEntry::Category { path, .. } => {
                self.history.push(HistoryEntry {
                    location: self.location.clone(),
                    focus: index,
                });
                self.enter(NavigationLocation::Directory(path), vfs, session);
                Activation::Entered
            },
            ListingEntry::AmiiboLeaf { path, .. } => {
                let outcome = if session.active_selection().path() == Some(path.as_str()) {
                    if self.reselect_toggles_connection {
                        Activation::ConnectionToggled(session.toggle_connection_status())
                    } else {
                        Activation::Unchanged
                    }
                } else {
                    Activation::Selected {
                        changed: session.set_active_selection(&path),
                    }
                };
                self.refresh_active_thumbnail(vfs, session);
                outcome
            },
        }
    }

    pub fn activate_focused(&mut self, vfs: &dyn Vfs, session: &mut SessionState) -> Activation {
        self.activate(self.focus, vfs, session)
    }

    /// Return to the location left by the last descent. `false` at the
    /// top.
    pub fn back(&mut self, vfs: &dyn Vfs, session: &SessionState) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };
        self.enter_at(previous.location, previous.focus, vfs, session);
        true
    }

    /// Move focus to `index`, clamped to the listing. Returns whether it
    /// moved.
    pub fn set_focus(&mut self, index: usize, vfs: &dyn Vfs) -> bool {
        let index = index.min(self.entries.len().saturating_sub(1));
        if index == self.focus {
            return false;
        }
        self.focus = index;
        self.on_focus_changed(vfs);
        true
    }

    pub fn focus_next(&mut self, vfs: &dyn Vfs) -> bool {
        self.set_focus(self.focus + 1, vfs)
    }

    pub fn focus_prev(&mut self, vfs: &dyn Vfs) -> bool {
        match self.focus.checked_sub(1) {
            Some(index) => self.set_focus(index, vfs),
            None => false,
        }
    }

    /// Point the focused slot at the focused leaf's icon, or clear it.
    pub fn on_focus_changed(&mut self, vfs: &dyn Vfs) {
        let icon = match self.entries.get(self.focus) {
            Some(ListingEntry::AmiiboLeaf { path, .. }) => Some(join(path, &self.icon_file_name)),
            _ => None,
        };
        self.focused_thumbnail.request(vfs, icon.as_deref());
    }

    /// Point the active slot at the active amiibo's icon, or clear it.
    pub fn refresh_active_thumbnail(&mut self, vfs: &dyn Vfs, session: &SessionState) {
        let icon = session
            .active_selection()
            .path()
            .map(|path| join(path, &self.icon_file_name));
        self.active_thumbnail.request(vfs, icon.as_deref());
    }
}
