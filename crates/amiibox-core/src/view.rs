//! Render model and overlay text.
//!
//! [`OverlayFrame`] is everything a host needs to draw one frame. It
//! borrows the thumbnails so pixel buffers are never copied per frame.

use amiibox_platform::{ConnectionStatus, EmulationStatus, Version};
use amiibox_types::config::OverlayConfig;

use crate::classify::ListingEntry;
use crate::navigation::{NavigationController, NavigationLocation};
use crate::session::SessionState;
use crate::thumbnail::Thumbnail;

/// Part of the overlay holding input focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusRegion {
    /// The emulation on/off row.
    EmulationToggle,
    /// The active amiibo summary row.
    ActiveSummary,
    /// The directory listing.
    Listing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Root,
    Category,
    Amiibo,
}

/// One listing row as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub label: String,
    pub kind: RowKind,
    pub focused: bool,
    /// The row is the active virtual amiibo.
    pub active: bool,
}

/// Everything shown for one frame.
#[derive(Debug)]
pub struct OverlayFrame<'a> {
    pub title: String,
    pub status: String,
    pub initialized: bool,
    pub emulation: EmulationStatus,
    pub connection: ConnectionStatus,
    pub active_name: String,
    pub active_label: &'static str,
    pub subtitle: String,
    pub location: Option<String>,
    pub rows: Vec<ListingRow>,
    pub region: FocusRegion,
    pub active_thumbnail: &'a Thumbnail,
    pub focused_thumbnail: &'a Thumbnail,
}

pub fn title_text(service_name: &str, version: Option<Version>) -> String {
    match version {
        Some(v) => format!("{service_name} {v}"),
        None => service_name.to_string(),
    }
}

pub fn emulation_text(status: EmulationStatus) -> String {
    format!("Emulation: {status}")
}

/// Line describing the active amiibo inside the status block.
pub fn active_amiibo_text(name: Option<&str>, connection: ConnectionStatus) -> String {
    match (name, connection) {
        (Some(name), ConnectionStatus::Connected) => {
            format!("Virtual amiibo: {name} (connected - select to disconnect)")
        },
        (Some(name), ConnectionStatus::Disconnected) => {
            format!("Virtual amiibo: {name} (disconnected - select to connect)")
        },
        _ => "No active virtual amiibo.".to_string(),
    }
}

pub fn interception_text(service_name: &str, intercepted: bool) -> String {
    if intercepted {
        format!("Current game is being intercepted by {service_name}.")
    } else {
        "Current game is not being intercepted.".to_string()
    }
}

/// Multi-line status block under the title.
pub fn status_text(
    service_name: &str,
    session: &SessionState,
    connection: ConnectionStatus,
) -> String {
    if !session.is_initialized() {
        return format!("{service_name} was not accessed.");
    }
    let emulation = session.emulation_status();
    match emulation {
        EmulationStatus::Off => emulation_text(emulation),
        EmulationStatus::On => {
            let name = session.active_selection().metadata().map(|m| m.name());
            format!(
                "{}\n{}\n{}",
                emulation_text(emulation),
                active_amiibo_text(name, connection),
                interception_text(service_name, session.is_current_application_intercepted())
            )
        },
    }
}

pub fn connection_label(connection: ConnectionStatus) -> &'static str {
    match connection {
        ConnectionStatus::Connected => "connected",
        ConnectionStatus::Disconnected => "disconnected",
        ConnectionStatus::Invalid => "",
    }
}

pub fn available_text(count: usize) -> String {
    format!("Available virtual amiibos ({count})")
}

/// Assemble the frame for the current state.
pub fn build_frame<'a>(
    config: &OverlayConfig,
    session: &SessionState,
    nav: &'a NavigationController,
    region: FocusRegion,
) -> OverlayFrame<'a> {
    let connection = session.connection_status();
    let active_path = session.active_selection().path();
    let rows = nav
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| ListingRow {
            label: entry.label().to_string(),
            kind: match entry {
                ListingEntry::SyntheticRoot { .. } => RowKind::Root,
                ListingEntry::Category { .. } => RowKind::Category,
                ListingEntry::AmiiboLeaf { .. } => RowKind::Amiibo,
            },
            focused: region == FocusRegion::Listing && i == nav.focus(),
            active: entry.is_leaf() && active_path == Some(entry.path()),
        })
        .collect();

    OverlayFrame {
        title: title_text(&config.service_name, session.version()),
        status: status_text(&config.service_name, session, connection),
        initialized: session.is_initialized(),
        emulation: session.emulation_status(),
        connection,
        active_name: session.active_selection().metadata().map_or_else(
            || "No active virtual amiibo".to_string(),
            |m| m.name().to_string(),
        ),
        active_label: connection_label(connection),
        subtitle: available_text(nav.leaf_count()),
        location: match nav.location() {
            NavigationLocation::Root => None,
            NavigationLocation::Directory(path) => Some(path.clone()),
        },
        rows,
        region,
        active_thumbnail: nav.active_thumbnail(),
        focused_thumbnail: nav.focused_thumbnail(),
    }
}
