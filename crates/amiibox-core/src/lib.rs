//! amiibox overlay core.
//!
//! Session state machine over the emulation service, classification of
//! storage directories into amiibo leaves and categories, the bounded PNG
//! thumbnail pipeline, and the navigation controller that ties them to
//! button input. Rendering is left to the host: it reads an
//! [`overlay::OverlayFrame`] once per frame.

// Re-exports from the foundation crates.
pub use amiibox_platform as platform;
pub use amiibox_types::config;
pub use amiibox_types::error;
pub use amiibox_types::input;
pub use amiibox_vfs as vfs;

pub mod classify;
pub mod navigation;
pub mod overlay;
pub mod session;
pub mod thumbnail;
pub mod view;

#[cfg(test)]
pub(crate) mod test_utils;
