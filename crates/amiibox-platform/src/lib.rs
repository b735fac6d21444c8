//! Emulation service abstraction.
//!
//! The amiibo emulation service owns the real emulation state: on/off, the
//! active virtual amiibo and its connection status. The overlay core only
//! calls it through [`EmulationService`] and reflects what it reports.

mod desktop;
mod services;

pub use desktop::{DESCRIPTOR_FILE_NAME, DesktopEmulation};
pub use services::*;
