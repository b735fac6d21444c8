//! Overlay configuration loaded from `amiibox.toml`.
//!
//! Every field has a default, so a missing file or a partial file both
//! produce a usable configuration:
//!
//! ```toml
//! service_name = "emuiibo"
//! show_root_entry = true
//! upscale = "reject"
//!
//! [focused_thumbnail]
//! max_width = 128
//! max_height = 128
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AmiiboxError, Result};

/// What the thumbnail pipeline does when an icon is smaller than its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpscalePolicy {
    /// Scale factors above 1.0 are an error.
    #[default]
    Reject,
    /// Keep the natural size; the reported scale is 1.0.
    Clamp,
    /// Enlarge with nearest-neighbour sampling.
    Allow,
}

/// Bounding box for one thumbnail slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailBox {
    pub max_width: u32,
    pub max_height: u32,
}

impl ThumbnailBox {
    pub const fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }
}

/// Top-level overlay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Name of the emulation service, shown in the title and status text.
    pub service_name: String,
    /// Whether the navigation root lists the synthetic storage-root entry.
    /// When disabled the overlay opens directly on the storage root.
    pub show_root_entry: bool,
    /// Icon file inside each virtual amiibo directory.
    pub icon_file_name: String,
    /// Re-activating the active amiibo toggles its connection status.
    pub reselect_toggles_connection: bool,
    /// Confirming the active-amiibo summary row toggles connection status.
    pub summary_row_toggles_connection: bool,
    pub upscale: UpscalePolicy,
    /// Upper bound in bytes for a single decode (raw frame plus output).
    pub decode_memory_limit: usize,
    /// Box for the active amiibo icon.
    pub active_thumbnail: ThumbnailBox,
    /// Box for the focused listing entry icon.
    pub focused_thumbnail: ThumbnailBox,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            service_name: "emuiibo".to_string(),
            show_root_entry: true,
            icon_file_name: "amiibo.png".to_string(),
            reselect_toggles_connection: true,
            summary_row_toggles_connection: true,
            upscale: UpscalePolicy::Reject,
            decode_memory_limit: 4 * 1024 * 1024,
            active_thumbnail: ThumbnailBox::new(64, 64),
            focused_thumbnail: ThumbnailBox::new(128, 128),
        }
    }
}

impl OverlayConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, b) in [
            ("active_thumbnail", self.active_thumbnail),
            ("focused_thumbnail", self.focused_thumbnail),
        ] {
            if b.max_width == 0 || b.max_height == 0 {
                return Err(AmiiboxError::Config(format!(
                    "{name}: box must be at least 1x1, got {}x{}",
                    b.max_width, b.max_height
                )));
            }
        }
        if self.icon_file_name.is_empty() || self.icon_file_name.contains('/') {
            return Err(AmiiboxError::Config(format!(
                "icon_file_name must be a plain file name, got {:?}",
                self.icon_file_name
            )));
        }
        Ok(())
    }
}
