//! Filesystem-backed emulation service for desktop runs and tests.
//!
//! Descriptors are read from `<dir>/amiibo.json` through a [`Vfs`]. The
//! emulation state lives in memory: the service starts with emulation off
//! and nothing active, like a freshly booted console.

use serde::Deserialize;

use amiibox_types::error::{AmiiboxError, Result};
use amiibox_vfs::{Vfs, join, with_storage};

use crate::services::{
    ActiveVirtualAmiibo, AmiiboMetadata, ConnectionStatus, EmulationService, EmulationStatus,
    Version,
};

/// Descriptor file inside each virtual amiibo directory.
pub const DESCRIPTOR_FILE_NAME: &str = "amiibo.json";

const DESKTOP_VERSION: Version = Version {
    major: 1,
    minor: 1,
    micro: 0,
    dev_build: true,
};

#[derive(Debug, Deserialize)]
struct Descriptor {
    name: String,
}

/// In-process stand-in for the emulation service.
pub struct DesktopEmulation<V: Vfs> {
    vfs: V,
    root_dir: String,
    available: bool,
    initialized: bool,
    emulation: EmulationStatus,
    active: Option<ActiveVirtualAmiibo>,
    connection: ConnectionStatus,
    intercepted: bool,
}

impl<V: Vfs> DesktopEmulation<V> {
    /// Serve virtual amiibos stored under `root_dir` in `vfs`.
    pub fn new(vfs: V, root_dir: &str) -> Self {
        Self {
            vfs,
            root_dir: root_dir.to_string(),
            available: true,
            initialized: false,
            emulation: EmulationStatus::Off,
            active: None,
            connection: ConnectionStatus::Invalid,
            intercepted: false,
        }
    }

    /// Make the service reachable or unreachable. While unreachable every
    /// call fails, including ones on an already initialized session.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn set_intercepted(&mut self, intercepted: bool) {
        self.intercepted = intercepted;
    }

    /// Deactivate the current amiibo, as another client of the service would.
    pub fn clear_active_virtual_amiibo(&mut self) {
        self.active = None;
        self.connection = ConnectionStatus::Invalid;
    }

    pub fn vfs(&self) -> &V {
        &self.vfs
    }

    pub fn vfs_mut(&mut self) -> &mut V {
        &mut self.vfs
    }

    fn ensure_session(&self) -> Result<()> {
        if !self.available {
            return Err(AmiiboxError::ServiceUnavailable);
        }
        if !self.initialized {
            return Err(AmiiboxError::Service("session not initialized".to_string()));
        }
        Ok(())
    }

    fn parse(&self, path: &str) -> Result<AmiiboMetadata> {
        let descriptor_path = join(path, DESCRIPTOR_FILE_NAME);
        let raw = with_storage(&self.vfs, |vfs| {
            if !vfs.stat(path)?.is_dir() {
                return Err(AmiiboxError::Service(format!(
                    "not a virtual amiibo directory: {path}"
                )));
            }
            vfs.read(&descriptor_path)
        })??;
        let descriptor: Descriptor = serde_json::from_slice(&raw)?;
        if descriptor.name.trim().is_empty() {
            return Err(AmiiboxError::Service(format!(
                "descriptor has an empty name: {descriptor_path}"
            )));
        }
        Ok(AmiiboMetadata::new(descriptor.name, path))
    }
}

impl<V: Vfs> EmulationService for DesktopEmulation<V> {
    fn is_available(&self) -> bool {
        self.available
    }

    fn initialize(&mut self) -> Result<()> {
        if !self.available {
            return Err(AmiiboxError::ServiceUnavailable);
        }
        self.initialized = true;
        log::debug!("Desktop emulation service initialized at {}", self.root_dir);
        Ok(())
    }

    fn exit(&mut self) {
        self.initialized = false;
    }

    fn version(&self) -> Result<Version> {
        self.ensure_session()?;
        Ok(DESKTOP_VERSION)
    }

    fn emulation_status(&self) -> Result<EmulationStatus> {
        self.ensure_session()?;
        Ok(self.emulation)
    }

    fn set_emulation_status(&mut self, status: EmulationStatus) -> Result<()> {
        self.ensure_session()?;
        self.emulation = status;
        Ok(())
    }

    fn active_virtual_amiibo(&self) -> Result<Option<ActiveVirtualAmiibo>> {
        self.ensure_session()?;
        Ok(self.active.clone())
    }

    fn set_active_virtual_amiibo(&mut self, path: &str) -> Result<()> {
        self.ensure_session()?;
        let metadata = self.parse(path)?;
        self.active = Some(ActiveVirtualAmiibo {
            path: path.to_string(),
            metadata,
        });
        self.connection = ConnectionStatus::Connected;
        Ok(())
    }

    fn active_virtual_amiibo_status(&self) -> Result<ConnectionStatus> {
        self.ensure_session()?;
        Ok(self.connection)
    }

    fn set_active_virtual_amiibo_status(&mut self, status: ConnectionStatus) -> Result<()> {
        self.ensure_session()?;
        if self.active.is_none() {
            return Err(AmiiboxError::Service(
                "no active virtual amiibo".to_string(),
            ));
        }
        if status == ConnectionStatus::Invalid {
            return Err(AmiiboxError::Service(
                "cannot set an invalid connection status".to_string(),
            ));
        }
        self.connection = status;
        Ok(())
    }

    fn try_parse_virtual_amiibo(&self, path: &str) -> Result<AmiiboMetadata> {
        self.ensure_session()?;
        self.parse(path)
    }

    fn virtual_amiibo_root_directory(&self) -> Result<String> {
        self.ensure_session()?;
        Ok(self.root_dir.clone())
    }

    fn is_current_application_intercepted(&self) -> Result<bool> {
        self.ensure_session()?;
        Ok(self.intercepted)
    }
}
