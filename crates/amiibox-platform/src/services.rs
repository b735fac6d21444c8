//! Emulation service trait and the data it exchanges.

use amiibox_types::error::Result;

/// Whether amiibo emulation is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmulationStatus {
    On,
    Off,
}

impl EmulationStatus {
    pub fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }
}

impl std::fmt::Display for EmulationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => write!(f, "on"),
            Self::Off => write!(f, "off"),
        }
    }
}

/// Connection state of the active virtual amiibo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// No active virtual amiibo.
    Invalid,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    /// The opposite connected state. `Invalid` has none.
    pub fn toggled(self) -> Option<Self> {
        match self {
            Self::Invalid => None,
            Self::Connected => Some(Self::Disconnected),
            Self::Disconnected => Some(Self::Connected),
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid => write!(f, "invalid"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Service version as reported at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub micro: u8,
    pub dev_build: bool,
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "v{}.{}.{} ({})",
            self.major,
            self.minor,
            self.micro,
            if self.dev_build { "dev" } else { "release" },
        )
    }
}

/// Parsed descriptor of a virtual amiibo directory. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmiiboMetadata {
    name: String,
    source_path: String,
}

impl AmiiboMetadata {
    pub fn new(name: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_path: source_path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory the descriptor was parsed from.
    pub fn source_path(&self) -> &str {
        &self.source_path
    }
}

/// The service's view of the active virtual amiibo. The path may be empty
/// when the service has nothing active but still answers with a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveVirtualAmiibo {
    pub path: String,
    pub metadata: AmiiboMetadata,
}

/// Abstraction over the amiibo emulation service.
///
/// Every call is synchronous and may fail. Callers treat a failure as
/// "leave cached state unchanged".
pub trait EmulationService {
    /// Whether the service is present at all (checked before `initialize`).
    fn is_available(&self) -> bool;

    /// Open a session with the service.
    fn initialize(&mut self) -> Result<()>;

    /// Close the session opened by `initialize`.
    fn exit(&mut self);

    fn version(&self) -> Result<Version>;

    fn emulation_status(&self) -> Result<EmulationStatus>;
    fn set_emulation_status(&mut self, status: EmulationStatus) -> Result<()>;

    /// `Ok(None)` when nothing is active.
    fn active_virtual_amiibo(&self) -> Result<Option<ActiveVirtualAmiibo>>;
    fn set_active_virtual_amiibo(&mut self, path: &str) -> Result<()>;

    fn active_virtual_amiibo_status(&self) -> Result<ConnectionStatus>;
    fn set_active_virtual_amiibo_status(&mut self, status: ConnectionStatus) -> Result<()>;

    /// Parse the amiibo descriptor stored in directory `path`.
    fn try_parse_virtual_amiibo(&self, path: &str) -> Result<AmiiboMetadata>;

    /// Directory the service keeps virtual amiibos under.
    fn virtual_amiibo_root_directory(&self) -> Result<String>;

    /// Whether the running application is intercepted for emulation.
    fn is_current_application_intercepted(&self) -> Result<bool>;
}
