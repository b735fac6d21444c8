//! Error types for amiibox.

use std::io;

/// Errors produced by the amiibox crates.
#[derive(Debug, thiserror::Error)]
pub enum AmiiboxError {
    #[error("emulation service error: {0}")]
    Service(String),

    #[error("emulation service is not available")]
    ServiceUnavailable,

    #[error("VFS error: {0}")]
    Vfs(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AmiiboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_display() {
        let e = AmiiboxError::Service("set status failed".into());
        assert_eq!(format!("{e}"), "emulation service error: set status failed");
    }

    #[test]
    fn service_unavailable_display() {
        let e = AmiiboxError::ServiceUnavailable;
        assert_eq!(format!("{e}"), "emulation service is not available");
    }

    #[test]
    fn vfs_error_display() {
        let e = AmiiboxError::Vfs("no such directory: /x".into());
        assert_eq!(format!("{e}"), "VFS error: no such directory: /x");
    }

    #[test]
    fn config_error_display() {
        let e = AmiiboxError::Config("bad box".into());
        assert_eq!(format!("{e}"), "config error: bad box");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: AmiiboxError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("this is [[[not valid toml").unwrap_err();
        let e: AmiiboxError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let e: AmiiboxError = json_err.into();
        assert!(format!("{e}").contains("JSON error"));
    }
}
