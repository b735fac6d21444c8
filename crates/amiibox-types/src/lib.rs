//! Foundation types for amiibox.
//!
//! Shared by every amiibox crate: the error type, platform-agnostic input
//! events, and the overlay configuration.

pub mod config;
pub mod error;
pub mod input;
