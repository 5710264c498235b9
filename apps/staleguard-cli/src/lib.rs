//! staleguard CLI library
//!
//! Exposes the configuration, export and command modules so integration
//! tests can drive them without spawning the binary.

pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
