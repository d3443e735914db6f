//! Slot booking server: configuration and process-wide setup.
//!
//! The binary in `main.rs` wires these together with the `PostgreSQL` stores
//! and the HTTP router.

pub mod config;
pub mod metrics;

pub use config::{BootstrapAdmin, Config, ConfigError};
