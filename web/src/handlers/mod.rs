//! HTTP handlers.

pub mod accounts;
pub mod admin;
pub mod health;
pub mod slots;

pub use health::health_check;

use serde::{Deserialize, Serialize};

/// `{"message": ...}` confirmation body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Human-readable confirmation
    pub message: String,
}

impl Message {
    /// Create a confirmation body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
