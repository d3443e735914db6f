//! Error taxonomy for booking, projection, provisioning and account operations.

use crate::types::SlotId;
use thiserror::Error;

/// Result type alias for Slotbook operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Every failure a caller of the booking core can observe.
///
/// Each variant has a stable [`code`](BookingError::code) so transports can
/// surface the kind without parsing messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    // ═══════════════════════════════════════════════════════════
    // Client Errors
    // ═══════════════════════════════════════════════════════════

    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// Referenced slot or user does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of resource that was looked up
        resource: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Lost a booking race: the slot already has a holder.
    #[error("Slot {0} is already booked")]
    AlreadyBooked(SlotId),

    /// Caller lacks the admin (or holder) capability.
    #[error("{0}")]
    PermissionDenied(String),

    /// No valid identity was presented.
    #[error("{0}")]
    Unauthenticated(String),

    // ═══════════════════════════════════════════════════════════
    // Store Errors
    // ═══════════════════════════════════════════════════════════

    /// Transient store failure (lock timeout, deadlock, lost connection).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Non-transient store failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BookingError {
    /// Shorthand for a missing slot.
    #[must_use]
    pub fn slot_not_found(id: SlotId) -> Self {
        Self::NotFound {
            resource: "Slot",
            id: id.to_string(),
        }
    }

    /// Shorthand for a missing user.
    #[must_use]
    pub fn user_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            resource: "User",
            id: id.to_string(),
        }
    }

    /// Stable, transport-independent error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyBooked(_) => "ALREADY_BOOKED",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Storage(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns `true` if a blind retry of the same request is safe.
    ///
    /// Only transient store failures qualify. An [`AlreadyBooked`](Self::AlreadyBooked)
    /// caller must re-read availability instead of retrying the same slot.
    ///
    /// # Examples
    ///
    /// ```
    /// # use slotbook_core::BookingError;
    /// assert!(BookingError::Unavailable("lock timeout".into()).is_retryable());
    /// assert!(!BookingError::Validation("bad date".into()).is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Returns `true` if the caller is at fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound { .. }
                | Self::AlreadyBooked(_)
                | Self::PermissionDenied(_)
                | Self::Unauthenticated(_)
        )
    }
}
