//! Caller identity as seen by the booking core.
//!
//! The core never mutates an identity. It only compares identities (by user id)
//! and checks the admin flag.

use crate::error::{BookingError, Result};
use crate::types::UserId;
use serde::{Deserialize, Serialize};

/// An authenticated user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identity {
    /// Account id
    pub user_id: UserId,
    /// Display name
    pub username: String,
    /// Staff flag; grants the admin capability
    pub is_admin: bool,
    /// Superuser flag; reported by `current_user` only
    pub is_superuser: bool,
}

impl Identity {
    /// Create a non-admin identity.
    #[must_use]
    pub fn user(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            is_admin: false,
            is_superuser: false,
        }
    }

    /// Create an admin identity.
    #[must_use]
    pub fn admin(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::user(user_id, username)
        }
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.user_id == other.user_id
    }
}

impl Eq for Identity {}

/// Whoever is asking: an anonymous caller or an authenticated user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Viewer {
    /// No identity presented
    #[default]
    Anonymous,
    /// Authenticated caller
    User(Identity),
}

impl Viewer {
    /// The identity, if authenticated.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Anonymous => None,
            Self::User(identity) => Some(identity),
        }
    }

    /// The user id, if authenticated.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.identity().map(|identity| identity.user_id)
    }

    /// Whether the caller holds the admin capability.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.identity().is_some_and(|identity| identity.is_admin)
    }

    /// Require an authenticated caller.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Unauthenticated`] for anonymous callers.
    pub fn require_authenticated(&self) -> Result<&Identity> {
        self.identity().ok_or_else(|| {
            BookingError::Unauthenticated("Authentication credentials were not provided".into())
        })
    }

    /// Require an authenticated admin.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Unauthenticated`] for anonymous callers and
    /// [`BookingError::PermissionDenied`] for non-admin users.
    pub fn require_admin(&self) -> Result<&Identity> {
        let identity = self.require_authenticated()?;
        if identity.is_admin {
            Ok(identity)
        } else {
            Err(BookingError::PermissionDenied("Admin access required".into()))
        }
    }
}

impl From<Identity> for Viewer {
    fn from(identity: Identity) -> Self {
        Self::User(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities_compare_by_user_id() {
        let a = Identity::user(UserId::new(7), "alice");
        let renamed = Identity::admin(UserId::new(7), "alice-admin");
        assert_eq!(a, renamed);
        assert_ne!(a, Identity::user(UserId::new(8), "alice"));
    }

    #[test]
    fn require_admin_distinguishes_anonymous_from_non_admin() {
        assert!(matches!(
            Viewer::Anonymous.require_admin(),
            Err(BookingError::Unauthenticated(_))
        ));
        let user = Viewer::from(Identity::user(UserId::new(1), "bob"));
        assert!(matches!(
            user.require_admin(),
            Err(BookingError::PermissionDenied(_))
        ));
        let admin = Viewer::from(Identity::admin(UserId::new(2), "root"));
        assert!(admin.require_admin().is_ok());
    }
}
