//! Minimal account layer: registration, token login and identity lookup.
//!
//! Passwords are stored as Argon2 PHC strings. Each user has at most one
//! opaque bearer token, created on first login and reused afterwards.

use crate::error::{BookingError, Result};
use crate::identity::{Identity, Viewer};
use crate::types::UserId;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

const TOKEN_BYTES: usize = 32;
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// A user row to insert.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Unique login name
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// Admin capability
    pub is_staff: bool,
    /// Superuser flag
    pub is_superuser: bool,
}

/// A stored user.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Account id
    pub id: UserId,
    /// Unique login name
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// Admin capability
    pub is_staff: bool,
    /// Superuser flag
    pub is_superuser: bool,
}

impl UserRecord {
    /// The identity this account authenticates as.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            username: self.username.clone(),
            is_admin: self.is_staff,
            is_superuser: self.is_superuser,
        }
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("is_staff", &self.is_staff)
            .field("is_superuser", &self.is_superuser)
            .finish()
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("is_staff", &self.is_staff)
            .finish_non_exhaustive()
    }
}

/// User and token persistence.
pub trait UserStore: Send + Sync {
    /// Insert a user.
    ///
    /// # Errors
    ///
    /// `Validation("Username already exists")` on a duplicate name, including
    /// when a concurrent registration wins the race.
    fn create_user(&self, user: NewUser) -> impl Future<Output = Result<UserRecord>> + Send;

    /// Look up a user by exact name.
    ///
    /// # Errors
    ///
    /// `Unavailable` or `Storage` on store failure.
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>>> + Send;

    /// Return the user's token, storing `candidate` if they have none yet.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user does not exist.
    fn get_or_create_token(
        &self,
        user_id: UserId,
        candidate: String,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Resolve a token to the identity of its owner.
    ///
    /// # Errors
    ///
    /// `Unavailable` or `Storage` on store failure.
    fn identity_for_token(&self, token: &str)
    -> impl Future<Output = Result<Option<Identity>>> + Send;

    /// Grant the admin capability.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user does not exist.
    fn promote_to_admin(&self, user_id: UserId) -> impl Future<Output = Result<()>> + Send;
}

/// Username/password pair as received. Missing fields are validation errors.
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    /// Login name
    pub username: Option<String>,
    /// Plain-text password
    pub password: Option<String>,
}

impl Credentials {
    /// Convenience constructor.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    fn require(&self) -> Result<(&str, &str)> {
        let username = self.username.as_deref().map(str::trim).unwrap_or_default();
        let password = self.password.as_deref().unwrap_or_default();
        if username.is_empty() || password.is_empty() {
            return Err(BookingError::Validation(
                "Username and password are required".into(),
            ));
        }
        Ok((username, password))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Result of a successful login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    /// Opaque bearer token
    pub token: String,
    /// Login name
    pub username: String,
    /// Admin capability
    pub is_admin: bool,
}

/// The `current_user` view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    /// Login name
    pub username: String,
    /// Admin capability
    pub is_staff: bool,
    /// Superuser flag
    pub is_superuser: bool,
}

/// Hash a password into an Argon2 PHC string.
///
/// # Errors
///
/// `Storage` if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| BookingError::Storage(format!("Password hashing failed: {e}")))
}

/// Check `password` against a stored PHC string. Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Generate a fresh URL-safe token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::thread_rng().r#gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Registration, login and identity resolution over a [`UserStore`].
pub struct AccountService<U> {
    users: Arc<U>,
}

impl<U> Clone for AccountService<U> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
        }
    }
}

impl<U: UserStore> AccountService<U> {
    /// Create a service over `users`.
    #[must_use]
    pub const fn new(users: Arc<U>) -> Self {
        Self { users }
    }

    /// Create a non-admin account.
    ///
    /// # Errors
    ///
    /// `Validation` if a field is missing or the username is taken.
    #[tracing::instrument(skip(self, credentials), fields(username = ?credentials.username))]
    pub async fn register(&self, credentials: &Credentials) -> Result<UserRecord> {
        let (username, password) = credentials.require()?;
        let user = self
            .users
            .create_user(NewUser {
                username: username.to_owned(),
                password_hash: hash_password(password)?,
                is_staff: false,
                is_superuser: false,
            })
            .await?;

        metrics::counter!("slotbook_registrations_total").increment(1);
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Exchange a username and password for the user's token.
    ///
    /// # Errors
    ///
    /// `Unauthenticated("Invalid credentials")` for unknown users, wrong
    /// passwords and missing fields alike.
    #[tracing::instrument(skip(self, credentials), fields(username = ?credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome> {
        let Ok((username, password)) = credentials.require() else {
            return Err(BookingError::Unauthenticated(INVALID_CREDENTIALS.into()));
        };

        let user = self
            .users
            .find_by_username(username)
            .await?
            .filter(|user| verify_password(password, &user.password_hash));
        let Some(user) = user else {
            tracing::warn!("Login rejected");
            return Err(BookingError::Unauthenticated(INVALID_CREDENTIALS.into()));
        };

        let token = self
            .users
            .get_or_create_token(user.id, generate_token())
            .await?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome {
            token,
            username: user.username,
            is_admin: user.is_staff,
        })
    }

    /// Resolve a bearer token.
    ///
    /// # Errors
    ///
    /// `Unauthenticated("Invalid token")` if no user owns `token`.
    pub async fn authenticate(&self, token: &str) -> Result<Identity> {
        self.users
            .identity_for_token(token)
            .await?
            .ok_or_else(|| BookingError::Unauthenticated("Invalid token".into()))
    }

    /// Describe the authenticated caller.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for anonymous viewers.
    pub fn current_user(&self, viewer: &Viewer) -> Result<CurrentUser> {
        let identity = viewer.require_authenticated()?;
        Ok(CurrentUser {
            username: identity.username.clone(),
            is_staff: identity.is_admin,
            is_superuser: identity.is_superuser,
        })
    }

    /// Make sure an admin called `username` exists, creating or promoting it.
    ///
    /// An existing account keeps its password.
    ///
    /// # Errors
    ///
    /// `Validation` for empty credentials, store errors otherwise.
    #[tracing::instrument(skip(self, password))]
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<UserRecord> {
        let (username, password) = Credentials::new(username, password)
            .require()
            .map(|(u, p)| (u.to_owned(), p.to_owned()))?;

        if let Some(mut existing) = self.users.find_by_username(&username).await? {
            if !existing.is_staff {
                self.users.promote_to_admin(existing.id).await?;
                existing.is_staff = true;
                tracing::info!(user_id = %existing.id, "Promoted existing user to admin");
            }
            return Ok(existing);
        }

        let admin = NewUser {
            username: username.clone(),
            password_hash: hash_password(&password)?,
            is_staff: true,
            is_superuser: true,
        };
        match self.users.create_user(admin).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Bootstrap admin created");
                Ok(user)
            }
            // Lost a race with another instance bootstrapping the same admin.
            Err(BookingError::Validation(_)) => {
                let Some(user) = self.users.find_by_username(&username).await? else {
                    return Err(BookingError::Storage(
                        "Admin account vanished during bootstrap".into(),
                    ));
                };
                Ok(user)
            }
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_only_the_original_password() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("S3cret", &hash));
        assert!(!verify_password("s3cret", "not-a-phc-string"));
    }

    #[test]
    fn tokens_are_url_safe_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn empty_fields_count_as_missing() {
        assert!(Credentials::new("  ", "pw").require().is_err());
        assert!(Credentials::new("bob", "").require().is_err());
        assert!(Credentials::default().require().is_err());
        assert_eq!(Credentials::new(" bob ", "pw").require().unwrap(), ("bob", "pw"));
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("bob", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
