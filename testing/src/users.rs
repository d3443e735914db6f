//! In-memory user and token store.

use slotbook_core::{BookingError, Identity, NewUser, Result, UserId, UserRecord, UserStore};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Accounts {
    users: BTreeMap<UserId, UserRecord>,
    tokens: HashMap<String, UserId>,
    next_id: i64,
}

/// In-memory [`UserStore`] for tests. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    accounts: Arc<Mutex<Accounts>>,
}

impl InMemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::unwrap_used)] // Poisoning only follows a panic in another test thread
    fn accounts(&self) -> MutexGuard<'_, Accounts> {
        self.accounts.lock().unwrap()
    }

    /// Number of registered users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.accounts().users.len()
    }

    /// Number of issued tokens.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.accounts().tokens.len()
    }
}

impl UserStore for InMemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord> {
        let mut accounts = self.accounts();
        if accounts.users.values().any(|existing| existing.username == user.username) {
            return Err(BookingError::Validation("Username already exists".into()));
        }
        accounts.next_id += 1;
        let record = UserRecord {
            id: UserId::new(accounts.next_id),
            username: user.username,
            password_hash: user.password_hash,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        };
        accounts.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .accounts()
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn get_or_create_token(&self, user_id: UserId, candidate: String) -> Result<String> {
        let mut accounts = self.accounts();
        if !accounts.users.contains_key(&user_id) {
            return Err(BookingError::user_not_found(user_id));
        }
        if let Some((token, _)) = accounts.tokens.iter().find(|(_, owner)| **owner == user_id) {
            return Ok(token.clone());
        }
        accounts.tokens.insert(candidate.clone(), user_id);
        Ok(candidate)
    }

    async fn identity_for_token(&self, token: &str) -> Result<Option<Identity>> {
        let accounts = self.accounts();
        Ok(accounts
            .tokens
            .get(token)
            .and_then(|user_id| accounts.users.get(user_id))
            .map(UserRecord::identity))
    }

    async fn promote_to_admin(&self, user_id: UserId) -> Result<()> {
        let mut accounts = self.accounts();
        let user = accounts
            .users
            .get_mut(&user_id)
            .ok_or_else(|| BookingError::user_not_found(user_id))?;
        user.is_staff = true;
        Ok(())
    }
}
