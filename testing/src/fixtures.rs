//! Identities, dates and a ready-wired set of services.

use crate::slots::InMemorySlotStore;
use crate::users::InMemoryUserStore;
use chrono::NaiveDate;
use slotbook_core::{
    AccountService, AvailabilityProjector, BookingCoordinator, CancelPolicy, Identity,
    SlotProvisioner, UserId, Viewer,
};
use std::sync::Arc;

/// Monday the slots in most tests are scheduled on.
pub const WEEK_START: &str = "2024-06-10";

/// Regular user #1.
#[must_use]
pub fn alice() -> Identity {
    Identity::user(UserId::new(1), "alice")
}

/// Regular user #2.
#[must_use]
pub fn bob() -> Identity {
    Identity::user(UserId::new(2), "bob")
}

/// Staff user.
#[must_use]
pub fn admin() -> Identity {
    Identity::admin(UserId::new(100), "admin")
}

/// `count` distinct regular users, ids starting at 1000.
#[must_use]
pub fn racers(count: usize) -> Vec<Identity> {
    (0..count)
        .map(|i| {
            let id = 1000 + i64::try_from(i).unwrap_or(i64::MAX - 1000);
            Identity::user(UserId::new(id), format!("racer-{i}"))
        })
        .collect()
}

/// Shorthand for an authenticated viewer.
#[must_use]
pub fn viewer(identity: &Identity) -> Viewer {
    Viewer::from(identity.clone())
}

/// Parse a `YYYY-MM-DD` literal.
///
/// # Panics
///
/// Panics if `literal` is not a valid date.
#[must_use]
#[allow(clippy::expect_used)]
pub fn date(literal: &str) -> NaiveDate {
    NaiveDate::parse_from_str(literal, "%Y-%m-%d").expect("test date literal should parse")
}

/// Every service wired to shared in-memory stores.
#[derive(Clone)]
pub struct TestServices {
    /// Slot store, for seeding and inspecting state
    pub slots: Arc<InMemorySlotStore>,
    /// User store
    pub users: Arc<InMemoryUserStore>,
    /// Claim and release
    pub booking: BookingCoordinator<InMemorySlotStore>,
    /// Weekly and admin listings
    pub availability: AvailabilityProjector<InMemorySlotStore>,
    /// Admin slot creation
    pub provisioner: SlotProvisioner<InMemorySlotStore>,
    /// Registration and login
    pub accounts: AccountService<InMemoryUserStore>,
}

impl Default for TestServices {
    fn default() -> Self {
        Self::new()
    }
}

impl TestServices {
    /// Services with the unrestricted cancel policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(InMemorySlotStore::new(), CancelPolicy::Unrestricted)
    }

    /// Services over a preconfigured slot store.
    #[must_use]
    pub fn with_store(store: InMemorySlotStore, policy: CancelPolicy) -> Self {
        let slots = Arc::new(store);
        let users = Arc::new(InMemoryUserStore::new());
        Self {
            booking: BookingCoordinator::new(Arc::clone(&slots)).with_cancel_policy(policy),
            availability: AvailabilityProjector::new(Arc::clone(&slots)),
            provisioner: SlotProvisioner::new(Arc::clone(&slots)),
            accounts: AccountService::new(Arc::clone(&users)),
            slots,
            users,
        }
    }
}
