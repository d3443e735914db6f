//! Slot store abstraction.
//!
//! The store is the single source of truth for slot state. It offers two kinds
//! of access:
//!
//! - Unlocked reads ([`SlotStore::list_slots`]) for projections. These never
//!   observe uncommitted writes.
//! - A transaction ([`SlotStore::begin`]) whose
//!   [`fetch_for_update`](SlotTransaction::fetch_for_update) takes an exclusive
//!   row lock held until [`commit`](SlotTransaction::commit) or
//!   [`rollback`](SlotTransaction::rollback). Dropping a transaction rolls it
//!   back.
//!
//! # Implementations
//!
//! - `PgSlotStore` (in `slotbook-postgres`): `SELECT ... FOR UPDATE`
//! - `InMemorySlotStore` (in `slotbook-testing`): per-row async mutexes

use crate::error::Result;
use crate::identity::Identity;
use crate::schedule::parse_date;
use crate::slot::{EventCategory, NewSlot, TimeSlot};
use crate::types::SlotId;
use chrono::NaiveDate;
use std::future::Future;

/// Literal that disables category filtering.
pub const ALL_CATEGORIES: &str = "All";

/// Category part of a slot filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Pass-through
    #[default]
    All,
    /// Equality on category name
    Named(String),
}

impl CategoryFilter {
    /// Interpret a request parameter; absent, empty and `"All"` disable filtering.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            None | Some("" | ALL_CATEGORIES) => Self::All,
            Some(name) => Self::Named(name.to_owned()),
        }
    }

    /// The category name to match, if filtering.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Named(name) => Some(name),
        }
    }

    /// Whether a slot in `category` passes.
    #[must_use]
    pub fn matches(&self, category: &EventCategory) -> bool {
        self.name().is_none_or(|name| category.name == name)
    }
}

/// Explicit query options for slot listings.
///
/// Each option narrows the result independently:
///
/// - `date_from`: `date >= date_from`
/// - `date_to`: `date <= date_to`
/// - `category`: equality on name, or pass-through for [`CategoryFilter::All`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotFilter {
    /// Inclusive lower bound
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound
    pub date_to: Option<NaiveDate>,
    /// Category restriction
    pub category: CategoryFilter,
}

impl SlotFilter {
    /// A closed date window.
    #[must_use]
    pub const fn between(from: NaiveDate, to: NaiveDate, category: CategoryFilter) -> Self {
        Self {
            date_from: Some(from),
            date_to: Some(to),
            category,
        }
    }

    /// Build a filter from raw optional request parameters.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`](crate::BookingError::Validation) if a
    /// present, non-empty date does not parse.
    pub fn from_params(
        date_from: Option<&str>,
        date_to: Option<&str>,
        category: Option<&str>,
    ) -> Result<Self> {
        let parse = |raw: Option<&str>| {
            raw.filter(|value| !value.trim().is_empty())
                .map(parse_date)
                .transpose()
        };
        Ok(Self {
            date_from: parse(date_from)?,
            date_to: parse(date_to)?,
            category: CategoryFilter::from_param(category),
        })
    }

    /// Whether `slot` satisfies every option.
    #[must_use]
    pub fn matches(&self, slot: &TimeSlot) -> bool {
        self.date_from.is_none_or(|from| slot.date >= from)
            && self.date_to.is_none_or(|to| slot.date <= to)
            && self.category.matches(&slot.category)
    }
}

/// Durable slot and category storage.
pub trait SlotStore: Send + Sync {
    /// Transaction handle returned by [`begin`](Self::begin).
    type Tx: SlotTransaction;

    /// Open a transaction for a locked read-modify-write.
    ///
    /// # Errors
    ///
    /// `Unavailable` if no connection could be obtained.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx>> + Send;

    /// List slots matching `filter`, ordered by date, start time, id.
    ///
    /// Takes no locks.
    ///
    /// # Errors
    ///
    /// `Unavailable` or `Storage` on store failure.
    fn list_slots(&self, filter: &SlotFilter) -> impl Future<Output = Result<Vec<TimeSlot>>> + Send;

    /// Return the category called `name`, creating it if needed.
    ///
    /// Concurrent calls with the same new name yield the same row.
    ///
    /// # Errors
    ///
    /// `Unavailable` or `Storage` on store failure.
    fn upsert_category_by_name(&self, name: &str)
    -> impl Future<Output = Result<EventCategory>> + Send;

    /// Insert a new, available slot.
    ///
    /// # Errors
    ///
    /// `Validation` if the row violates a store constraint, `Unavailable` or
    /// `Storage` on store failure.
    fn create_slot(&self, slot: NewSlot) -> impl Future<Output = Result<TimeSlot>> + Send;

    /// Clear the holder of a slot in a single statement, without a row lock.
    ///
    /// # Errors
    ///
    /// `NotFound` if the slot does not exist.
    fn clear_holder(&self, id: SlotId) -> impl Future<Output = Result<TimeSlot>> + Send;

    /// Cheap connectivity check for readiness probes.
    ///
    /// # Errors
    ///
    /// `Unavailable` if the store cannot be reached.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;
}

/// A store transaction scoped to one booking transition.
pub trait SlotTransaction: Send {
    /// Fetch a slot and hold its exclusive row lock until the transaction ends.
    ///
    /// # Errors
    ///
    /// `NotFound` if the slot does not exist, `Unavailable` if the lock wait
    /// timed out or deadlocked.
    fn fetch_for_update(&mut self, id: SlotId) -> impl Future<Output = Result<TimeSlot>> + Send;

    /// Set or clear the holder of a slot locked by this transaction.
    ///
    /// # Errors
    ///
    /// `NotFound` if the slot disappeared, `Unavailable` or `Storage` otherwise.
    fn set_holder(
        &mut self,
        id: SlotId,
        holder: Option<&Identity>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Make all writes visible and release locks.
    ///
    /// # Errors
    ///
    /// `Unavailable` or `Storage` if the commit failed; nothing was written.
    fn commit(self) -> impl Future<Output = Result<()>> + Send;

    /// Discard all writes and release locks.
    ///
    /// # Errors
    ///
    /// `Unavailable` or `Storage` if the rollback could not be sent.
    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
