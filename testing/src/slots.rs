//! In-memory slot store with real row-lock semantics.
//!
//! Each slot id has its own async mutex. [`fetch_for_update`] acquires it and
//! the transaction keeps the guard until commit, rollback or drop, which gives
//! claims the same serialization a database row lock does. Writes are
//! buffered per transaction and only become visible on commit.
//!
//! [`fetch_for_update`]: SlotTransaction::fetch_for_update

#![allow(clippy::missing_panics_doc)] // Only panics on a poisoned mutex

use slotbook_core::schedule::{parse_date, parse_time};
use slotbook_core::{
    BookingError, CategoryId, EventCategory, Holder, Identity, NewSlot, Result, SlotFilter,
    SlotId, SlotStore, SlotTransaction, TimeSlot,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

/// Default bound on row-lock waits, mirroring the database default.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Tables {
    slots: BTreeMap<SlotId, TimeSlot>,
    categories: HashMap<String, EventCategory>,
    next_slot_id: i64,
    next_category_id: i64,
}

type RowLock = Arc<tokio::sync::Mutex<()>>;

#[derive(Default)]
struct Shared {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<SlotId, RowLock>>,
    unavailable: AtomicBool,
}

impl Shared {
    #[allow(clippy::unwrap_used)] // Poisoning only follows a panic in another test thread
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    #[allow(clippy::unwrap_used)]
    fn row_lock(&self, id: SlotId) -> RowLock {
        Arc::clone(self.row_locks.lock().unwrap().entry(id).or_default())
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(BookingError::Unavailable("in-memory store is offline".into()))
        } else {
            Ok(())
        }
    }
}

/// In-memory [`SlotStore`] for tests.
///
/// Clones share the same tables.
#[derive(Clone)]
pub struct InMemorySlotStore {
    shared: Arc<Shared>,
    lock_timeout: Duration,
}

impl Default for InMemorySlotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySlotStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::default(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Override the row-lock wait bound.
    #[must_use]
    pub const fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Make every subsequent operation fail with `Unavailable` (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Insert an available slot from textual input.
    ///
    /// # Errors
    ///
    /// `Validation` if a date or time does not parse.
    pub fn seed(&self, category: &str, date: &str, start: &str, end: &str) -> Result<TimeSlot> {
        let date = parse_date(date)?;
        let start_time = parse_time(start)?;
        let end_time = parse_time(end)?;
        let mut tables = self.shared.tables();
        let category = upsert_category(&mut tables, category);
        Ok(insert_slot(
            &mut tables,
            NewSlot {
                category,
                date,
                start_time,
                end_time,
            },
        ))
    }

    /// Committed state of one slot.
    #[must_use]
    pub fn slot(&self, id: SlotId) -> Option<TimeSlot> {
        self.shared.tables().slots.get(&id).cloned()
    }

    /// Number of slot rows.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.shared.tables().slots.len()
    }

    /// Number of category rows.
    #[must_use]
    pub fn category_count(&self) -> usize {
        self.shared.tables().categories.len()
    }
}

fn upsert_category(tables: &mut Tables, name: &str) -> EventCategory {
    if let Some(existing) = tables.categories.get(name) {
        return existing.clone();
    }
    tables.next_category_id += 1;
    let category = EventCategory {
        id: CategoryId::new(tables.next_category_id),
        name: name.to_owned(),
    };
    tables.categories.insert(name.to_owned(), category.clone());
    category
}

fn insert_slot(tables: &mut Tables, slot: NewSlot) -> TimeSlot {
    tables.next_slot_id += 1;
    let slot = TimeSlot {
        id: SlotId::new(tables.next_slot_id),
        category: slot.category,
        date: slot.date,
        start_time: slot.start_time,
        end_time: slot.end_time,
        holder: None,
    };
    tables.slots.insert(slot.id, slot.clone());
    slot
}

impl SlotStore for InMemorySlotStore {
    type Tx = InMemorySlotTransaction;

    async fn begin(&self) -> Result<InMemorySlotTransaction> {
        self.shared.check_available()?;
        Ok(InMemorySlotTransaction {
            shared: Arc::clone(&self.shared),
            lock_timeout: self.lock_timeout,
            locks: HashMap::new(),
            pending: Vec::new(),
        })
    }

    async fn list_slots(&self, filter: &SlotFilter) -> Result<Vec<TimeSlot>> {
        self.shared.check_available()?;
        let mut slots: Vec<TimeSlot> = self
            .shared
            .tables()
            .slots
            .values()
            .filter(|slot| filter.matches(slot))
            .cloned()
            .collect();
        slots.sort_by_key(|slot| (slot.date, slot.start_time, slot.id));
        Ok(slots)
    }

    async fn upsert_category_by_name(&self, name: &str) -> Result<EventCategory> {
        self.shared.check_available()?;
        Ok(upsert_category(&mut self.shared.tables(), name))
    }

    async fn create_slot(&self, slot: NewSlot) -> Result<TimeSlot> {
        self.shared.check_available()?;
        if slot.start_time >= slot.end_time {
            return Err(BookingError::Validation(
                "Start time must be before end time".into(),
            ));
        }
        Ok(insert_slot(&mut self.shared.tables(), slot))
    }

    async fn clear_holder(&self, id: SlotId) -> Result<TimeSlot> {
        self.shared.check_available()?;
        // A single-statement UPDATE still queues behind an open claim on the row.
        let row_lock = self.shared.row_lock(id);
        let _guard = tokio::time::timeout(self.lock_timeout, row_lock.lock_owned())
            .await
            .map_err(|_| BookingError::Unavailable("lock timeout".into()))?;

        let mut tables = self.shared.tables();
        let slot = tables
            .slots
            .get_mut(&id)
            .ok_or_else(|| BookingError::slot_not_found(id))?;
        slot.holder = None;
        Ok(slot.clone())
    }

    async fn ping(&self) -> Result<()> {
        self.shared.check_available()
    }
}

/// Transaction over an [`InMemorySlotStore`].
pub struct InMemorySlotTransaction {
    shared: Arc<Shared>,
    lock_timeout: Duration,
    locks: HashMap<SlotId, OwnedMutexGuard<()>>,
    pending: Vec<(SlotId, Option<Holder>)>,
}

impl InMemorySlotTransaction {
    /// Committed row overlaid with this transaction's own pending writes.
    fn visible(&self, id: SlotId) -> Option<TimeSlot> {
        let mut slot = self.shared.tables().slots.get(&id).cloned()?;
        if let Some((_, holder)) = self.pending.iter().rev().find(|(pending, _)| *pending == id) {
            slot.holder.clone_from(holder);
        }
        Some(slot)
    }
}

impl SlotTransaction for InMemorySlotTransaction {
    async fn fetch_for_update(&mut self, id: SlotId) -> Result<TimeSlot> {
        self.shared.check_available()?;
        if !self.locks.contains_key(&id) {
            let row_lock = self.shared.row_lock(id);
            let guard = tokio::time::timeout(self.lock_timeout, row_lock.lock_owned())
                .await
                .map_err(|_| BookingError::Unavailable("lock timeout".into()))?;
            self.locks.insert(id, guard);
        }
        self.visible(id).ok_or_else(|| BookingError::slot_not_found(id))
    }

    async fn set_holder(&mut self, id: SlotId, holder: Option<&Identity>) -> Result<()> {
        self.shared.check_available()?;
        if self.visible(id).is_none() {
            return Err(BookingError::slot_not_found(id));
        }
        self.pending.push((id, holder.map(Holder::from)));
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.shared.check_available()?;
        let mut tables = self.shared.tables();
        for (id, holder) in self.pending {
            if let Some(slot) = tables.slots.get_mut(&id) {
                slot.holder = holder;
            }
        }
        drop(tables);
        drop(self.locks);
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
