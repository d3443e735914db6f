//! Read-side projections of slot state.
//!
//! Projections never lock and never write. They read committed rows only, so
//! a claim becomes visible here exactly when its transaction commits.

use crate::error::Result;
use crate::identity::Viewer;
use crate::schedule::{format_time_range, week_end, week_of};
use crate::slot::{SlotStatus, TimeSlot};
use crate::store::{CategoryFilter, SlotFilter, SlotStore};
use crate::types::SlotId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A slot as shown to an end user. Never exposes the holder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    /// Slot id
    pub id: SlotId,
    /// Rendered range, e.g. `09:00 AM – 10:00 AM`
    pub time: String,
    /// Category name
    pub category: String,
    /// Viewer-relative status
    pub status: SlotStatus,
}

impl SlotView {
    /// Render `slot` for `viewer`.
    #[must_use]
    pub fn render(slot: &TimeSlot, viewer: &Viewer) -> Self {
        Self {
            id: slot.id,
            time: format_time_range(slot.start_time, slot.end_time),
            category: slot.category.name.clone(),
            status: slot.status_for(viewer),
        }
    }
}

/// One day of the weekly listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlots {
    /// The day
    pub date: NaiveDate,
    /// Slots on that day, possibly empty
    pub slots: Vec<SlotView>,
}

/// A slot as shown to an admin: absolute status plus the holder's name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSlotView {
    /// Slot id
    pub id: SlotId,
    /// The day
    pub date: NaiveDate,
    /// Rendered range
    pub time: String,
    /// Category name
    pub category: String,
    /// `available` or `booked`
    pub status: SlotStatus,
    /// Holder's display name
    pub booked_by: Option<String>,
}

impl From<&TimeSlot> for AdminSlotView {
    fn from(slot: &TimeSlot) -> Self {
        Self {
            id: slot.id,
            date: slot.date,
            time: format_time_range(slot.start_time, slot.end_time),
            category: slot.category.name.clone(),
            status: slot.absolute_status(),
            booked_by: slot.holder.as_ref().map(|holder| holder.username.clone()),
        }
    }
}

/// Builds weekly and admin listings from a [`SlotStore`].
pub struct AvailabilityProjector<S> {
    store: Arc<S>,
}

impl<S> Clone for AvailabilityProjector<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SlotStore> AvailabilityProjector<S> {
    /// Create a projector over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Seven days starting at `week_start`, each with its slots rendered for
    /// `viewer`. Empty days are included.
    ///
    /// # Errors
    ///
    /// `Unavailable` or `Storage` on store failure.
    #[tracing::instrument(skip(self, viewer), fields(user_id = ?viewer.user_id()))]
    pub async fn week(
        &self,
        week_start: NaiveDate,
        category: CategoryFilter,
        viewer: &Viewer,
    ) -> Result<Vec<DaySlots>> {
        let filter = SlotFilter::between(week_start, week_end(week_start), category);
        let slots = self.store.list_slots(&filter).await?;
        tracing::debug!(count = slots.len(), "Loaded slots for week");

        let mut by_date: BTreeMap<NaiveDate, Vec<SlotView>> = BTreeMap::new();
        for slot in &slots {
            by_date
                .entry(slot.date)
                .or_default()
                .push(SlotView::render(slot, viewer));
        }

        Ok(week_of(week_start)
            .into_iter()
            .map(|date| DaySlots {
                date,
                slots: by_date.remove(&date).unwrap_or_default(),
            })
            .collect())
    }

    /// Every slot matching `filter`, with holder names.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`/`PermissionDenied` for non-admin viewers, checked
    /// before the store is queried. `Unavailable` or `Storage` on store
    /// failure.
    #[tracing::instrument(skip(self, viewer), fields(user_id = ?viewer.user_id()))]
    pub async fn admin_list(
        &self,
        viewer: &Viewer,
        filter: &SlotFilter,
    ) -> Result<Vec<AdminSlotView>> {
        if let Err(error) = viewer.require_admin() {
            tracing::warn!("Admin listing denied");
            return Err(error);
        }
        let slots = self.store.list_slots(filter).await?;
        tracing::debug!(count = slots.len(), "Loaded slots for admin listing");
        Ok(slots.iter().map(AdminSlotView::from).collect())
    }
}
