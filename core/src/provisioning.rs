//! Admin slot creation.

use crate::availability::SlotView;
use crate::error::{BookingError, Result};
use crate::identity::Viewer;
use crate::schedule::{parse_date, parse_time};
use crate::slot::{MAX_CATEGORY_NAME_LEN, NewSlot};
use crate::store::SlotStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Raw slot creation input, exactly as received.
///
/// Every field is optional here so that missing input surfaces as a
/// validation error rather than a decoding failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSlotRequest {
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// `HH:MM` or `HH:MM AM/PM`
    pub start_time: Option<String>,
    /// `HH:MM` or `HH:MM AM/PM`
    pub end_time: Option<String>,
    /// Category name, created on first use
    pub category: Option<String>,
}

fn required<'a>(field: Option<&'a String>) -> Option<&'a str> {
    field.map(|value| value.trim()).filter(|value| !value.is_empty())
}

/// Validates admin input and creates slots.
pub struct SlotProvisioner<S> {
    store: Arc<S>,
}

impl<S> Clone for SlotProvisioner<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SlotStore> SlotProvisioner<S> {
    /// Create a provisioner over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create an available slot and return it rendered for the creating admin.
    ///
    /// Checks run in a fixed order: admin capability, presence of all
    /// fields, date, times, `start_time < end_time`, category name length.
    /// Nothing is written unless every check passes.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated`/`PermissionDenied` for non-admin viewers
    /// - `Validation` for missing or malformed fields
    /// - `Unavailable` or `Storage` on store failure
    #[tracing::instrument(skip(self, viewer, request), fields(user_id = ?viewer.user_id(), category = ?request.category))]
    pub async fn create_slot(&self, viewer: &Viewer, request: CreateSlotRequest) -> Result<SlotView> {
        if let Err(error) = viewer.require_admin() {
            tracing::warn!("Slot creation denied");
            return Err(error);
        }

        let (Some(date), Some(start), Some(end), Some(category)) = (
            required(request.date.as_ref()),
            required(request.start_time.as_ref()),
            required(request.end_time.as_ref()),
            required(request.category.as_ref()),
        ) else {
            return Err(BookingError::Validation("Missing required fields".into()));
        };

        let date = parse_date(date)?;
        let start_time = parse_time(start)?;
        let end_time = parse_time(end)?;
        if start_time >= end_time {
            return Err(BookingError::Validation(
                "Start time must be before end time".into(),
            ));
        }
        if category.chars().count() > MAX_CATEGORY_NAME_LEN {
            return Err(BookingError::Validation(format!(
                "Category name must be at most {MAX_CATEGORY_NAME_LEN} characters"
            )));
        }

        let category = self.store.upsert_category_by_name(category).await?;
        let slot = self
            .store
            .create_slot(NewSlot {
                category,
                date,
                start_time,
                end_time,
            })
            .await?;

        metrics::counter!("slotbook_slots_created_total").increment(1);
        tracing::info!(slot_id = %slot.id, %date, "Slot created");
        Ok(SlotView::render(&slot, viewer))
    }
}
