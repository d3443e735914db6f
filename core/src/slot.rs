//! Time slots, event categories and the slot booking state.

use crate::identity::{Identity, Viewer};
use crate::types::{CategoryId, SlotId, UserId};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Maximum length of a category name.
pub const MAX_CATEGORY_NAME_LEN: usize = 50;

/// A named grouping of slots (e.g. "Yoga").
///
/// Names are unique; categories are created implicitly on first use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCategory {
    /// Category id
    pub id: CategoryId,
    /// Unique category name
    pub name: String,
}

/// The user currently occupying a slot, with the name shown to admins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    /// Holder's account id
    pub user_id: UserId,
    /// Holder's display name
    pub username: String,
}

impl From<&Identity> for Holder {
    fn from(identity: &Identity) -> Self {
        Self {
            user_id: identity.user_id,
            username: identity.username.clone(),
        }
    }
}

/// A bookable interval on a given date.
///
/// `holder` is `None` while the slot is available and names exactly one user
/// once it is booked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Slot id
    pub id: SlotId,
    /// Category this slot is tagged with
    pub category: EventCategory,
    /// Calendar date
    pub date: NaiveDate,
    /// Start time (exclusive upper bound is `end_time`)
    pub start_time: NaiveTime,
    /// End time
    pub end_time: NaiveTime,
    /// Current holder, if booked
    pub holder: Option<Holder>,
}

/// Absolute booking state of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// No holder
    Available,
    /// Held by the given user
    Booked(UserId),
}

/// Status of a slot as rendered for a particular viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    /// No holder
    Available,
    /// Held by the viewer
    Mine,
    /// Held by someone else
    Booked,
}

impl SlotStatus {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Mine => "mine",
            Self::Booked => "booked",
        }
    }
}

impl TimeSlot {
    /// Absolute booking state.
    #[must_use]
    pub fn state(&self) -> SlotState {
        self.holder
            .as_ref()
            .map_or(SlotState::Available, |holder| SlotState::Booked(holder.user_id))
    }

    /// Whether the slot has no holder.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.holder.is_none()
    }

    /// Whether `identity` is the current holder.
    #[must_use]
    pub fn is_held_by(&self, identity: &Identity) -> bool {
        self.holder
            .as_ref()
            .is_some_and(|holder| holder.user_id == identity.user_id)
    }

    /// Viewer-relative status: `mine` only for the authenticated holder.
    #[must_use]
    pub fn status_for(&self, viewer: &Viewer) -> SlotStatus {
        match (self.state(), viewer.user_id()) {
            (SlotState::Available, _) => SlotStatus::Available,
            (SlotState::Booked(holder), Some(viewer)) if holder == viewer => SlotStatus::Mine,
            (SlotState::Booked(_), _) => SlotStatus::Booked,
        }
    }

    /// Status without any viewer; never `mine`.
    #[must_use]
    pub fn absolute_status(&self) -> SlotStatus {
        self.status_for(&Viewer::Anonymous)
    }
}

/// A validated slot ready to be inserted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSlot {
    /// Category the slot belongs to
    pub category: EventCategory,
    /// Calendar date
    pub date: NaiveDate,
    /// Start time
    pub start_time: NaiveTime,
    /// End time
    pub end_time: NaiveTime,
}
