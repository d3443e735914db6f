//! # Slotbook Core
//!
//! Domain types and services for a time-slot booking system.
//!
//! Administrators create slots grouped by event category; users list a week
//! of slots and claim or cancel them. The interesting part is contention:
//! when many users race to claim one slot, exactly one wins.
//!
//! ## Components
//!
//! - [`SlotStore`] / [`SlotTransaction`]: durable slots with row locking
//! - [`BookingCoordinator`]: claim and release under the row lock
//! - [`AvailabilityProjector`]: viewer-relative weekly and admin listings
//! - [`SlotProvisioner`]: validated, admin-only slot creation
//! - [`AccountService`]: registration, token login and identity lookup
//!
//! Services are generic over their store and cheap to clone; they share the
//! store through an `Arc`.
//!
//! ## Example
//!
//! ```ignore
//! use slotbook_core::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(store);
//! let booking = BookingCoordinator::new(Arc::clone(&store));
//! let projector = AvailabilityProjector::new(store);
//!
//! booking.claim(slot_id, &alice).await?;
//! let week = projector
//!     .week(week_start, CategoryFilter::All, &Viewer::from(alice))
//!     .await?;
//! ```

pub mod accounts;
pub mod availability;
pub mod booking;
pub mod error;
pub mod identity;
pub mod provisioning;
pub mod schedule;
pub mod slot;
pub mod store;
pub mod types;

pub use accounts::{AccountService, Credentials, CurrentUser, LoginOutcome, NewUser, UserRecord, UserStore};
pub use availability::{AdminSlotView, AvailabilityProjector, DaySlots, SlotView};
pub use booking::{BookingCoordinator, CancelPolicy};
pub use error::{BookingError, Result};
pub use identity::{Identity, Viewer};
pub use provisioning::{CreateSlotRequest, SlotProvisioner};
pub use slot::{EventCategory, Holder, NewSlot, SlotState, SlotStatus, TimeSlot};
pub use store::{CategoryFilter, SlotFilter, SlotStore, SlotTransaction};
pub use types::{CategoryId, SlotId, UserId};
