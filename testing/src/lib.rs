//! # Slotbook Testing
//!
//! In-memory stores and fixtures for exercising the booking core without a
//! database.
//!
//! - [`InMemorySlotStore`]: per-row async locks, buffered transactional
//!   writes and an outage switch
//! - [`InMemoryUserStore`]: users and tokens
//! - [`fixtures`]: identities, dates and [`TestServices`]
//!
//! ## Example
//!
//! ```
//! use slotbook_testing::{TestServices, fixtures::alice};
//!
//! # tokio_test::block_on(async {
//! let services = TestServices::new();
//! let slot = services.slots.seed("Yoga", "2024-06-10", "09:00", "10:00").unwrap();
//!
//! services.booking.claim(slot.id, &alice()).await.unwrap();
//! assert!(services.slots.slot(slot.id).unwrap().holder.is_some());
//! # });
//! ```

pub mod fixtures;
pub mod slots;
pub mod users;

pub use fixtures::TestServices;
pub use slots::{InMemorySlotStore, InMemorySlotTransaction};
pub use users::InMemoryUserStore;
