//! Booking coordinator: the claim/release state machine.
//!
//! ```text
//! AVAILABLE --claim(identity)--> BOOKED(identity)
//! BOOKED(identity) --cancel--> AVAILABLE
//! ```
//!
//! `claim` runs inside a store transaction holding the slot's row lock, so of
//! any number of concurrent claims on one slot exactly one sees it available.
//! Losers fail with [`BookingError::AlreadyBooked`].

use crate::error::{BookingError, Result};
use crate::identity::{Identity, Viewer};
use crate::slot::{Holder, TimeSlot};
use crate::store::{SlotStore, SlotTransaction};
use crate::types::SlotId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

/// Who may release a booking through [`BookingCoordinator::release`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CancelPolicy {
    /// Anyone, including anonymous callers, may cancel any booking by id.
    #[default]
    Unrestricted,
    /// Only the current holder or an admin may cancel.
    HolderOrAdmin,
}

impl CancelPolicy {
    /// Configuration spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unrestricted => "unrestricted",
            Self::HolderOrAdmin => "holder-or-admin",
        }
    }
}

impl fmt::Display for CancelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CancelPolicy {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unrestricted" => Ok(Self::Unrestricted),
            "holder-or-admin" | "holder_or_admin" => Ok(Self::HolderOrAdmin),
            other => Err(BookingError::Validation(format!(
                "Unknown cancel policy '{other}' (expected 'unrestricted' or 'holder-or-admin')"
            ))),
        }
    }
}

/// Executes claim and release transitions against a [`SlotStore`].
pub struct BookingCoordinator<S> {
    store: Arc<S>,
    policy: CancelPolicy,
}

impl<S> Clone for BookingCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
        }
    }
}

impl<S: SlotStore> BookingCoordinator<S> {
    /// Create a coordinator with the unrestricted cancel policy.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self {
            store,
            policy: CancelPolicy::Unrestricted,
        }
    }

    /// Select the cancel policy used by [`release`](Self::release).
    #[must_use]
    pub const fn with_cancel_policy(mut self, policy: CancelPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Book `slot_id` for `identity`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the slot does not exist
    /// - `AlreadyBooked` if anyone (including `identity`) already holds it
    /// - `Unavailable` if the row lock could not be obtained in time
    #[tracing::instrument(skip(self, identity), fields(slot_id = %slot_id, user_id = %identity.user_id))]
    pub async fn claim(&self, slot_id: SlotId, identity: &Identity) -> Result<TimeSlot> {
        let started = Instant::now();
        let result = self.claim_locked(slot_id, identity).await;

        let outcome = match &result {
            Ok(_) => "booked",
            Err(BookingError::AlreadyBooked(_)) => "already_booked",
            Err(BookingError::NotFound { .. }) => "not_found",
            Err(_) => "error",
        };
        metrics::counter!("slotbook_claims_total", "outcome" => outcome).increment(1);
        metrics::histogram!("slotbook_claim_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        result
    }

    async fn claim_locked(&self, slot_id: SlotId, identity: &Identity) -> Result<TimeSlot> {
        let mut tx = self.store.begin().await?;

        let slot = match tx.fetch_for_update(slot_id).await {
            Ok(slot) => slot,
            Err(error) => return Err(abort(tx, error).await),
        };

        if let Some(holder) = &slot.holder {
            tracing::warn!(holder_id = %holder.user_id, "Claim lost: slot already booked");
            return Err(abort(tx, BookingError::AlreadyBooked(slot_id)).await);
        }

        if let Err(error) = tx.set_holder(slot_id, Some(identity)).await {
            return Err(abort(tx, error).await);
        }
        tx.commit().await?;

        tracing::info!("Slot booked");
        Ok(TimeSlot {
            holder: Some(Holder::from(identity)),
            ..slot
        })
    }

    /// Clear the holder of `slot_id` for any caller.
    ///
    /// Cancelling an available slot succeeds and changes nothing. No row lock
    /// is taken: clearing is idempotent, so concurrent cancels converge.
    ///
    /// # Errors
    ///
    /// `NotFound` if the slot does not exist.
    #[tracing::instrument(skip(self), fields(slot_id = %slot_id))]
    pub async fn cancel(&self, slot_id: SlotId) -> Result<TimeSlot> {
        let slot = self.store.clear_holder(slot_id).await?;
        metrics::counter!("slotbook_cancellations_total").increment(1);
        tracing::info!("Booking cancelled");
        Ok(slot)
    }

    /// Clear the holder of `slot_id` if `viewer` is the holder or an admin.
    ///
    /// Runs under the row lock so the holder check and the write see the same
    /// state. An available slot is released idempotently.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` for anonymous viewers
    /// - `NotFound` if the slot does not exist
    /// - `PermissionDenied` if someone else holds the slot and the viewer is
    ///   not an admin
    #[tracing::instrument(skip(self, viewer), fields(slot_id = %slot_id, user_id = ?viewer.user_id()))]
    pub async fn cancel_restricted(&self, slot_id: SlotId, viewer: &Viewer) -> Result<TimeSlot> {
        let identity = viewer.require_authenticated()?;
        let mut tx = self.store.begin().await?;

        let slot = match tx.fetch_for_update(slot_id).await {
            Ok(slot) => slot,
            Err(error) => return Err(abort(tx, error).await),
        };

        match &slot.holder {
            None => {
                tx.rollback().await?;
                tracing::debug!("Slot already available");
                Ok(slot)
            }
            Some(holder) if slot.is_held_by(identity) || identity.is_admin => {
                if let Err(error) = tx.set_holder(slot_id, None).await {
                    return Err(abort(tx, error).await);
                }
                tx.commit().await?;
                metrics::counter!("slotbook_cancellations_total").increment(1);
                tracing::info!(holder_id = %holder.user_id, "Booking cancelled");
                Ok(TimeSlot {
                    holder: None,
                    ..slot
                })
            }
            Some(holder) => {
                tracing::warn!(holder_id = %holder.user_id, "Cancel denied: not the holder");
                Err(abort(
                    tx,
                    BookingError::PermissionDenied(
                        "You can only cancel your own bookings".into(),
                    ),
                )
                .await)
            }
        }
    }

    /// Cancel according to the configured [`CancelPolicy`].
    ///
    /// # Errors
    ///
    /// See [`cancel`](Self::cancel) and [`cancel_restricted`](Self::cancel_restricted).
    pub async fn release(&self, slot_id: SlotId, viewer: &Viewer) -> Result<TimeSlot> {
        match self.policy {
            CancelPolicy::Unrestricted => self.cancel(slot_id).await,
            CancelPolicy::HolderOrAdmin => self.cancel_restricted(slot_id, viewer).await,
        }
    }
}

/// Roll back and hand back the error that caused the abort.
async fn abort<T: SlotTransaction>(tx: T, cause: BookingError) -> BookingError {
    if let Err(rollback_error) = tx.rollback().await {
        tracing::warn!(error = %rollback_error, "Rollback failed after aborted booking transition");
    }
    cause
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_policy_parses_config_spellings() {
        assert_eq!("unrestricted".parse::<CancelPolicy>(), Ok(CancelPolicy::Unrestricted));
        assert_eq!(
            " Holder-Or-Admin ".parse::<CancelPolicy>(),
            Ok(CancelPolicy::HolderOrAdmin)
        );
        assert!(matches!(
            "owner".parse::<CancelPolicy>(),
            Err(BookingError::Validation(_))
        ));
    }

    #[test]
    fn default_policy_is_unrestricted() {
        assert_eq!(CancelPolicy::default(), CancelPolicy::Unrestricted);
        assert_eq!(CancelPolicy::HolderOrAdmin.to_string(), "holder-or-admin");
    }
}
