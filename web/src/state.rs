//! Application state for Axum handlers.
//!
//! [`AppState`] owns one instance of each core service. All services share
//! the same stores through `Arc`s, so cloning the state per request is cheap.

use metrics_exporter_prometheus::PrometheusHandle;
use slotbook_core::{
    AccountService, AvailabilityProjector, BookingCoordinator, CancelPolicy, SlotProvisioner,
    SlotStore, UserStore,
};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// # Examples
///
/// ```ignore
/// let state = AppState::new(Arc::new(slot_store), Arc::new(user_store))
///     .with_cancel_policy(CancelPolicy::HolderOrAdmin)
///     .with_metrics(prometheus_handle);
/// let app = slotbook_web::router(state);
/// ```
pub struct AppState<S, U> {
    /// Slot store, used directly by the readiness probe
    pub slots: Arc<S>,
    /// Claim and release
    pub booking: BookingCoordinator<S>,
    /// Weekly and admin listings
    pub availability: AvailabilityProjector<S>,
    /// Admin slot creation
    pub provisioner: SlotProvisioner<S>,
    /// Registration, login and token resolution
    pub accounts: AccountService<U>,
    /// Prometheus renderer for `/metrics`, if a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl<S, U> Clone for AppState<S, U> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
            booking: self.booking.clone(),
            availability: self.availability.clone(),
            provisioner: self.provisioner.clone(),
            accounts: self.accounts.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<S: SlotStore, U: UserStore> AppState<S, U> {
    /// Wire every service to the given stores, with the unrestricted cancel policy.
    #[must_use]
    pub fn new(slots: Arc<S>, users: Arc<U>) -> Self {
        Self {
            booking: BookingCoordinator::new(Arc::clone(&slots)),
            availability: AvailabilityProjector::new(Arc::clone(&slots)),
            provisioner: SlotProvisioner::new(Arc::clone(&slots)),
            accounts: AccountService::new(users),
            slots,
            metrics: None,
        }
    }

    /// Select how `DELETE /api/slots/:id/cancel/` is authorised.
    #[must_use]
    pub fn with_cancel_policy(mut self, policy: CancelPolicy) -> Self {
        self.booking = self.booking.with_cancel_policy(policy);
        self
    }

    /// Expose a Prometheus recorder at `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
