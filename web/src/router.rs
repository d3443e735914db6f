//! Route table.

use crate::handlers::{accounts, admin, health, slots};
use crate::middleware::request_tracking_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};
use slotbook_core::{SlotStore, UserStore};

/// Build the complete application router.
///
/// Trailing slashes are part of the API paths.
pub fn router<S, U>(state: AppState<S, U>) -> Router
where
    S: SlotStore + 'static,
    U: UserStore + 'static,
{
    let api = Router::new()
        .route("/api/slots/", get(slots::list_week::<S, U>))
        .route("/api/slots/:id/book/", post(slots::book::<S, U>))
        .route("/api/slots/:id/cancel/", delete(slots::cancel::<S, U>))
        .route("/api/admin/slots/", get(admin::list_slots::<S, U>))
        .route("/api/admin/slots/add/", post(admin::create_slot::<S, U>))
        .route("/api/register/", post(accounts::register::<S, U>))
        .route("/api/login/", post(accounts::login::<S, U>))
        .route("/api/current_user/", get(accounts::current_user::<S, U>));

    let ops = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check::<S, U>))
        .route("/metrics", get(health::metrics::<S, U>));

    api.merge(ops)
        .layer(request_tracking_layer())
        .with_state(state)
}
