//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode};
use slotbook_core::{SlotStore, UserStore};

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies (database, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness check: the slot store must answer a ping.
///
/// # Status Codes
///
/// - 200 OK: store reachable
/// - 503 Service Unavailable: store unreachable
///
/// # Errors
///
/// Returns the store's failure mapped through [`AppError`].
pub async fn readiness_check<S, U>(
    State(state): State<AppState<S, U>>,
) -> Result<(StatusCode, &'static str), AppError>
where
    S: SlotStore + 'static,
    U: UserStore + 'static,
{
    state.slots.ping().await?;
    Ok((StatusCode::OK, "ready"))
}

/// Prometheus text exposition of the installed recorder.
///
/// Responds 404 when the server runs without a recorder.
#[allow(clippy::unused_async)]
pub async fn metrics<S, U>(State(state): State<AppState<S, U>>) -> (StatusCode, String)
where
    S: SlotStore + 'static,
    U: UserStore + 'static,
{
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
