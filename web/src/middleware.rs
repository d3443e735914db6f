//! Request tracking middleware.
//!
//! Every request gets a correlation id: the client's `X-Correlation-ID` if it
//! sent one, a fresh UUID otherwise. The id is echoed on the response and
//! recorded on the request span, so one booking attempt can be followed
//! through the logs.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/api/slots/", get(list_week))
//!     .layer(request_tracking_layer());
//! ```

use axum::http::{HeaderName, Request};
use tower::ServiceBuilder;
use tower::layer::util::{Identity, Stack};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;

/// Header carrying the correlation id.
pub const CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

type MakeSpan = fn(&Request<axum::body::Body>) -> Span;

/// Layer stack produced by [`request_tracking_layer`].
pub type RequestTrackingLayer = Stack<
    PropagateRequestIdLayer,
    Stack<
        TraceLayer<SharedClassifier<ServerErrorsAsFailures>, MakeSpan>,
        Stack<SetRequestIdLayer<MakeRequestUuid>, Identity>,
    >,
>;

/// Assign, trace and echo the correlation id.
///
/// Order matters: the id is set before the trace span is created, so the
/// span can record it, and propagated to the response last.
#[must_use]
pub fn request_tracking_layer() -> RequestTrackingLayer {
    ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(CORRELATION_ID_HEADER, MakeRequestUuid))
        .layer(TraceLayer::new_for_http().make_span_with(request_span as MakeSpan))
        .layer(PropagateRequestIdLayer::new(CORRELATION_ID_HEADER))
        .into_inner()
}

fn request_span<B>(request: &Request<B>) -> Span {
    let correlation_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "http_request",
        correlation_id = %correlation_id,
        method = %request.method(),
        uri = %request.uri(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(request_tracking_layer())
    }

    #[tokio::test]
    async fn echoes_client_correlation_id() {
        let request = Request::builder()
            .uri("/")
            .header(CORRELATION_ID_HEADER, "abc-123")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.headers()[CORRELATION_ID_HEADER], "abc-123");
    }

    #[tokio::test]
    async fn generates_correlation_id_when_absent() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();

        let id = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("correlation id header")
            .to_str()
            .unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }
}
