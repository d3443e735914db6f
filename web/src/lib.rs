//! HTTP surface of the slot booking service.
//!
//! Handlers are thin: extract the caller and input, call one core service,
//! map the result. All booking rules live in `slotbook-core`.
//!
//! # Request Flow
//!
//! 1. **Correlation id** assigned and recorded on the request span
//! 2. **Viewer** resolved from the `Authorization` header
//! 3. **Input** parsed from the path, query or JSON body
//! 4. **Service** call on [`AppState`]
//! 5. **Result** rendered as JSON, errors through [`AppError`]
//!
//! # Example
//!
//! ```ignore
//! use slotbook_web::{AppState, router};
//! use std::sync::Arc;
//!
//! let state = AppState::new(Arc::new(slot_store), Arc::new(user_store));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router(state)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::AppError;
pub use extractors::{AuthenticatedUser, CurrentViewer};
pub use handlers::Message;
pub use middleware::{CORRELATION_ID_HEADER, request_tracking_layer};
pub use router::router;
pub use state::AppState;
