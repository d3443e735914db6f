//! Custom Axum extractors.
//!
//! - [`CurrentViewer`]: anonymous or token-authenticated caller
//! - [`AuthenticatedUser`]: like `CurrentViewer`, but rejects anonymous callers
//!
//! # Authentication
//!
//! The `Authorization` header carries an opaque token under either the
//! `Bearer` or `Token` scheme. A missing header (or another scheme) yields an
//! anonymous viewer; a recognised scheme with an unknown token is a 401.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use slotbook_core::{Identity, SlotStore, UserStore, Viewer};

const AUTH_SCHEMES: [&str; 2] = ["Bearer", "Token"];

/// Pull the token out of an `Authorization` header value.
///
/// Returns `None` when the header is absent or uses another scheme.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    AUTH_SCHEMES
        .iter()
        .any(|known| scheme.eq_ignore_ascii_case(known))
        .then(|| token.trim())
}

/// The caller, resolved from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct CurrentViewer(pub Viewer);

#[async_trait]
impl<S, U> FromRequestParts<AppState<S, U>> for CurrentViewer
where
    S: SlotStore + 'static,
    U: UserStore + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S, U>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(Viewer::Anonymous));
        };
        if token.is_empty() {
            return Err(AppError::unauthorized("Invalid token header. No credentials provided."));
        }

        let identity = state.accounts.authenticate(token).await?;
        tracing::debug!(user_id = %identity.user_id, "Authenticated request");
        Ok(Self(Viewer::User(identity)))
    }
}

/// An authenticated caller; anonymous requests are rejected with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

#[async_trait]
impl<S, U> FromRequestParts<AppState<S, U>> for AuthenticatedUser
where
    S: SlotStore + 'static,
    U: UserStore + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S, U>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentViewer(viewer) = CurrentViewer::from_request_parts(parts, state).await?;
        let identity = viewer.require_authenticated()?.clone();
        Ok(Self(identity))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header_value: Option<&str>) -> Parts {
        let mut builder = Request::builder();
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).expect("Valid request").into_parts().0
    }

    #[test]
    fn bearer_and_token_schemes_are_accepted() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("Token abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("token  abc "))), Some("abc"));
    }

    #[test]
    fn other_schemes_and_missing_header_are_anonymous() {
        assert_eq!(bearer_token(&parts_with(None)), None);
        assert_eq!(bearer_token(&parts_with(Some("Basic dXNlcjpwYXNz"))), None);
    }

    #[test]
    fn scheme_without_token_yields_empty() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer"))), Some(""));
    }
}
