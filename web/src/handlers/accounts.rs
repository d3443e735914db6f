//! Registration, login and the current user.

use super::Message;
use crate::error::AppError;
use crate::extractors::CurrentViewer;
use crate::state::AppState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use slotbook_core::{Credentials, CurrentUser, LoginOutcome, SlotStore, UserStore};

/// `POST /api/register/` with `{"username": ..., "password": ...}`
///
/// # Errors
///
/// 400 for missing fields or a taken username.
pub async fn register<S, U>(
    State(state): State<AppState<S, U>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>), AppError>
where
    S: SlotStore + 'static,
    U: UserStore + 'static,
{
    let Json(credentials) = body?;
    state.accounts.register(&credentials).await?;
    Ok((
        StatusCode::CREATED,
        Json(Message::new("User registered successfully")),
    ))
}

/// `POST /api/login/` with `{"username": ..., "password": ...}`
///
/// # Errors
///
/// 400 for missing fields, 401 for bad credentials.
pub async fn login<S, U>(
    State(state): State<AppState<S, U>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<LoginOutcome>, AppError>
where
    S: SlotStore + 'static,
    U: UserStore + 'static,
{
    let Json(credentials) = body?;
    let outcome = state.accounts.login(&credentials).await?;
    Ok(Json(outcome))
}

/// `GET /api/current_user/`
///
/// # Errors
///
/// 401 when anonymous.
pub async fn current_user<S, U>(
    State(state): State<AppState<S, U>>,
    CurrentViewer(viewer): CurrentViewer,
) -> Result<Json<CurrentUser>, AppError>
where
    S: SlotStore + 'static,
    U: UserStore + 'static,
{
    let user = state.accounts.current_user(&viewer)?;
    Ok(Json(user))
}
