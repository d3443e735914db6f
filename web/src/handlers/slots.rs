//! Weekly listing, claim and cancel.

use super::Message;
use crate::error::AppError;
use crate::extractors::{AuthenticatedUser, CurrentViewer};
use crate::state::AppState;
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};
use serde::Deserialize;
use slotbook_core::{
    BookingError, CategoryFilter, DaySlots, SlotId, SlotStore, UserStore, schedule::parse_date,
};

/// Query string of `GET /api/slots/`.
#[derive(Debug, Default, Deserialize)]
pub struct WeekQuery {
    /// First day of the week, `YYYY-MM-DD`
    pub week_start: Option<String>,
    /// Category name, or `All`
    pub category: Option<String>,
}

/// `GET /api/slots/?week_start=YYYY-MM-DD&category=<name|All>`
///
/// # Errors
///
/// 400 if `week_start` is missing or malformed.
pub async fn list_week<S, U>(
    State(state): State<AppState<S, U>>,
    CurrentViewer(viewer): CurrentViewer,
    query: Result<Query<WeekQuery>, QueryRejection>,
) -> Result<Json<Vec<DaySlots>>, AppError>
where
    S: SlotStore + 'static,
    U: UserStore + 'static,
{
    let Query(query) = query?;
    let raw_start = query
        .week_start
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| BookingError::Validation("week_start is required".into()))?;
    let week_start = parse_date(raw_start)?;
    let category = CategoryFilter::from_param(query.category.as_deref());

    let week = state.availability.week(week_start, category, &viewer).await?;
    Ok(Json(week))
}

/// `POST /api/slots/:id/book/`
///
/// # Errors
///
/// 401 when anonymous, 404 for an unknown slot, 409 when already booked.
pub async fn book<S, U>(
    State(state): State<AppState<S, U>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    slot_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Message>, AppError>
where
    S: SlotStore + 'static,
    U: UserStore + 'static,
{
    let Path(slot_id) = slot_id?;
    state.booking.claim(SlotId::new(slot_id), &identity).await?;
    Ok(Json(Message::new("Slot booked successfully")))
}

/// `DELETE /api/slots/:id/cancel/`
///
/// Authorisation depends on the configured cancel policy.
///
/// # Errors
///
/// 404 for an unknown slot; under the restricted policy also 401 and 403.
pub async fn cancel<S, U>(
    State(state): State<AppState<S, U>>,
    CurrentViewer(viewer): CurrentViewer,
    slot_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Message>, AppError>
where
    S: SlotStore + 'static,
    U: UserStore + 'static,
{
    let Path(slot_id) = slot_id?;
    state.booking.release(SlotId::new(slot_id), &viewer).await?;
    Ok(Json(Message::new("Booking cancelled")))
}
