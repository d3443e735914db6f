//! Admin-only slot listing and creation.

use crate::error::AppError;
use crate::extractors::CurrentViewer;
use crate::state::AppState;
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;
use slotbook_core::{
    AdminSlotView, CreateSlotRequest, SlotFilter, SlotStore, SlotView, UserStore,
};

/// Query string of `GET /api/admin/slots/`.
#[derive(Debug, Default, Deserialize)]
pub struct AdminListQuery {
    /// Inclusive lower date bound
    pub date_from: Option<String>,
    /// Inclusive upper date bound
    pub date_to: Option<String>,
    /// Category name, or `All`
    pub category: Option<String>,
}

/// `GET /api/admin/slots/?date_from=&date_to=&category=`
///
/// # Errors
///
/// 401/403 for non-admins, 400 for a malformed date.
pub async fn list_slots<S, U>(
    State(state): State<AppState<S, U>>,
    CurrentViewer(viewer): CurrentViewer,
    query: Result<Query<AdminListQuery>, QueryRejection>,
) -> Result<Json<Vec<AdminSlotView>>, AppError>
where
    S: SlotStore + 'static,
    U: UserStore + 'static,
{
    viewer.require_admin()?;
    let Query(query) = query?;
    let filter = SlotFilter::from_params(
        query.date_from.as_deref(),
        query.date_to.as_deref(),
        query.category.as_deref(),
    )?;

    let slots = state.availability.admin_list(&viewer, &filter).await?;
    Ok(Json(slots))
}

/// `POST /api/admin/slots/add/`
///
/// Permission is checked before the body is looked at, so a non-admin
/// gets 403 even for a malformed request.
///
/// # Errors
///
/// 401/403 for non-admins, 400 for missing or malformed fields.
pub async fn create_slot<S, U>(
    State(state): State<AppState<S, U>>,
    CurrentViewer(viewer): CurrentViewer,
    body: Result<Json<CreateSlotRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SlotView>), AppError>
where
    S: SlotStore + 'static,
    U: UserStore + 'static,
{
    viewer.require_admin()?;
    let Json(request) = body?;

    let view = state.provisioner.create_slot(&viewer, request).await?;
    Ok((StatusCode::CREATED, Json(view)))
}
