use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::jwt::Identity;
use crate::error::ApiError;
use crate::histories::dto::{
    CheckOutRequest, CreateHistoricRequest, HistoricResponse, HistoryListQuery,
    UpdateHistoricRequest,
};
use crate::histories::repo::{Coordinate, Historic};
use crate::state::AppState;

#[instrument(skip(state, identity))]
pub async fn list_histories(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<HistoryListQuery>,
) -> Result<Json<Vec<HistoricResponse>>, ApiError> {
    query.validate()?;

    let rows =
        Historic::list_by_user(&state.db, identity.id, query.status, query.skip, query.take)
            .await?;

    let mut out = Vec::with_capacity(rows.len());
    for historic in rows {
        out.push(with_coords(&state.db, historic).await?);
    }
    Ok(Json(out))
}

#[instrument(skip(state, _identity))]
pub async fn get_historic(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoricResponse>, ApiError> {
    let historic = Historic::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("historic"))?;
    Ok(Json(with_coords(&state.db, historic).await?))
}

#[instrument(skip(state, identity, payload))]
pub async fn create_historic(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateHistoricRequest>,
) -> Result<StatusCode, ApiError> {
    payload.validate()?;

    // Check-then-create: two concurrent creates for the same plate can both
    // pass this check. Accepted as-is.
    if Historic::find_departed_by_plate(&state.db, &payload.license_plate)
        .await?
        .is_some()
    {
        warn!(license_plate = %payload.license_plate, "plate already in use");
        return Err(ApiError::PlateAlreadyInUse);
    }

    let historic = Historic::create(
        &state.db,
        identity.id,
        &payload.license_plate,
        &payload.description,
        &payload.coords,
    )
    .await?;

    info!(historic_id = %historic.id, license_plate = %historic.license_plate, "vehicle checked out");
    Ok(StatusCode::CREATED)
}

#[instrument(skip(state, identity, payload))]
pub async fn update_historic(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateHistoricRequest>,
) -> Result<StatusCode, ApiError> {
    payload.validate()?;

    let updated = Historic::update(
        &state.db,
        id,
        identity.id,
        &payload.license_plate,
        &payload.description,
        &payload.coords,
    )
    .await?;
    if !updated {
        return Err(ApiError::NotFound("historic"));
    }

    info!(historic_id = %id, "historic updated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _identity, payload))]
pub async fn check_out(
    State(state): State<AppState>,
    _identity: Identity,
    Json(payload): Json<CheckOutRequest>,
) -> Result<StatusCode, ApiError> {
    payload.validate()?;

    if !Historic::check_out(&state.db, payload.id, &payload.coords).await? {
        return Err(ApiError::NotFound("historic"));
    }

    info!(historic_id = %payload.id, "vehicle checked in");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _identity))]
pub async fn delete_historic(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !Historic::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("historic"));
    }
    info!(historic_id = %id, "historic deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, identity))]
pub async fn get_car_in_use(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Option<HistoricResponse>>, ApiError> {
    let active = Historic::find_departed_by_user(&state.db, identity.id).await?;
    let response = match active {
        Some(historic) => Some(with_coords(&state.db, historic).await?),
        None => None,
    };
    Ok(Json(response))
}

async fn with_coords(db: &PgPool, historic: Historic) -> Result<HistoricResponse, ApiError> {
    let coords = Coordinate::list_for_historic(db, historic.id).await?;
    Ok(HistoricResponse::from_parts(historic, coords))
}
