use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::jwt::Identity;
use crate::auth::password::hash_password;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{
    CreateUserRequest, UpdatePhotoRequest, UpdateUserRequest, UserResponse, UserSummary,
};
use crate::users::repo::User;

#[instrument(skip(state, _identity))]
pub async fn list_users(
    State(state): State<AppState>,
    _identity: Identity,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

#[instrument(skip(state, _identity))]
pub async fn get_user(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(UserResponse::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<StatusCode, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let hash = hash_password(&payload.password)?;

    // The pre-check above races with concurrent signups; the unique index on
    // email is the backstop, so a violation here is still a duplicate.
    match User::create(&state.db, &payload.name, &payload.email, &hash).await {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "user created");
            Ok(StatusCode::CREATED)
        }
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "email already registered");
            Err(ApiError::DuplicateEmail)
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, _identity, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateUserRequest>,
) -> Result<StatusCode, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;

    if !User::update(&state.db, id, &payload.name, &payload.email).await? {
        return Err(ApiError::NotFound("user"));
    }
    info!(user_id = %id, "user updated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _identity))]
pub async fn delete_user(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    User::delete(&state.db, id).await?;
    info!(user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, identity, payload))]
pub async fn update_photo(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<UpdatePhotoRequest>,
) -> Result<StatusCode, ApiError> {
    User::set_photo(&state.db, identity.id, &payload.photo).await?;
    info!(user_id = %identity.id, "photo updated");
    Ok(StatusCode::NO_CONTENT)
}

fn is_unique_violation(e: &anyhow::Error) -> bool {
    e.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|db| matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation))
        .unwrap_or(false)
}
