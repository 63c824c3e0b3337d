use axum::{
    extract::{FromRef, State},
    Json,
};
use tracing::{info, instrument, warn};

use crate::auth::dto::{LoginRequest, MeResponse, TokenResponse};
use crate::auth::jwt::{Identity, JwtKeys};
use crate::auth::password::verify_password;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::User;

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::InvalidCredentials
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.name, &user.email)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state, identity))]
pub async fn me(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<MeResponse>, ApiError> {
    // The token may outlive the user record; re-fetch instead of trusting
    // the claims.
    let user = User::find_by_id(&state.db, identity.id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(MeResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        photo: user.photo,
    }))
}
