// src/handlers/auth.rs

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    db::DynStore,
    error::AppError,
    models::user::LoginRequest,
    utils::{
        hash::verify_password,
        jwt::{Claims, sign_jwt},
    },
};

/// Authenticates a user and returns a JWT token.
///
/// Unknown email and wrong password produce the same 401 so the endpoint does
/// not reveal which accounts exist.
pub async fn login(
    State(store): State<DynStore>,
    State(config): State<Config>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    let invalid = || AppError::AuthError("Invalid email or password".to_string());

    let user = store.find_user_by_email(&email).await?.ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password)? {
        tracing::warn!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    let token = sign_jwt(user.id, user.role, &config.jwt_secret, config.jwt_expiration)?;
    tracing::info!("User {} logged in as {}", user.id, user.role);

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "role": user.role
    })))
}

/// Returns the caller's own user record.
pub async fn me(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let actor = claims.actor()?;

    let user = store
        .find_user(actor.id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
