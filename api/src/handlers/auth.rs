//! Registration, login and "who am I".

use axum::extract::State;
use axum::Form;
use axum::Json;

use promptgraph_db::users;

use crate::auth::{hash_password, mint_token, verify_password, CurrentUser};
use crate::dto::{LoginForm, RegisterRequest, TokenResponse, UserResponse};
use crate::error::{ApiError, Result};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<UserResponse>> {
    if users::get_by_email(&state.pool, &body.email).await?.is_some() {
        return Err(ApiError::Validation(
            "The user with this email already exists in the system.".to_string(),
        ));
    }

    let hashed =
        hash_password(&body.password).map_err(|e| ApiError::Internal(e.to_string()))?;
    let user = users::create(&state.pool, &body.email, &hashed).await?;
    Ok(Json(user.into()))
}

/// Accepts an OAuth2 password-flow form (`username`/`password`), matching
/// the original's `OAuth2PasswordRequestForm` dependency.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>> {
    let user = users::get_by_email(&state.pool, &form.username)
        .await?
        .filter(|u| verify_password(&form.password, &u.hashed_password))
        .ok_or(ApiError::AuthInvalid)?;

    if !user.is_active {
        return Err(ApiError::Validation("Inactive user".to_string()));
    }

    let access_token = mint_token(
        &user.email,
        &state.config.secret_key,
        &state.config.algorithm,
        state.config.access_token_expire_minutes,
    )
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}
