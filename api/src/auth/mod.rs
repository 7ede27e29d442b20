//! Password hashing and bearer-token mint/decode: opaque services exposing
//! `hash`, `verify`, `mint(subject, ttl)`, `decode(token)`.

mod jwt;
mod password;

pub use jwt::{decode_token, mint_token, Claims};
pub use password::{hash_password, verify_password};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use promptgraph_core::model::User;

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor that decodes the bearer token, loads the user and rejects
/// inactive accounts — the equivalent of `get_current_active_user` in the
/// FastAPI original.
pub struct CurrentUser(pub User);

#[async_trait::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::AuthRequired)?;
        let token = header.strip_prefix("Bearer ").ok_or(ApiError::AuthRequired)?;

        let claims = decode_token(token, &state.config.secret_key, &state.config.algorithm)
            .map_err(|_| ApiError::AuthInvalid)?;

        let user = promptgraph_db::users::get_by_email(&state.pool, &claims.sub)
            .await
            .map_err(ApiError::from)?
            .ok_or(ApiError::AuthInvalid)?;

        if !user.is_active {
            return Err(ApiError::Validation("inactive user".to_string()));
        }

        Ok(CurrentUser(user))
    }
}
