use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use store::Store;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller, resolved from `Authorization: Bearer <token>`.
///
/// A missing or non-bearer header rejects with 401; a token that fails to
/// verify rejects with 403.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
}

impl<S: Store> FromRequestParts<AppState<S>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        let claims = state.tokens.verify(token)?;
        Ok(AuthUser { id: claims.sub })
    }
}
