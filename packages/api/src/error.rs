//! HTTP error type for the API.
//!
//! Every handler returns `Result<_, ApiError>`. The body is always
//! `{"message": "..."}`. Server-side failures are logged in full and answered
//! with a generic message.

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use store::{PlacementError, StoreError};
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::{PasswordError, TokenError};

pub const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Forbidden: You do not own this project")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken | ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(detail) => {
                error!(%detail, "Request failed");
                INTERNAL_MESSAGE.to_string()
            }
            other => {
                warn!(status = status.as_u16(), error = %other, "Request rejected");
                other.to_string()
            }
        };
        (status, Json(ErrorBody { message })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProjectNotFound(_) => ApiError::NotFound("Project"),
            StoreError::UserNotFound(_) => ApiError::NotFound("User"),
            StoreError::Forbidden => ApiError::Forbidden,
            StoreError::EmailTaken | StoreError::Invalid(_) => {
                ApiError::BadRequest(err.to_string())
            }
            StoreError::Placement(err) => ApiError::BadRequest(err.to_string()),
            StoreError::MalformedMapData(err) => {
                ApiError::BadRequest(format!("Map data is malformed: {err}"))
            }
            StoreError::Backend(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<PlacementError> for ApiError {
    fn from(err: PlacementError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Key(detail) => ApiError::Internal(detail),
            _ => ApiError::InvalidToken,
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// `Json` extractor whose rejections use the API's error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub type ApiResult<T> = Result<T, ApiError>;
