//! Errors surfaced by the storage layer and the project service.

use thiserror::Error;
use uuid::Uuid;

use crate::placement::PlacementError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Project {0} not found")]
    ProjectNotFound(Uuid),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Forbidden: you do not own this project")]
    Forbidden,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error("Map data is malformed: {0}")]
    MalformedMapData(#[from] serde_json::Error),

    /// Failure in the underlying storage backend.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
