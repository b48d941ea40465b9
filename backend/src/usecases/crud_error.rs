use axum::http::StatusCode;
use crates::infra::db::postgres::errors::is_unique_violation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrudError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("you are not allowed to perform this action")]
    Forbidden,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CrudError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CrudError::NotFound(_) => StatusCode::NOT_FOUND,
            CrudError::Forbidden => StatusCode::FORBIDDEN,
            CrudError::Conflict(_) => StatusCode::CONFLICT,
            CrudError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CrudError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl CrudError {
    /// Repository failure where a unique constraint losing a race reads as a conflict.
    pub fn from_write(err: anyhow::Error, conflict: impl FnOnce() -> String) -> Self {
        if is_unique_violation(&err) {
            CrudError::Conflict(conflict())
        } else {
            CrudError::Internal(err)
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, CrudError>;
