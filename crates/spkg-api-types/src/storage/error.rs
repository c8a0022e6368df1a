use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::io;
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid filename")]
    InvalidFilename(String),
    #[error("Failed to save file: {0:#}")]
    ServiceError(#[from] anyhow::Error),
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        Self::ServiceError(e.into())
    }
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        let code = match &self {
            Self::InvalidFilename(filename) => {
                tracing::warn!(?filename, "Rejected upload with an unusable filename");
                StatusCode::BAD_REQUEST
            }
            Self::ServiceError(error) => {
                tracing::error!(?error, "Encountered service error in storage operation");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (code, self.to_string()).into_response()
    }
}
