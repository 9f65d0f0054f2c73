use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use shared::ErrorResponse;
use std::path::PathBuf;

use crate::imaging::upload::UploadError;
use crate::prediction_log::LogError;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid model artifact {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Model columns {found:?} do not match the training order {expected:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("Invalid model artifact: {0}")]
    Invalid(String),
    #[error("Model returned {got} outputs, expected {expected}")]
    OutputShape { expected: usize, got: usize },
    #[error("Unsupported model artifact {}", .0.display())]
    Unsupported(PathBuf),
    #[error("Model backend unavailable: {0}")]
    BackendUnavailable(String),
    #[cfg(feature = "torch")]
    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),
    #[error("Inference worker failed: {0}")]
    Worker(String),
}

impl From<actix_web::error::BlockingError> for ModelError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        ModelError::Worker(err.to_string())
    }
}

/// Request-level failure of the JSON prediction endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Log(#[from] LogError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Model(_) | ApiError::Log(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_errors_are_client_errors() {
        let err = ApiError::from(UploadError::MissingFile);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "No se envió el archivo con key 'file'");
    }

    #[test]
    fn model_errors_are_server_errors() {
        let err = ApiError::from(ModelError::OutputShape {
            expected: 2,
            got: 3,
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
