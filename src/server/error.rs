use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::Error;

/// Body for every non-2xx response: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFileUploaded,
    #[error("No file selected")]
    NoFileSelected,
    #[error("{}", .0.body_text())]
    Upload(#[from] MultipartError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NoFileUploaded | ApiError::NoFileSelected | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            // Oversized bodies surface here as 413.
            ApiError::Upload(e) => e.status(),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidEncoding(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::NoFileUploaded.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(Error::from(String::from_utf8(vec![0xff]).unwrap_err()))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::Extraction("x".into())).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
