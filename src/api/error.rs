use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde_json::json;
use thiserror::Error;

use crate::charts::ChartError;
use crate::loader::LoadError;
use crate::processing::ProcessingError;
use crate::report::ReportError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No data loaded. Use /load or /upload first.")]
    NoData,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Load(#[from] LoadError),
    #[error("{0}")]
    Processing(#[from] ProcessingError),
    #[error("{0}")]
    Chart(#[from] ChartError),
    #[error("{0}")]
    Report(#[from] ReportError),
    #[error("invalid upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Multipart(err) => err.status(),
            ApiError::NoData
            | ApiError::BadRequest(_)
            | ApiError::Load(_)
            | ApiError::Processing(_)
            | ApiError::Chart(_)
            | ApiError::Report(ReportError::Chart(_)) => StatusCode::BAD_REQUEST,
            ApiError::Report(_) | ApiError::Io(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {}", self);
        } else {
            warn!("request rejected ({}): {}", status, self);
        }

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
