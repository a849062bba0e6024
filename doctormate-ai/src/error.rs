use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors surfaced to HTTP callers as `{"detail": ...}`.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("No file uploaded: expected a multipart field named 'file'")]
    MissingFile,

    /// The multipart body could not be read; `status` is the one axum assigned.
    #[error("{detail}")]
    Upload { status: StatusCode, detail: String },

    #[error("Could not process image: {0}")]
    Image(String),

    #[error("Model inference failed: {0}")]
    Inference(String),

    #[error("Gemini API error: {0}")]
    Provider(String),

    #[error("Gemini API error: model reply is not valid JSON: {0}")]
    MalformedReply(String),
}

impl AnalysisError {
    pub fn status(&self) -> StatusCode {
        match self {
            AnalysisError::InvalidInput(_) | AnalysisError::MissingFile => StatusCode::BAD_REQUEST,
            AnalysisError::Upload { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Analysis failed");
        } else {
            warn!(error = %self, "Rejected request");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
