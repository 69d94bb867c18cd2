use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::agent::stateless_llm::LlmError;

/// Errors surfaced by the HTTP layer
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request body: {0}")]
    BadRequest(String),

    #[error("Message is {size} bytes, the limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Request body is too large")]
    BodyTooLarge,

    /// Provider detail stays in the server log
    #[error("The model provider could not complete the request")]
    Upstream(#[from] LlmError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } | Self::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::BodyTooLarge;
        }
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
