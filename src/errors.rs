use crate::services::image_service::{GatewayError, ValidationError};
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use std::fmt;

/// HTTP-facing error: a status plus the JSON body fields clients read.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    /// Names of absent settings, for configuration failures.
    pub missing: Option<Vec<String>>,
    /// Underlying error text, for store failures.
    pub details: Option<String>,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            missing: None,
            details: None,
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_missing(mut self, missing: Vec<String>) -> Self {
        self.missing = Some(missing);
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = Map::new();
        body.insert("error".into(), json!(self.message));
        if let Some(missing) = self.missing {
            body.insert("missing".into(), json!(missing));
        }
        if let Some(details) = self.details {
            body.insert("details".into(), json!(details));
        }

        (self.status, Json(Value::Object(body))).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        let message = err.to_string();
        match err {
            GatewayError::NotConfigured { missing } => {
                tracing::error!(?missing, "request rejected: server not configured");
                AppError::internal(message)
                    .with_missing(missing.into_iter().map(String::from).collect())
            }
            GatewayError::Validation(inner) => {
                tracing::warn!(error = %inner, "upload rejected");
                let status = match inner {
                    ValidationError::MissingImage => StatusCode::BAD_REQUEST,
                    ValidationError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                };
                AppError::new(status, message)
            }
            GatewayError::Store { operation, source } => {
                tracing::error!(%operation, error = %source, "object store call failed");
                AppError::internal(message).with_details(source.to_string())
            }
            GatewayError::MalformedTag { operation, key } => {
                tracing::error!(%operation, key = %key, "undecodable keywords tag");
                AppError::internal(message)
                    .with_details(format!("keywords tag on `{}` is not valid percent-encoded UTF-8", key))
            }
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        tracing::warn!(error = %err, "malformed multipart body");
        AppError::new(err.status(), err.body_text())
    }
}
