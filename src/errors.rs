// src/errors.rs
use axum::{
    extract::rejection::{FormRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::database::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{context}: {source}")]
    Database {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Multipart error: {0}")]
    Multipart(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid mime type")]
    InvalidMimeType,

    #[error("Image too large")]
    ImageTooLarge,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Post not found!")]
    PostNotFound,

    #[error("Image not found")]
    ImageNotFound,

    #[error("Duplicate key error")]
    DuplicateKey,

    #[error("You are not authenticated!")]
    NotAuthenticated,

    #[error("Invalid authentication credentials!")]
    InvalidCredentials,

    #[error("Not authorised!")]
    NotAuthorised,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database { context, source } => {
                tracing::error!(error = %source, "{}", context);
                (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
            }
            AppError::Io { context, source } => {
                tracing::error!(error = %source, "{}", context);
                (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
            }
            AppError::Multipart(_) => (StatusCode::BAD_REQUEST, "Invalid multipart data".to_string()),
            AppError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "Invalid request body".to_string()),
            AppError::InvalidMimeType => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::ImageTooLarge => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PostNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::ImageNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::DuplicateKey => (
                StatusCode::CONFLICT,
                "Invalid authentication credentials!".to_string(),
            ),
            AppError::NotAuthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::NotAuthorised => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::TokenError(msg) => {
                tracing::error!("Failed to issue token: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string())
            }
            AppError::ConfigurationError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
            ),
        };

        let body = Json(json!({
            "message": message,
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

impl From<axum_extra::extract::multipart::MultipartError> for AppError {
    fn from(err: axum_extra::extract::multipart::MultipartError) -> Self {
        AppError::Multipart(err.to_string())
    }
}

impl From<axum_extra::extract::multipart::MultipartRejection> for AppError {
    fn from(err: axum_extra::extract::multipart::MultipartRejection) -> Self {
        AppError::Multipart(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::InvalidBody(err.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(err: QueryRejection) -> Self {
        AppError::InvalidBody(err.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(err: FormRejection) -> Self {
        AppError::InvalidBody(err.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field))
                })
            })
            .collect::<Vec<_>>()
            .join(", ");
        AppError::ValidationError(message)
    }
}

// Helper conversion functions
impl AppError {
    /// Wraps a store failure with the fixed message returned to the client.
    pub fn database(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| AppError::Database { context, source }
    }

    pub fn io(context: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| AppError::Io { context, source }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
