//!
//! # Custom Error Handling
//!
//! This module defines `AppError`, the single error type that flows from the
//! repositories through the services to the HTTP handlers.
//!
//! Client-facing variants (`Validation`, `BadRequest`, `Unauthorized`, `Forbidden`,
//! `NotFound`) carry a message that is safe to show to the caller. Infrastructure
//! variants (`InternalServerError`, `DatabaseError`) carry internal detail that is
//! logged but never serialized: the caller only sees a generic message.
//!
//! `AppError` implements `actix_web::error::ResponseError`, so handlers can return
//! `Result<_, AppError>` and the failure is rendered as the uniform `fail` envelope.

use std::collections::BTreeMap;

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use validator::ValidationErrors;

use crate::response::ApiResponse;

/// Message returned for every infrastructure failure.
pub const GENERIC_ERROR_MESSAGE: &str = "something went wrong, please try again later";
/// Message returned together with a per-field error map.
pub const VALIDATION_ERROR_MESSAGE: &str = "validation error";
/// Message returned when a request body, path or query cannot be decoded.
pub const MALFORMED_REQUEST_MESSAGE: &str =
    "fail to process your request, send correct data and try again";

/// Per-field validation messages, keyed by the request field name.
pub type FieldErrors = BTreeMap<String, String>;

/// Represents all possible errors that can occur within the application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Input failed declarative validation (HTTP 400 with field details).
    #[error("Validation Error: {0:?}")]
    Validation(FieldErrors),
    /// A domain rule rejected the request (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// Missing or invalid credentials (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Authenticated, but lacking the role the operation requires (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// The addressed resource does not exist (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// Unexpected server-side failure (HTTP 500). The message is logged, not returned.
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
    /// Database failure with repository context (HTTP 500). Logged, not returned.
    #[error("Database Error: {0}")]
    DatabaseError(String),
}

impl AppError {
    /// Wraps a driver error with the repository operation that produced it.
    pub fn database(context: &str, error: sqlx::Error) -> AppError {
        AppError::DatabaseError(format!("{}: {}", context, error))
    }

    /// Builds a validation error for a single field.
    pub fn field(field: &str, message: &str) -> AppError {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), message.to_string());
        AppError::Validation(errors)
    }

    fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::InternalServerError(_) | AppError::DatabaseError(_)
        )
    }

    /// The message that is safe to put on the wire.
    pub fn public_message(&self) -> &str {
        match self {
            AppError::Validation(_) => VALIDATION_ERROR_MESSAGE,
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => msg,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => GENERIC_ERROR_MESSAGE,
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects carrying the `fail` envelope.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if self.is_internal() {
            log::error!("{}", self);
        } else {
            log::warn!("request rejected ({}): {}", status.as_u16(), self);
        }

        let details = match self {
            AppError::Validation(fields) => Some(fields.clone()),
            _ => None,
        };
        HttpResponse::build(status).json(ApiResponse::<()>::fail(
            status,
            self.public_message(),
            details,
        ))
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes `NotFound`; everything else is a `DatabaseError`.
/// Repositories that need to tell constraint violations apart inspect the
/// error before converting it.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Flattens `validator::ValidationErrors` into one message per field.
///
/// The first failing rule of each field wins; rules without an explicit
/// message fall back to `"<field> is invalid"`.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let fields = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, errs)| {
                errs.first().map(|err| {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    (field.to_string(), message)
                })
            })
            .collect();
        AppError::Validation(fields)
    }
}

/// JWT encoding failures are server faults; verification goes through
/// `TokenIssuer::verify`, which classifies the failure itself.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::InternalServerError(format!("token processing failed: {}", error))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(format!("password hashing failed: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> AppError {
        AppError::InternalServerError(format!("image host request failed: {}", error))
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(error: actix_multipart::MultipartError) -> AppError {
        log::debug!("multipart decoding failed: {}", error);
        AppError::BadRequest(MALFORMED_REQUEST_MESSAGE.into())
    }
}
