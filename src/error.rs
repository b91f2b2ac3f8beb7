//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used by every HTTP handler.
//! Domain errors raised by the auth core (`TokenError`, `AuthError`) and by the stores
//! (`StoreError`) are translated into `AppError` exactly once, at the HTTP boundary.
//!
//! `AppError` implements `actix_web::error::ResponseError`, so handlers can return
//! `Result<_, AppError>` and have it rendered as the JSON error envelope
//! `{"success": false, "message": ...}`. Internal failures are logged with their detail
//! and answered with a generic message only.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;
use validator::ValidationErrors;

use crate::auth::service::AuthError;
use crate::auth::token::TokenError;
use crate::response::ErrorBody;
use crate::store::StoreError;

/// Message returned to clients for every 5xx response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Represents all possible errors that can reach an HTTP response.
#[derive(Debug)]
pub enum AppError {
    /// Authentication is missing, invalid, or the credentials were wrong (HTTP 401).
    Unauthorized(String),
    /// The authenticated user may not act on the addressed resource (HTTP 403).
    Forbidden(String),
    /// Malformed request, e.g. an unparsable path id or JSON body (HTTP 400).
    BadRequest(String),
    /// A required field is missing or a field failed validation (HTTP 400).
    ValidationError(String),
    /// Username or email collides with an existing account (HTTP 400).
    AlreadyExists(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// Unexpected server-side failure such as hashing or signing (HTTP 500).
    InternalServerError(String),
    /// Failure reported by the database (HTTP 500).
    DatabaseError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::AlreadyExists(msg) => write!(f, "Already Exists: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl AppError {
    /// The message that is safe to show to the client.
    fn public_message(&self) -> &str {
        match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::ValidationError(msg)
            | AppError::AlreadyExists(msg)
            | AppError::NotFound(msg) => msg,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => INTERNAL_ERROR_MESSAGE,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) | AppError::ValidationError(_) | AppError::AlreadyExists(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::InternalServerError(detail) | AppError::DatabaseError(detail) = self {
            log::error!("{}", detail);
        }
        HttpResponse::build(self.status_code()).json(ErrorBody::new(self.public_message()))
    }
}

/// Store errors that reach a handler unmapped: `NotFound` keeps its meaning,
/// a uniqueness violation is a client error, anything else is internal.
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::NotFound => AppError::NotFound("Record not found".into()),
            StoreError::UniquenessViolation => {
                AppError::AlreadyExists("email or username already in use".into())
            }
            StoreError::Database(e) => AppError::DatabaseError(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        match error {
            AuthError::Validation(msg) => AppError::ValidationError(msg),
            AuthError::AlreadyExists => AppError::AlreadyExists(error.to_string()),
            AuthError::InvalidCredentials => AppError::Unauthorized(error.to_string()),
            AuthError::Internal(detail) => AppError::InternalServerError(detail),
        }
    }
}

/// Any token failure is reported to the client as one generic 401 so that
/// signature probing learns nothing. Signing failures are internal.
impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        match error {
            TokenError::Encoding(detail) => AppError::InternalServerError(detail),
            _ => AppError::Unauthorized(crate::auth::INVALID_TOKEN_MESSAGE.into()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}
