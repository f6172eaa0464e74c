//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a service can report, from a malformed task id to a provider outage,
//! is one of its variants.
//!
//! `AppError` implements `actix_web::error::ResponseError` so handlers can return it
//! directly; each variant maps to a fixed HTTP status and a `{"error": ...}` JSON body.
//! `From` implementations for `mongodb::error::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error`, `bcrypt::BcryptError` and `reqwest::Error` allow
//! conversion with the `?` operator.

use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or missing required input (HTTP 400).
    ValidationError(String),
    /// A path identifier that is not a well-formed record id (HTTP 400).
    InvalidId(String),
    /// A unique key is already taken, e.g. a registered email (HTTP 400).
    Conflict(String),
    /// Missing, invalid or expired credentials (HTTP 401).
    Unauthorized(String),
    /// The requested record does not exist (HTTP 404).
    NotFound(String),
    /// The language-model provider failed or returned unusable content (HTTP 500).
    GenerationError(String),
    /// Represents an error originating from the document store (HTTP 500).
    DatabaseError(String),
    /// Represents an unexpected server-side error (HTTP 500).
    InternalServerError(String),
}

impl AppError {
    /// The message placed in the `error` field of the response body.
    pub fn message(&self) -> &str {
        match self {
            AppError::ValidationError(msg)
            | AppError::InvalidId(msg)
            | AppError::Conflict(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::GenerationError(msg)
            | AppError::DatabaseError(msg)
            | AppError::InternalServerError(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::InvalidId(msg) => write!(f, "Invalid Id: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::GenerationError(msg) => write!(f, "Generation Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidId(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            // Store and provider failures are presented as generic internal errors.
            AppError::GenerationError(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let AppError::Unauthorized(_) = self {
            response.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        response.json(json!({
            "error": self.message()
        }))
    }
}

/// Converts `mongodb::error::Error` into `AppError::DatabaseError`.
///
/// Connectivity and driver failures are not categorised any further.
impl From<mongodb::error::Error> for AppError {
    fn from(error: mongodb::error::Error) -> AppError {
        AppError::DatabaseError(error.to_string())
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::InternalServerError`.
///
/// Verification failures are mapped to `Unauthorized` by the token module itself;
/// anything reaching this conversion is a signing failure.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::InternalServerError(format!("Failed to generate token: {}", error))
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(format!("Failed to hash password: {}", error))
    }
}

/// Converts `reqwest::Error` into `AppError::GenerationError`.
///
/// The HTTP client is only used to reach the language-model provider.
impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> AppError {
        AppError::GenerationError(format!("Error generating description: {}", error))
    }
}
