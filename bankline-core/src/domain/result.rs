//! Result and error types for the core library

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn insufficient_funds(msg: impl Into<String>) -> Self {
        Self::InsufficientFunds(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn invalid_credential(msg: impl Into<String>) -> Self {
        Self::InvalidCredential(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable snake_case name of the error kind, safe to log
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::InsufficientFunds(_) => "insufficient_funds",
            Error::Forbidden(_) => "forbidden",
            Error::Unauthenticated(_) => "unauthenticated",
            Error::InvalidCredential(_) => "invalid_credential",
            Error::Validation(_) => "validation",
            Error::Database(_) => "database",
            Error::Config(_) => "config",
            Error::Internal(_) => "internal",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }

    /// HTTP-equivalent status code for the boundary layer
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            Error::Conflict(_) => 409,
            Error::InsufficientFunds(_) => 422,
            Error::Forbidden(_) => 403,
            Error::Unauthenticated(_) | Error::InvalidCredential(_) => 401,
            Error::Validation(_) | Error::Json(_) => 400,
            Error::Database(_) | Error::Config(_) | Error::Internal(_) | Error::Io(_) => 500,
        }
    }

    /// Message without the kind prefix, as shown in error bodies
    pub fn message(&self) -> String {
        match self {
            Error::NotFound(m)
            | Error::Conflict(m)
            | Error::InsufficientFunds(m)
            | Error::Forbidden(m)
            | Error::Unauthenticated(m)
            | Error::InvalidCredential(m)
            | Error::Validation(m)
            | Error::Database(m)
            | Error::Config(m)
            | Error::Internal(m) => m.clone(),
            Error::Io(e) => e.to_string(),
            Error::Json(e) => e.to_string(),
        }
    }
}

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        let msg = err.to_string();
        // DuckDB reports unique/primary key violations as constraint errors
        if msg.contains("Duplicate key") || msg.contains("unique constraint") {
            Error::Conflict(msg)
        } else {
            Error::Database(msg)
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// JSON error body returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self { error: err.message() }
    }
}

/// Map an error that crossed an `anyhow` boundary to a status code.
///
/// Errors that did not originate in this crate default to 400.
pub fn status_for(err: &anyhow::Error) -> u16 {
    err.downcast_ref::<Error>()
        .map(Error::status_code)
        .unwrap_or(400)
}
