//! Error handling for the candidatura client side

use std::fmt;
use thiserror::Error;

/// Unified error type for backend calls, the cache-backed manager and the form client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Local file errors (buffered uploads, static assets)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication errors reported by the auth service
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Database query errors reported by PostgREST
    #[error("Database error: {0}")]
    Database(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A write that needs a signed-in user was attempted without one
    #[error("{0}")]
    AuthRequired(&'static str),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new database error
    pub fn database<T: fmt::Display>(msg: T) -> Self {
        Error::Database(msg.to_string())
    }

    /// Create a new storage error
    pub fn storage<T: fmt::Display>(msg: T) -> Self {
        Error::Storage(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// The backend's own message, without the category prefix
    pub fn detail(&self) -> String {
        match self {
            Error::Auth(msg)
            | Error::Database(msg)
            | Error::Storage(msg)
            | Error::Config(msg)
            | Error::General(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
