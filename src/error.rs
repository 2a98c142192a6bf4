//! Error handling for the storefront

use std::fmt;
use storefront_auth::AuthError;
use storefront_postgrest::PostgrestError;
use thiserror::Error;

/// Unified error type for the storefront crate
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration (URL, keys)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Postgrest(#[from] PostgrestError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Rejected admin input (empty name, negative price, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    pub fn invalid_input<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidInput(msg.to_string())
    }

    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
