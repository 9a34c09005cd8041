//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration. Raised before any network call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The model service rejected or failed the call. Message is the
    /// service's own text.
    #[error("Model service error: {0}")]
    RemoteInvocation(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),
}

impl Error {
    /// True for errors raised before anything was sent over the network.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Config(_) | Error::EnvVar(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
