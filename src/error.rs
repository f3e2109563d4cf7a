//! Error types for readaloud operations.

use thiserror::Error;

/// Errors that can occur while extracting, reading or persisting settings.
///
/// Speech engine failures are not errors here: the controller reports them
/// through its notification sink and returns to idle.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No readable content")]
    NoContent,

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
