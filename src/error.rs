//! Error handling for the Journy client

use std::fmt;
use thiserror::Error;

use crate::mapper::DecodeError;

/// Unified error type for the Journy client
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

    /// Authentication errors, carrying the provider's message
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The document does not exist in the collection
    #[error("Document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },

    /// The entry id is not present in the trip's nested array
    #[error("Entry not found: {field}[{id}]")]
    EntryNotFound { field: String, id: String },

    /// The entry id is already present in the trip's nested array
    #[error("Duplicate entry: {field}[{id}]")]
    DuplicateEntry { field: String, id: String },

    /// Version mismatch or an existing document
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored document could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Non-success response from a remote service
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid arguments supplied by the caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new conflict error
    pub fn conflict<T: fmt::Display>(msg: T) -> Self {
        Error::Conflict(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new invalid input error
    pub fn invalid_input<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidInput(msg.to_string())
    }

    pub(crate) fn document_not_found(collection: &str, id: &str) -> Self {
        Error::DocumentNotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    /// Whether this error is a version conflict that a fresh read may resolve
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
