//! Error types for the cinema portal

use serde_json::Value;
use thiserror::Error;

use crate::http::PROFILE_UPDATE_PATH;

pub type Result<T> = std::result::Result<T, PortalError>;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Access denied: {0}")]
    Access(String),
}

impl PortalError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PortalError::InvalidInput(_) => 3,
            PortalError::Access(_) => 2,
            PortalError::Api(e) if e.is_unauthorized() => 2,
            PortalError::Api(_) => 1,
            PortalError::Config(_) => 1,
            PortalError::Storage(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored value is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Failures surfaced by the HTTP client and the API modules
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Network unreachable, timeout, connection reset
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response; `body` is the decoded response body (or `Null`)
    #[error("Request failed with status code {status}")]
    Status {
        status: u16,
        /// Request path without the query string
        path: String,
        body: Value,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Rejected before any request was sent
    #[error("{0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Whether the backend has stopped accepting our session
    ///
    /// A 401 from the profile update endpoint only rejects that update.
    pub fn ends_session(&self) -> bool {
        match self {
            ApiError::Status {
                status: 401, path, ..
            } => !path.contains(PROFILE_UPDATE_PATH),
            _ => false,
        }
    }

    /// The `message` field of the server's error body, if it sent one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } => body
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty()),
            _ => None,
        }
    }

    /// Message shown to the user: server body message, then our own
    /// description, then the caller's fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        if let Some(message) = self.server_message() {
            return message.to_string();
        }
        let own = self.to_string();
        if own.is_empty() {
            fallback.to_string()
        } else {
            own
        }
    }
}
