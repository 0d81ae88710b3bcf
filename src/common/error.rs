//! Error types for the application.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Failures of the external services a script talks to.
///
/// Scripts turn these into user-facing strings or drop the message;
/// they never reach the dispatcher.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned status {status}")]
    Status { status: u16 },

    #[error("Unexpected response: {message}")]
    Parse { message: String },

    #[error("Empty response")]
    Empty,
}

/// Markov brain persistence errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to access brain file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Brain file '{path}' is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode brain: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to replace brain file '{path}': {source}")]
    Persist {
        path: String,
        #[source]
        source: tempfile::PersistError,
    },

    #[error("Background save task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Pronunciation dictionary loading errors.
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Failed to read pronunciation dictionary '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Pronunciation dictionary '{path}' contains no entries")]
    Empty { path: String },
}

/// Twitch IRC connection errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection closed by remote")]
    ConnectionClosed,

    #[error("Login failed: {reason}")]
    LoginFailed { reason: String },

    #[error("Line exceeds {max} bytes")]
    LineTooLong { max: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for script service calls.
pub type ScriptResult<T> = std::result::Result<T, ScriptError>;

/// Result type alias for brain persistence.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
