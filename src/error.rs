use std::io;
use thiserror::Error;

/// Custom error type for rasp-info
#[derive(Error, Debug)]
pub enum RaspError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_name} api returned status: {status}")]
    Status { source_name: String, status: u16 },

    #[error("Failed to decode {source_name} response: {message}")]
    Decode {
        source_name: String,
        message: String,
    },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Stop lookup failed: {0}")]
    StopLookup(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for rasp-info
pub type Result<T> = std::result::Result<T, RaspError>;

impl RaspError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        RaspError::Config(msg.into())
    }

    pub fn status<S: Into<String>>(source_name: S, status: u16) -> Self {
        RaspError::Status {
            source_name: source_name.into(),
            status,
        }
    }

    /// Create a decode error for the named upstream
    pub fn decode<S: Into<String>, M: ToString>(source_name: S, message: M) -> Self {
        RaspError::Decode {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    pub fn stop_lookup<S: Into<String>>(msg: S) -> Self {
        RaspError::StopLookup(msg.into())
    }

    pub fn missing_credential<S: Into<String>>(msg: S) -> Self {
        RaspError::MissingCredential(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        RaspError::Other(msg.into())
    }
}
