//! Error types and handling for the morning update digest

use thiserror::Error;

/// Main error type for the morning update digest
#[derive(Error, Debug)]
pub enum DigestError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather provider errors
    #[error("Weather provider error: {message}")]
    Weather { message: String },

    /// Market-data provider errors
    #[error("{message}")]
    Quote { message: String },

    /// Email composition or delivery errors
    #[error("Email error: {message}")]
    Email { message: String },

    /// Transport-level HTTP errors
    #[error("HTTP error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// Malformed provider payloads
    #[error("Invalid JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl DigestError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new weather provider error
    pub fn weather<S: Into<String>>(message: S) -> Self {
        Self::Weather {
            message: message.into(),
        }
    }

    /// Create a new market-data error.
    ///
    /// The message is rendered verbatim into the quote line, so it carries
    /// no prefix of its own.
    pub fn quote<S: Into<String>>(message: S) -> Self {
        Self::Quote {
            message: message.into(),
        }
    }

    /// Create a new email error
    pub fn email<S: Into<String>>(message: S) -> Self {
        Self::Email {
            message: message.into(),
        }
    }
}

impl From<lettre::error::Error> for DigestError {
    fn from(err: lettre::error::Error) -> Self {
        DigestError::email(err.to_string())
    }
}

impl From<lettre::address::AddressError> for DigestError {
    fn from(err: lettre::address::AddressError) -> Self {
        DigestError::email(format!("invalid address: {err}"))
    }
}

impl From<lettre::transport::smtp::Error> for DigestError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        DigestError::email(err.to_string())
    }
}
