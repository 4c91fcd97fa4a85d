//! Error types for the ddsync system
//!
//! Every public operation in the workspace returns [`Result`], so a caller
//! only ever deals with one failure convention.

use thiserror::Error;

/// Result type alias for ddsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the ddsync system
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure or non-200 status on an HTTP call
    #[error("Network error: {0}")]
    Network(String),

    /// The public-IP endpoint answered with something that is not an IPv4 address
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Host name lookup failed and the tolerance policy escalated it
    #[error("Unable to resolve host name {hostname}: {message}")]
    DnsResolution {
        /// The host name that was looked up
        hostname: String,
        /// Resolver error text
        message: String,
    },

    /// The provider answered with a known error token
    #[error("Provider rejected update ({token}): {message}")]
    Provider {
        /// Raw response token (e.g. `badauth`)
        token: String,
        /// Human readable description of the token
        message: String,
    },

    /// The provider answered with a token we do not know
    #[error("Unknown provider response: {0}")]
    UnknownResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File access errors (config file, log file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service loop hit its consecutive error limit
    #[error("Stopped after {count} consecutive failed sync attempts")]
    ErrorBudgetExhausted {
        /// Number of consecutive failures observed
        count: u32,
    },
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a DNS resolution error
    pub fn dns_resolution(hostname: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DnsResolution {
            hostname: hostname.into(),
            message: message.into(),
        }
    }

    /// Create a provider error from a classified response token
    pub fn provider(token: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            token: token.into(),
            message: message.into(),
        }
    }

    /// Create an unknown response error
    pub fn unknown_response(token: impl Into<String>) -> Self {
        Self::UnknownResponse(token.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
