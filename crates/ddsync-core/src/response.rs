//! Provider response classification
//!
//! Dyndns2-style update endpoints answer with a single line of the form
//! `<token>` or `<token> <ip>`. This module maps that line onto an
//! [`UpdateOutcome`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a provider response means the update went through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Success => f.write_str("success"),
            ResponseStatus::Error => f.write_str("error"),
        }
    }
}

/// Known provider response codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    /// `good`
    Good,
    /// `nochg`
    NoChange,
    /// `nohost`
    NoHost,
    /// `badauth`
    BadAuth,
    /// `notfqdn`
    NotFqdn,
    /// `badagent`
    BadAgent,
    /// `abuse`
    Abuse,
    /// `911`
    ServerError,
}

impl ResponseCode {
    /// Every known code, in table order
    pub const ALL: [ResponseCode; 8] = [
        ResponseCode::Good,
        ResponseCode::NoChange,
        ResponseCode::NoHost,
        ResponseCode::BadAuth,
        ResponseCode::NotFqdn,
        ResponseCode::BadAgent,
        ResponseCode::Abuse,
        ResponseCode::ServerError,
    ];

    /// Look up a raw token
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.token() == token)
    }

    /// The wire token for this code
    pub fn token(self) -> &'static str {
        match self {
            ResponseCode::Good => "good",
            ResponseCode::NoChange => "nochg",
            ResponseCode::NoHost => "nohost",
            ResponseCode::BadAuth => "badauth",
            ResponseCode::NotFqdn => "notfqdn",
            ResponseCode::BadAgent => "badagent",
            ResponseCode::Abuse => "abuse",
            ResponseCode::ServerError => "911",
        }
    }

    pub fn status(self) -> ResponseStatus {
        match self {
            ResponseCode::Good | ResponseCode::NoChange => ResponseStatus::Success,
            _ => ResponseStatus::Error,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ResponseCode::Good => "The update was successful.",
            ResponseCode::NoChange => "The supplied IP address is already set for this host.",
            ResponseCode::NoHost => {
                "The hostname does not exist, or does not have Dynamic DNS enabled."
            }
            ResponseCode::BadAuth => {
                "The username / password combination is not valid for the specified host."
            }
            ResponseCode::NotFqdn => {
                "The supplied hostname is not a valid fully-qualified domain name."
            }
            ResponseCode::BadAgent => {
                "Your Dynamic DNS client is making bad requests. Ensure the user agent is set \
                 in the request, and that you're only attempting to set an IPv4 address. \
                 IPv6 is not supported."
            }
            ResponseCode::Abuse => {
                "Dynamic DNS access for the hostname has been blocked due to failure to \
                 interpret previous responses correctly."
            }
            ResponseCode::ServerError => "An error happened on our end. Wait 5 minutes and retry.",
        }
    }
}

/// Classified result of an update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    /// Raw provider token, preserved even when unrecognized
    pub response_token: String,
    pub status: ResponseStatus,
    /// Human readable description
    pub message: String,
    /// Address echoed back by the provider, if any
    pub ip: Option<String>,
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// The known code behind this outcome, `None` for unrecognized tokens
    pub fn code(&self) -> Option<ResponseCode> {
        ResponseCode::from_token(&self.response_token)
    }

    /// Turn an `error`-status outcome into an [`Error`]
    ///
    /// Known error tokens become [`Error::Provider`], unrecognized ones
    /// become [`Error::UnknownResponse`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        match self.code() {
            Some(_) => Err(Error::provider(self.response_token, self.message)),
            None => Err(Error::unknown_response(self.response_token)),
        }
    }
}

/// Classify a provider response body
pub fn parse(body: &str) -> UpdateOutcome {
    let mut fields = body.split_whitespace();
    let token = fields.next().unwrap_or_default();
    let ip = fields.next().map(str::to_string);

    match ResponseCode::from_token(token) {
        Some(code) => UpdateOutcome {
            response_token: token.to_string(),
            status: code.status(),
            message: code.message().to_string(),
            ip,
        },
        None => UpdateOutcome {
            response_token: token.to_string(),
            status: ResponseStatus::Error,
            message: format!("unknown or unhandled response type: {}", token),
            ip,
        },
    }
}
