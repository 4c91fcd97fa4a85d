// # dyndns2 Update Client
//
// This crate provides the update client for dyndns2-style providers
// (Google Domains, Dyn, No-IP and most registrars offering "Dynamic DNS").
//
// ## Behavior
//
// - One GET per update, no retry and no backoff (owned by the caller)
// - HTTP Basic authentication with the configured username and password
// - Custom `User-Agent` on every request (providers reject anonymous clients)
// - Any status other than 200 is a network error
// - The 200 body is classified by `ddsync_core::response::parse`
//
// ## Security Requirements
//
// - The password NEVER appears in logs or Debug output
// - The request URL carries only the host name and address
//
// ## Protocol Reference
//
// ```http
// GET /nic/update?hostname=<host>&myip=<ip>
// Authorization: Basic <base64(username:password)>
// User-Agent: ddsync/0.1.0
//
// 200 OK
// good 203.0.113.9
// ```

use async_trait::async_trait;
use ddsync_core::response::{self, UpdateOutcome};
use ddsync_core::traits::UpdateClient;
use ddsync_core::{Error, Result, SyncConfig, UpdateUrlTemplate};
use reqwest::StatusCode;
use reqwest::header::USER_AGENT;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::debug;

/// Default HTTP timeout for update requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// dyndns2 update client
///
/// Stateless and single-shot: every call to `update` is exactly one request.
pub struct Dyndns2Client {
    /// Host name being updated
    hostname: String,

    /// Basic auth user name
    username: String,

    /// Basic auth password
    /// ⚠️ NEVER log this value
    password: String,

    /// Validated update URL template
    template: UpdateUrlTemplate,

    /// `User-Agent` header value
    user_agent: String,

    /// HTTP client for update requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for Dyndns2Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dyndns2Client")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("template", &self.template.as_str())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Dyndns2Client {
    /// Create a new dyndns2 client
    ///
    /// # Parameters
    ///
    /// - `hostname`: Host name substituted into `%HOSTNAME%`
    /// - `username` / `password`: Basic auth credentials
    /// - `template`: Update URL template
    /// - `user_agent`: `User-Agent` header value
    ///
    /// # Errors
    ///
    /// - `Error::Config`: empty credentials or host name
    /// - `Error::Network`: the HTTP client could not be built
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        template: UpdateUrlTemplate,
        user_agent: impl Into<String>,
    ) -> Result<Self> {
        let hostname = hostname.into();
        let username = username.into();
        let password = password.into();

        if hostname.is_empty() {
            return Err(Error::config("dyndns2 host name is required"));
        }

        if username.is_empty() || password.is_empty() {
            return Err(Error::config("dyndns2 username and password are required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            hostname,
            username,
            password,
            template,
            user_agent: user_agent.into(),
            client,
        })
    }

    /// Create from the sync configuration
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Self::new(
            config.hostname.clone(),
            config.username.clone(),
            config.password.clone(),
            config.update_template()?,
            config.user_agent.clone(),
        )
    }
}

#[async_trait]
impl UpdateClient for Dyndns2Client {
    /// Send one update request
    ///
    /// # API Call
    ///
    /// ```http
    /// GET <template with %HOSTNAME% and %IPADDRESS% substituted>
    /// Authorization: Basic <credentials>
    /// User-Agent: <user agent>
    /// ```
    async fn update(&self, ip: Ipv4Addr) -> Result<UpdateOutcome> {
        let url = self.template.build(&self.hostname, ip)?;
        debug!("Sending dyndns2 update for {} ({})", self.hostname, ip);

        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| Error::network(format!("Update request failed: {}", e.without_url())))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(match status.as_u16() {
                401 | 403 => Error::network(format!(
                    "Update rejected by the server, check the credentials. Status: {}",
                    status
                )),
                429 => Error::network(format!("Rate limit exceeded. Status: {}", status)),
                500..=599 => Error::network(format!("Provider server error (transient): {}", status)),
                _ => Error::network(format!("Unexpected update response status: {}", status)),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read update response: {}", e)))?;

        let outcome = response::parse(&body);
        debug!(
            "dyndns2 answered {:?} ({}) for {}",
            outcome.response_token, outcome.status, self.hostname
        );

        Ok(outcome)
    }

    fn provider_name(&self) -> &'static str {
        "dyndns2"
    }
}
