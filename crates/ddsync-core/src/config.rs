//! Configuration types for the ddsync system
//!
//! Field names on the wire are the camelCase option names used by existing
//! JSON options files (`publicIpUrl`, `useHostIPAddressCache`, ...), so
//! those files load unchanged.

use crate::error::{Error, Result};
use crate::template::UpdateUrlTemplate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// Default public-IP lookup endpoint
pub const DEFAULT_PUBLIC_IP_URL: &str = "https://domains.google.com/checkip";

/// Default dyndns2 update endpoint template
pub const DEFAULT_UPDATE_IP_URL: &str =
    "https://domains.google.com/nic/update?hostname=%HOSTNAME%&myip=%IPADDRESS%";

/// Default `User-Agent` sent with update requests
pub const DEFAULT_USER_AGENT: &str = concat!("ddsync/", env!("CARGO_PKG_VERSION"));

/// Synchronization engine configuration
///
/// Immutable once the engine is built; the engine keeps it behind an `Arc`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// The dynamic DNS host name to keep in sync
    pub hostname: String,

    /// Provider account user name
    pub username: String,

    /// Provider account password
    /// ⚠️ NEVER log this value
    pub password: String,

    /// URL answering with the caller's public IPv4 address
    pub public_ip_url: String,

    /// Update endpoint template with `%HOSTNAME%` and `%IPADDRESS%` placeholders
    pub update_ip_url: String,

    /// `User-Agent` header for update requests (providers reject default agents)
    pub user_agent: String,

    /// Fail the attempt on the first unresolved host name
    pub fail_on_unresolved_host_name: bool,

    /// Consecutive unresolved host names tolerated before failing the attempt
    pub max_unresolved_host_name_fail: u32,

    /// Reuse the last resolved host address until it expires
    #[serde(rename = "useHostIPAddressCache")]
    pub use_host_ip_address_cache: bool,

    /// Host address cache lifetime (in seconds)
    #[serde(rename = "hostIPAddressCacheExpires")]
    pub host_ip_address_cache_expires: u64,

    /// Verbose logging
    pub debug: bool,
}

impl SyncConfig {
    /// Create a configuration with defaults for everything but the account
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Set the public-IP endpoint
    pub fn with_public_ip_url(mut self, url: impl Into<String>) -> Self {
        self.public_ip_url = url.into();
        self
    }

    /// Set the update endpoint template
    pub fn with_update_ip_url(mut self, template: impl Into<String>) -> Self {
        self.update_ip_url = template.into();
        self
    }

    /// Set the `User-Agent` header
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the unresolved host name policy
    pub fn with_unresolved_policy(mut self, fail_fast: bool, max_failures: u32) -> Self {
        self.fail_on_unresolved_host_name = fail_fast;
        self.max_unresolved_host_name_fail = max_failures;
        self
    }

    /// Enable or disable the host address cache
    pub fn with_host_cache(mut self, enabled: bool, expires_secs: u64) -> Self {
        self.use_host_ip_address_cache = enabled;
        self.host_ip_address_cache_expires = expires_secs;
        self
    }

    /// Host address cache lifetime
    pub fn cache_expires(&self) -> Duration {
        Duration::from_secs(self.host_ip_address_cache_expires)
    }

    /// Parse the update endpoint template
    pub fn update_template(&self) -> Result<UpdateUrlTemplate> {
        UpdateUrlTemplate::parse(self.update_ip_url.clone())
    }

    /// Validate the fields the sync engine reads
    ///
    /// Credentials, the update template and the user agent belong to the
    /// update client and are left to [`SyncConfig::validate`].
    pub fn validate_engine(&self) -> Result<()> {
        validate_domain_name(&self.hostname)?;
        validate_http_url("publicIpUrl", &self.public_ip_url)?;

        if self.max_unresolved_host_name_fail == 0 {
            return Err(Error::config("maxUnresolvedHostNameFail must be at least 1"));
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_engine()?;

        if self.username.is_empty() {
            return Err(Error::config("username is required"));
        }

        if self.password.is_empty() {
            return Err(Error::config("password is required"));
        }

        self.update_template()?;

        if self.user_agent.trim().is_empty() {
            return Err(Error::config(
                "userAgent cannot be empty (providers reject requests without one)",
            ));
        }

        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            username: String::new(),
            password: String::new(),
            public_ip_url: DEFAULT_PUBLIC_IP_URL.to_string(),
            update_ip_url: DEFAULT_UPDATE_IP_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fail_on_unresolved_host_name: false,
            max_unresolved_host_name_fail: 3,
            use_host_ip_address_cache: true,
            host_ip_address_cache_expires: 120,
            debug: false,
        }
    }
}

// Custom Debug implementation that hides the password
impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("public_ip_url", &self.public_ip_url)
            .field("update_ip_url", &self.update_ip_url)
            .field("user_agent", &self.user_agent)
            .field("fail_on_unresolved_host_name", &self.fail_on_unresolved_host_name)
            .field("max_unresolved_host_name_fail", &self.max_unresolved_host_name_fail)
            .field("use_host_ip_address_cache", &self.use_host_ip_address_cache)
            .field("host_ip_address_cache_expires", &self.host_ip_address_cache_expires)
            .field("debug", &self.debug)
            .finish()
    }
}

/// Scheduler and log destination settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Run repeatedly; `false` performs a single sync and exits
    pub run_service: bool,

    /// Delay between sync attempts (in seconds)
    pub check_interval: u64,

    /// Consecutive failed attempts before the loop stops (0 = never stop)
    pub max_consecutive_errors: u32,

    /// Exit the process once the loop stops on errors
    pub exit_on_max_errors: bool,

    /// Append log output to this file (`false` or absent disables it)
    #[serde(deserialize_with = "deserialize_log_path")]
    pub log_path: Option<String>,

    /// Write log output to the console
    pub log_to_console: bool,
}

impl ServiceConfig {
    /// Delay between sync attempts
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.check_interval == 0 {
            return Err(Error::config("checkInterval must be at least 1 second"));
        }

        if let Some(path) = &self.log_path
            && path.trim().is_empty()
        {
            return Err(Error::config("logPath cannot be empty; use false to disable it"));
        }

        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            run_service: true,
            check_interval: 60,
            max_consecutive_errors: 10,
            exit_on_max_errors: true,
            log_path: None,
            log_to_console: true,
        }
    }
}

/// Complete daemon configuration (one flat options object on the wire)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(flatten)]
    pub sync: SyncConfig,

    #[serde(flatten)]
    pub service: ServiceConfig,
}

impl DaemonConfig {
    /// Parse an options object from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validate both halves of the configuration
    pub fn validate(&self) -> Result<()> {
        self.sync.validate()?;
        self.service.validate()
    }
}

fn deserialize_log_path<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LogPath {
        Path(String),
        Flag(bool),
    }

    match Option::<LogPath>::deserialize(deserializer)? {
        None | Some(LogPath::Flag(false)) => Ok(None),
        Some(LogPath::Path(path)) => Ok(Some(path)),
        Some(LogPath::Flag(true)) => Err(serde::de::Error::custom(
            "logPath must be a file path or false",
        )),
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let url = url::Url::parse(value)
        .map_err(|e| Error::config(format!("{} is not a valid URL ({}): {}", field, e, value)))?;

    match url.scheme() {
        "https" => Ok(()),
        "http" => {
            tracing::warn!("{} uses HTTP (not HTTPS): {}", field, value);
            Ok(())
        }
        other => Err(Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            field, other
        ))),
    }
}

/// Check a host name against RFC 1035 label rules
///
/// A single trailing dot (fully-qualified form) is allowed. Internationalized
/// names must be given in their punycode (`xn--`) form.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    let name = domain.strip_suffix('.').unwrap_or(domain);

    if name.is_empty() {
        return Err(Error::config("hostname is required"));
    }

    if name.len() > 253 {
        return Err(Error::config(format!(
            "hostname is {} chars long (max 253): {}",
            name.len(),
            domain
        )));
    }

    name.split('.').try_for_each(|label| check_label(label, domain))
}

fn check_label(label: &str, domain: &str) -> Result<()> {
    let problem = if label.is_empty() {
        "has an empty label"
    } else if label.len() > 63 {
        "has a label longer than 63 chars"
    } else if !label.is_ascii() {
        "is not ASCII; use the punycode (xn--) form"
    } else if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        "may only contain letters, digits and hyphens"
    } else if label.starts_with('-') || label.ends_with('-') {
        "has a label starting or ending with a hyphen"
    } else {
        return Ok(());
    };

    Err(Error::config(format!("hostname '{}' {}", domain, problem)))
}
