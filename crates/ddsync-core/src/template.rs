//! Update URL templating
//!
//! The provider update endpoint is configured as a template such as
//! `https://domains.google.com/nic/update?hostname=%HOSTNAME%&myip=%IPADDRESS%`.
//! [`UpdateUrlTemplate`] checks the template once at construction and then
//! produces a parsed [`Url`] for every request.

use crate::error::{Error, Result};
use std::fmt;
use std::net::Ipv4Addr;
use url::Url;

/// Placeholder replaced with the configured host name
pub const HOSTNAME_PLACEHOLDER: &str = "%HOSTNAME%";

/// Placeholder replaced with the address being published
pub const IPADDRESS_PLACEHOLDER: &str = "%IPADDRESS%";

/// A validated update URL template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateUrlTemplate {
    template: String,
}

impl UpdateUrlTemplate {
    /// Validate a template string
    ///
    /// The template must contain both placeholders and must expand to an
    /// absolute `http` or `https` URL with a host.
    pub fn parse(template: impl Into<String>) -> Result<Self> {
        let template = template.into();

        for placeholder in [HOSTNAME_PLACEHOLDER, IPADDRESS_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(Error::config(format!(
                    "Update URL template is missing the {} placeholder: {}",
                    placeholder, template
                )));
            }
        }

        // Expand with throwaway values so a broken template fails at startup.
        expand(&template, "host.example.com", Ipv4Addr::UNSPECIFIED)?;

        Ok(Self { template })
    }

    /// Build the request URL for a host name and address
    pub fn build(&self, hostname: &str, ip: Ipv4Addr) -> Result<Url> {
        expand(&self.template, hostname, ip)
    }

    /// The raw template text
    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl fmt::Display for UpdateUrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn expand(template: &str, hostname: &str, ip: Ipv4Addr) -> Result<Url> {
    let hostname: String = url::form_urlencoded::byte_serialize(hostname.as_bytes()).collect();
    let raw = template
        .replace(HOSTNAME_PLACEHOLDER, &hostname)
        .replace(IPADDRESS_PLACEHOLDER, &ip.to_string());

    let url = Url::parse(&raw)
        .map_err(|e| Error::config(format!("Invalid update URL {}: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::config(format!(
            "Update URL must use HTTP or HTTPS scheme. Got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(Error::config(format!("Update URL has no host: {}", raw)));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOGLE: &str =
        "https://domains.google.com/nic/update?hostname=%HOSTNAME%&myip=%IPADDRESS%";

    #[test]
    fn test_build_substitutes_both_placeholders() {
        let template = UpdateUrlTemplate::parse(GOOGLE).unwrap();
        let url = template
            .build("my.domain.com", Ipv4Addr::new(5, 6, 7, 8))
            .unwrap();

        assert_eq!(url.host_str(), Some("domains.google.com"));
        assert_eq!(url.path(), "/nic/update");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("hostname".to_string(), "my.domain.com".to_string()),
                ("myip".to_string(), "5.6.7.8".to_string()),
            ]
        );
    }

    #[test]
    fn test_hostname_is_encoded() {
        let template = UpdateUrlTemplate::parse(GOOGLE).unwrap();
        let url = template
            .build("a.com&myip=9.9.9.9", Ipv4Addr::new(1, 1, 1, 1))
            .unwrap();

        let myips: Vec<String> = url
            .query_pairs()
            .filter(|(k, _)| k == "myip")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(myips, vec!["1.1.1.1".to_string()]);
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let err = UpdateUrlTemplate::parse("https://example.com/update?hostname=%HOSTNAME%")
            .unwrap_err();
        assert!(err.to_string().contains(IPADDRESS_PLACEHOLDER));
    }

    #[test]
    fn test_bad_scheme_rejected() {
        assert!(UpdateUrlTemplate::parse("ftp://example.com/%HOSTNAME%/%IPADDRESS%").is_err());
        assert!(UpdateUrlTemplate::parse("not a url %HOSTNAME% %IPADDRESS%").is_err());
    }

    #[test]
    fn test_display_is_raw_template() {
        let template = UpdateUrlTemplate::parse(GOOGLE).unwrap();
        assert_eq!(template.to_string(), GOOGLE);
        assert_eq!(template.as_str(), GOOGLE);
    }
}
