//! IPv4 address normalization and strict parsing
//!
//! Public-IP services answer with a bare address, sometimes padded with
//! whitespace, a trailing newline or other framing characters. The text is
//! normalized first and then parsed as four decimal octets in `0..=255`.

use crate::error::{Error, Result};
use std::net::Ipv4Addr;

/// Strip framing noise around an address
///
/// Leading and trailing characters that cannot be part of a dotted quad are
/// removed. Interior characters are left alone, so `"1.2.3.4+5"` stays
/// malformed instead of being rewritten into a different address.
pub fn normalize_address(raw: &str) -> &str {
    raw.trim_matches(|c: char| !c.is_ascii_digit())
}

/// Normalize and strictly parse an IPv4 address
///
/// # Returns
///
/// - `Ok(Ipv4Addr)`: The parsed address
/// - `Err(Error::InvalidResponse)`: If the normalized text is not a dotted quad
pub fn parse_ipv4(raw: &str) -> Result<Ipv4Addr> {
    let candidate = normalize_address(raw);
    candidate
        .parse::<Ipv4Addr>()
        .map_err(|_| Error::invalid_response(format!("Got invalid IPv4 address: {:?}", raw.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_padded() {
        assert_eq!(parse_ipv4("5.6.7.8").unwrap(), Ipv4Addr::new(5, 6, 7, 8));
        assert_eq!(parse_ipv4("  5.6.7.8\n").unwrap(), Ipv4Addr::new(5, 6, 7, 8));
        assert_eq!(parse_ipv4("\"10.0.0.1\"").unwrap(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(parse_ipv4("ip: 10.0.0.1;").unwrap(), Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn test_rejects_out_of_range_octets() {
        assert!(parse_ipv4("256.1.1.1").is_err());
        assert!(parse_ipv4("1.2.3.1000").is_err());
        assert!(parse_ipv4("999.999.999.999").is_err());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(parse_ipv4("").is_err());
        assert!(parse_ipv4("1.2.3").is_err());
        assert!(parse_ipv4("1.2.3.4.5").is_err());
        assert!(parse_ipv4("1.2.3.4+5").is_err());
        assert!(parse_ipv4("<html>error</html>").is_err());
        assert!(parse_ipv4("::1").is_err());
    }

    #[test]
    fn test_error_kind() {
        let err = parse_ipv4("nope").unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[test]
    fn test_normalize_keeps_interior() {
        assert_eq!(normalize_address(" 1.2.3.4 "), "1.2.3.4");
        assert_eq!(normalize_address("1.2.3.4+5"), "1.2.3.4+5");
    }
}
