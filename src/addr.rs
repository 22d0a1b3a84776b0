//! Textual <-> raw IPv4 conversion collaborator.
//!
//! Both directions are kept free of error types: parsing signals failure as
//! absence, and unparsable update values degrade to [`UNKNOWN_ADDR`] at the
//! facade instead of failing the surrounding call.

use std::net::Ipv4Addr;

use crate::Ipv4Raw;

/// Sentinel stored when an update carries unparsable address text.
pub const UNKNOWN_ADDR: Ipv4Raw = 0;

/// Parse dotted-quad text into a raw address. `None` on malformed input.
pub fn parse_ipv4(text: &str) -> Option<Ipv4Raw> {
    text.parse::<Ipv4Addr>().ok().map(Ipv4Raw::from)
}

/// Format a raw address back to dotted-quad text. Total, unlike the
/// `inet_ntop` it stands in for: every `u32` is a well-formed address.
pub fn format_ipv4(raw: Ipv4Raw) -> String {
    Ipv4Addr::from(raw).to_string()
}
