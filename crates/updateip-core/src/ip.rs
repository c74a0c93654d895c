//! Public IP value and extraction from free-form text

use regex::Regex;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Four dot-separated ASCII digit groups bounded by ASCII word boundaries
///
/// Octets are not range-checked: `999.1.1.1` matches. Non-ASCII digits never
/// match, and a non-ASCII letter counts as a boundary.
static IPV4_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u:\b)[0-9]+(?:\.[0-9]+){3}(?-u:\b)").expect("IPv4 pattern compiles")
});

/// A dotted-quad IPv4 literal as reported by the address service
///
/// The value is kept as text. Clones share the same allocation, so handing
/// the same address to many consumers is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IpAddress(Arc<str>);

impl IpAddress {
    /// Wrap a literal without validation
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(Arc::from(value.as_ref()))
    }

    /// The literal as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IpAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IpAddress {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Return the first IPv4-shaped substring of `body`, if any
pub fn extract_ipv4(body: &str) -> Option<IpAddress> {
    IPV4_SHAPE.find(body).map(|m| IpAddress::new(m.as_str()))
}
