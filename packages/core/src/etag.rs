//! `ETag` adjustment for viewer-dependent representations.
//!
//! An authenticated agent may see statements an anonymous viewer does not,
//! so the two must never share a cache entry. The upstream `ETag` is derived
//! from resource state only. Here it is shifted by the agent's fingerprint:
//! the tag value is read as a base-16 unsigned integer, the fingerprint is
//! added, and the sum is written back in base 16 as a strong tag.
//!
//! The sum is computed on hex digits directly, so tags of any length work
//! (a SHA-256 tag is 64 digits, far past `u128`). Addition is not a
//! collision-resistant mix: two agents can in principle land on the same tag.

use std::fmt;

use http::header::{HeaderMap, HeaderValue, ETAG};

use crate::viewer::Viewer;

/// A parsed entity tag: `"value"` or `W/"value"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTag {
    value: String,
    weak: bool,
}

impl EntityTag {
    /// A strong tag. Returns `None` if `value` contains characters not
    /// allowed inside an entity tag.
    pub fn strong(value: impl Into<String>) -> Option<Self> {
        Self::with_weakness(value.into(), false)
    }

    /// A weak tag (`W/"…"`).
    pub fn weak(value: impl Into<String>) -> Option<Self> {
        Self::with_weakness(value.into(), true)
    }

    fn with_weakness(value: String, weak: bool) -> Option<Self> {
        if value.bytes().all(is_etag_char) {
            Some(Self { value, weak })
        } else {
            None
        }
    }

    /// Parse a header value such as `"1a"` or `W/"1a"`.
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (weak, quoted) = match header.strip_prefix("W/") {
            Some(rest) => (true, rest),
            None => (false, header),
        };
        let value = quoted.strip_prefix('"')?.strip_suffix('"')?;
        Self::with_weakness(value.to_string(), weak)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_weak(&self) -> bool {
        self.weak
    }

    /// The tag as a header value.
    pub fn to_header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.to_string()).ok()
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weak {
            f.write_str("W/")?;
        }
        write!(f, "\"{}\"", self.value)
    }
}

/// The tag `viewer` should see.
///
/// For an authenticated agent whose tag value is valid hex, the result is the
/// strong tag `hex(value + fingerprint)`; a weak input does not stay weak.
/// Otherwise the tag is returned unchanged.
pub fn adjust(tag: &EntityTag, viewer: &Viewer) -> EntityTag {
    let Some(agent) = viewer.as_agent() else {
        return tag.clone();
    };
    match add_to_hex(tag.value(), agent.fingerprint()) {
        Some(value) => EntityTag { value, weak: false },
        None => tag.clone(),
    }
}

/// Adjust the `ETag` in `headers` for `viewer`, in place.
///
/// Applies only when an `ETag` is present, parses as an entity tag with a hex
/// value, and the viewer is an authenticated agent. Every `ETag` value is
/// then replaced by the single tag from [`adjust`]. In every other case
/// `headers` is left exactly as it was. Returns whether the header changed.
pub fn adjust_header(headers: &mut HeaderMap, viewer: &Viewer) -> bool {
    if !viewer.is_authenticated() {
        return false;
    }
    let Some(current) = headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .and_then(EntityTag::parse)
    else {
        return false;
    };

    let adjusted = adjust(&current, viewer);
    if adjusted == current {
        // non-hex value
        tracing::debug!(etag = %current, "ETag value is not hexadecimal; leaving it unchanged");
        return false;
    }
    let Some(value) = adjusted.to_header_value() else {
        return false;
    };
    tracing::debug!(from = %current, to = %adjusted, "adjusted ETag for authenticated agent");
    headers.insert(ETAG, value);
    true
}

/// `hex + addend`, both unsigned, as lowercase hex without leading zeros.
///
/// Returns `None` if `hex` is empty or has a non-hex digit.
pub fn add_to_hex(hex: &str, addend: u64) -> Option<String> {
    if hex.is_empty() {
        return None;
    }
    // least significant digit first
    let mut digits: Vec<u8> = hex
        .bytes()
        .rev()
        .map(|b| (b as char).to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;

    let mut carry = addend as u128;
    let mut i = 0;
    while carry > 0 {
        if i == digits.len() {
            digits.push(0);
        }
        let sum = digits[i] as u128 + (carry & 0xf);
        digits[i] = (sum & 0xf) as u8;
        carry = (carry >> 4) + (sum >> 4);
        i += 1;
    }

    while digits.len() > 1 && digits.last() == Some(&0) {
        digits.pop();
    }
    Some(
        digits
            .iter()
            .rev()
            .map(|d| char::from_digit(u32::from(*d), 16).unwrap_or('0'))
            .collect(),
    )
}

// etagc = %x21 / %x23-7E / obs-text
fn is_etag_char(b: u8) -> bool {
    b == 0x21 || (0x23..=0x7e).contains(&b) || b >= 0x80
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::Agent;

    #[test]
    fn parse_strong_and_weak() {
        let strong = EntityTag::parse("\"1a\"").unwrap();
        assert_eq!(strong.value(), "1a");
        assert!(!strong.is_weak());

        let weak = EntityTag::parse("W/\"1a\"").unwrap();
        assert!(weak.is_weak());
        assert_eq!(weak.to_string(), "W/\"1a\"");
    }

    #[test]
    fn parse_rejects_unquoted_and_bad_chars() {
        assert_eq!(EntityTag::parse("1a"), None);
        assert_eq!(EntityTag::parse("\"a\"b\""), None);
        assert_eq!(EntityTag::parse("\"a b\""), None);
        assert_eq!(EntityTag::parse(""), None);
    }

    #[test]
    fn add_to_hex_carries() {
        assert_eq!(add_to_hex("1a", 0).as_deref(), Some("1a"));
        assert_eq!(add_to_hex("1a", 1).as_deref(), Some("1b"));
        assert_eq!(add_to_hex("ff", 1).as_deref(), Some("100"));
        assert_eq!(add_to_hex("0000ff", 1).as_deref(), Some("100"));
        assert_eq!(add_to_hex("0", 0).as_deref(), Some("0"));
        assert_eq!(add_to_hex("FF", 0x10).as_deref(), Some("10f"));
        assert_eq!(
            add_to_hex("ffffffffffffffff", u64::MAX).as_deref(),
            Some("1fffffffffffffffe")
        );
    }

    #[test]
    fn add_to_hex_handles_wide_values() {
        let sha256 = "f".repeat(64);
        let expected = format!("1{}", "0".repeat(64));
        assert_eq!(add_to_hex(&sha256, 1), Some(expected));
    }

    #[test]
    fn add_to_hex_rejects_non_hex() {
        assert_eq!(add_to_hex("", 1), None);
        assert_eq!(add_to_hex("xyz", 1), None);
        assert_eq!(add_to_hex("-1a", 1), None);
    }

    #[test]
    fn adjust_adds_agent_fingerprint() {
        let agent = Agent::new("urn:agent42");
        let tag = EntityTag::strong("1a").unwrap();
        let adjusted = adjust(&tag, &Viewer::Agent(agent.clone()));
        let expected = format!("{:x}", 0x1a_u128 + agent.fingerprint() as u128);
        assert_eq!(adjusted.value(), expected);
        assert!(!adjusted.is_weak());
    }

    #[test]
    fn adjusted_tag_is_always_strong() {
        let agent = Agent::new("urn:agent42");
        let tag = EntityTag::weak("1a").unwrap();
        let adjusted = adjust(&tag, &Viewer::Agent(agent.clone()));
        assert!(!adjusted.is_weak());
        let expected = format!("{:x}", 0x1a_u128 + agent.fingerprint() as u128);
        assert_eq!(adjusted.to_string(), format!("\"{expected}\""));
    }

    #[test]
    fn weak_header_becomes_strong() {
        let agent = Agent::new("urn:agent42");
        let mut headers = HeaderMap::new();
        headers.insert(ETAG, HeaderValue::from_static("W/\"1a\""));
        assert!(adjust_header(&mut headers, &Viewer::Agent(agent.clone())));
        let expected = format!("\"{:x}\"", 0x1a_u128 + agent.fingerprint() as u128);
        assert_eq!(headers[ETAG], expected.as_str());
    }

    #[test]
    fn weak_tag_is_untouched_for_anonymous() {
        let tag = EntityTag::weak("1a").unwrap();
        assert!(adjust(&tag, &Viewer::Anonymous).is_weak());
    }

    #[test]
    fn adjust_is_identity_for_anonymous() {
        let tag = EntityTag::strong("1a").unwrap();
        assert_eq!(adjust(&tag, &Viewer::Anonymous), tag);
    }

    #[test]
    fn adjust_header_replaces_all_values() {
        let mut headers = HeaderMap::new();
        headers.append(ETAG, HeaderValue::from_static("\"1a\""));
        headers.append(ETAG, HeaderValue::from_static("\"2b\""));
        assert!(adjust_header(&mut headers, &Viewer::agent("urn:agent42")));
        assert_eq!(headers.get_all(ETAG).iter().count(), 1);
        assert_ne!(headers[ETAG], "\"1a\"");
    }

    #[test]
    fn adjust_header_skips_malformed_values() {
        let mut headers = HeaderMap::new();
        headers.insert(ETAG, HeaderValue::from_static("\"not-hex\""));
        let before = headers.clone();
        assert!(!adjust_header(&mut headers, &Viewer::agent("urn:agent42")));
        assert_eq!(headers, before);

        headers.insert(ETAG, HeaderValue::from_static("unquoted"));
        let before = headers.clone();
        assert!(!adjust_header(&mut headers, &Viewer::agent("urn:agent42")));
        assert_eq!(headers, before);
    }
}
