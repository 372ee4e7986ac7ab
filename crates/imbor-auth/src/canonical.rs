//! Canonical message construction for LDP HMAC signatures.
//!
//! The message that is signed is a comma-separated list:
//!
//! ```text
//! Method,CurrentDate,Url,Nonce[,ContentType,Md5HexOfBody]
//! ```
//!
//! The trailing content-type/digest pair is only present for `POST` requests
//! with a non-empty body. `CurrentDate` is a UTC timestamp truncated to whole
//! seconds with a literal `Z` suffix; the remote verifier compares it as text,
//! so no other ISO 8601 rendering is accepted.

use chrono::{DateTime, Utc};
use digest::Digest;
use uuid::Uuid;

/// `strftime` pattern for the signing timestamp, without the `Z` suffix.
const CURRENT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Per-request values that make a signature unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningParams {
    /// Timestamp in `YYYY-MM-DDTHH:MM:SSZ` form.
    pub current_date: String,
    /// Lowercase hyphenated UUID v4.
    pub nonce: String,
}

impl SigningParams {
    /// Generate a fresh timestamp and nonce.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            current_date: format_current_date(Utc::now()),
            nonce: Uuid::new_v4().hyphenated().to_string(),
        }
    }

    /// Use a fixed timestamp and nonce.
    #[must_use]
    pub fn new(current_date: impl Into<String>, nonce: impl Into<String>) -> Self {
        Self {
            current_date: current_date.into(),
            nonce: nonce.into(),
        }
    }
}

/// Format a UTC instant as the signing timestamp.
///
/// Sub-second precision is dropped and a literal `Z` is appended.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use imbor_auth::canonical::format_current_date;
///
/// let at = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
/// assert_eq!(format_current_date(at), "2023-01-01T00:00:00Z");
/// ```
#[must_use]
pub fn format_current_date(at: DateTime<Utc>) -> String {
    format!("{}Z", at.format(CURRENT_DATE_FORMAT))
}

/// Compute the lowercase hex MD5 digest of a request body.
///
/// # Examples
///
/// ```
/// use imbor_auth::canonical::hash_body;
///
/// assert_eq!(hash_body(b""), "d41d8cd98f00b204e9800998ecf8427e");
/// ```
#[must_use]
pub fn hash_body(body: &[u8]) -> String {
    hex::encode(md5::Md5::digest(body))
}

/// Build the canonical message that is fed to HMAC-SHA256.
///
/// `body` and `content_type` only contribute when the method is `POST` and the
/// body is non-empty. A missing content type on such a request is rendered as
/// an empty field.
///
/// # Examples
///
/// ```
/// use imbor_auth::canonical::build_string_to_sign;
///
/// let message = build_string_to_sign(
///     "GET",
///     "2023-01-01T00:00:00Z",
///     "https://example.org/ldp?toolid=t1",
///     "11111111-1111-1111-1111-111111111111",
///     None,
///     None,
/// );
/// assert_eq!(
///     message,
///     "GET,2023-01-01T00:00:00Z,https://example.org/ldp?toolid=t1,11111111-1111-1111-1111-111111111111",
/// );
/// ```
#[must_use]
pub fn build_string_to_sign(
    method: &str,
    current_date: &str,
    url: &str,
    nonce: &str,
    body: Option<&[u8]>,
    content_type: Option<&str>,
) -> String {
    let mut message = format!("{method},{current_date},{url},{nonce}");

    if method.eq_ignore_ascii_case("POST") {
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            let content_type = content_type.unwrap_or_default();
            let digest = hash_body(body);
            message.push(',');
            message.push_str(content_type);
            message.push(',');
            message.push_str(&digest);
        }
    }

    message
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const URL: &str = "https://example.org/ldp?toolid=t1";
    const NONCE: &str = "11111111-1111-1111-1111-111111111111";
    const DATE: &str = "2023-01-01T00:00:00Z";
    const QUERY: &[u8] = b"SELECT * WHERE {?s ?p ?o} LIMIT 1";

    #[test]
    fn test_should_build_post_message_with_digest() {
        let message = build_string_to_sign(
            "POST",
            DATE,
            URL,
            NONCE,
            Some(QUERY),
            Some("application/sparql-query"),
        );
        assert_eq!(
            message,
            "POST,2023-01-01T00:00:00Z,https://example.org/ldp?toolid=t1,\
             11111111-1111-1111-1111-111111111111,application/sparql-query,\
             4887fb7a50dde69ae2c9a51a366d8f68"
        );
    }

    #[test]
    fn test_should_ignore_body_for_get() {
        let message = build_string_to_sign(
            "GET",
            DATE,
            URL,
            NONCE,
            Some(QUERY),
            Some("application/sparql-query"),
        );
        assert_eq!(message, format!("GET,{DATE},{URL},{NONCE}"));
    }

    #[test]
    fn test_should_ignore_empty_post_body() {
        let message = build_string_to_sign(
            "POST",
            DATE,
            URL,
            NONCE,
            Some(b""),
            Some("application/sparql-query"),
        );
        assert_eq!(message, format!("POST,{DATE},{URL},{NONCE}"));

        let message = build_string_to_sign("POST", DATE, URL, NONCE, None, None);
        assert_eq!(message, format!("POST,{DATE},{URL},{NONCE}"));
    }

    #[test]
    fn test_should_render_missing_content_type_as_empty_field() {
        let message = build_string_to_sign("POST", DATE, URL, NONCE, Some(QUERY), None);
        assert!(message.ends_with(",,4887fb7a50dde69ae2c9a51a366d8f68"));
    }

    #[test]
    fn test_should_change_digest_when_body_changes() {
        assert_ne!(
            hash_body(b"SELECT * WHERE {?s ?p ?o} LIMIT 1"),
            hash_body(b"SELECT * WHERE {?s ?p ?o} LIMIT 2"),
        );
        assert_eq!(
            hash_body(b"SELECT * WHERE {?s ?p ?o} LIMIT 2"),
            "f1b708577a6c56a43ab8b4bff96b46ff"
        );
    }

    #[test]
    fn test_should_truncate_timestamp_to_seconds() {
        let at = Utc
            .with_ymd_and_hms(2024, 6, 30, 23, 59, 58)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(999))
            .unwrap();
        assert_eq!(format_current_date(at), "2024-06-30T23:59:58Z");
    }

    #[test]
    fn test_should_generate_well_formed_params() {
        let params = SigningParams::generate();

        let date = params.current_date.as_bytes();
        assert_eq!(date.len(), 20);
        assert_eq!(date[4], b'-');
        assert_eq!(date[10], b'T');
        assert_eq!(date[19], b'Z');
        assert!(!params.current_date.contains('+'));

        let nonce = Uuid::parse_str(&params.nonce).unwrap();
        assert_eq!(nonce.get_version_num(), 4);
        assert_eq!(params.nonce, params.nonce.to_lowercase());
        assert_eq!(params.nonce.len(), 36);
    }

    #[test]
    fn test_should_generate_distinct_nonces() {
        let a = SigningParams::generate();
        let b = SigningParams::generate();
        assert_ne!(a.nonce, b.nonce);
    }
}
