//! `Authorization` header formatting and parsing.
//!
//! Format (field order and quoting are fixed; the remote parses it literally):
//!
//! ```text
//! HMAC clientId="<id>", nonce="<nonce>", currentDate="<date>", signature="<base64>"
//! ```

use crate::error::AuthError;

/// The authorization scheme name.
pub const SCHEME: &str = "HMAC";

/// Components of an HMAC `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAuthorization {
    /// The client identifier.
    pub client_id: String,
    /// The per-request nonce.
    pub nonce: String,
    /// The signing timestamp.
    pub current_date: String,
    /// The base64-encoded HMAC-SHA256 signature.
    pub signature: String,
}

impl ParsedAuthorization {
    /// Render the header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        format_authorization(
            &self.client_id,
            &self.nonce,
            &self.current_date,
            &self.signature,
        )
    }
}

/// Render an `Authorization` header value.
#[must_use]
pub fn format_authorization(
    client_id: &str,
    nonce: &str,
    current_date: &str,
    signature: &str,
) -> String {
    format!(
        "{SCHEME} clientId=\"{client_id}\", nonce=\"{nonce}\", currentDate=\"{current_date}\", signature=\"{signature}\""
    )
}

/// Parse an HMAC `Authorization` header value.
///
/// # Errors
///
/// Returns [`AuthError::UnsupportedScheme`] for non-`HMAC` schemes and
/// [`AuthError::InvalidAuthHeader`] when a field is missing, unquoted or empty.
pub fn parse_authorization_header(header: &str) -> Result<ParsedAuthorization, AuthError> {
    let (scheme, rest) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;

    if scheme != SCHEME {
        return Err(AuthError::UnsupportedScheme(scheme.to_owned()));
    }

    let mut client_id = None;
    let mut nonce = None;
    let mut current_date = None;
    let mut signature = None;

    for part in rest.split(',') {
        let (key, value) = part
            .trim()
            .split_once('=')
            .ok_or(AuthError::InvalidAuthHeader)?;
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::InvalidAuthHeader)?;

        match key {
            "clientId" => client_id = Some(value),
            "nonce" => nonce = Some(value),
            "currentDate" => current_date = Some(value),
            "signature" => signature = Some(value),
            _ => {}
        }
    }

    Ok(ParsedAuthorization {
        client_id: client_id.ok_or(AuthError::InvalidAuthHeader)?.to_owned(),
        nonce: nonce.ok_or(AuthError::InvalidAuthHeader)?.to_owned(),
        current_date: current_date.ok_or(AuthError::InvalidAuthHeader)?.to_owned(),
        signature: signature.ok_or(AuthError::InvalidAuthHeader)?.to_owned(),
    })
}
