//! HMAC-SHA256 request signing and verification.
//!
//! Signing a request:
//!
//! 1. Generate a fresh [`SigningParams`] (timestamp + nonce).
//! 2. Build the canonical message with [`build_string_to_sign`].
//! 3. Compute `Base64(HMAC-SHA256(privateKey, message))`.
//! 4. Render the `Authorization` header.
//!
//! Verification parses the header, rebuilds the message from the parsed
//! timestamp and nonce, and compares signatures in constant time.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::{SigningParams, build_string_to_sign};
use crate::credential::Credential;
use crate::error::AuthError;
use crate::header::{ParsedAuthorization, format_authorization, parse_authorization_header};

type HmacSha256 = Hmac<Sha256>;

/// A request as seen by the signer.
#[derive(Debug, Clone)]
pub struct SignableRequest<'a> {
    /// HTTP method.
    pub method: http::Method,
    /// Full request URL including the query string, exactly as sent.
    pub url: &'a str,
    /// Request body, if any.
    pub body: Option<&'a [u8]>,
    /// Value of the `Content-Type` header, if any.
    pub content_type: Option<&'a str>,
}

impl<'a> SignableRequest<'a> {
    /// A bodyless `GET` request.
    #[must_use]
    pub fn get(url: &'a str) -> Self {
        Self {
            method: http::Method::GET,
            url,
            body: None,
            content_type: None,
        }
    }

    /// A `POST` request with a body.
    #[must_use]
    pub fn post(url: &'a str, body: &'a [u8], content_type: &'a str) -> Self {
        Self {
            method: http::Method::POST,
            url,
            body: Some(body),
            content_type: Some(content_type),
        }
    }

    /// The canonical message for the given timestamp and nonce.
    #[must_use]
    pub fn string_to_sign(&self, params: &SigningParams) -> String {
        build_string_to_sign(
            self.method.as_str(),
            &params.current_date,
            self.url,
            &params.nonce,
            self.body,
            self.content_type,
        )
    }
}

/// Headers to attach to a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// The `Authorization` header value.
    pub authorization: String,
    /// The `Content-Type` header value, if the request carries a body.
    pub content_type: Option<String>,
    /// The `Accept` header value, if content negotiation is requested.
    pub accept: Option<String>,
}

/// Signs requests on behalf of one [`Credential`].
///
/// The signer holds no mutable state; every call generates its own timestamp
/// and nonce, so one instance can be shared across tasks.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credential: Credential,
}

impl RequestSigner {
    /// Create a signer owning the given credential.
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    /// The credential this signer uses.
    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Compute the `Authorization` header value with a fresh timestamp and nonce.
    #[must_use]
    pub fn compute_signature(&self, request: &SignableRequest<'_>) -> String {
        self.compute_signature_with(&SigningParams::generate(), request)
    }

    /// Compute the `Authorization` header value with a fixed timestamp and nonce.
    #[must_use]
    pub fn compute_signature_with(
        &self,
        params: &SigningParams,
        request: &SignableRequest<'_>,
    ) -> String {
        let message = request.string_to_sign(params);
        debug!(
            method = %request.method,
            url = request.url,
            nonce = %params.nonce,
            current_date = %params.current_date,
            "signing LDP request"
        );

        let signature = compute_hmac(self.credential.private_key().as_bytes(), &message);
        format_authorization(
            self.credential.client_id(),
            &params.nonce,
            &params.current_date,
            &signature,
        )
    }

    /// Sign a request and collect the headers it must carry.
    #[must_use]
    pub fn sign(&self, request: &SignableRequest<'_>, accept: Option<&str>) -> SignedHeaders {
        SignedHeaders {
            authorization: self.compute_signature(request),
            content_type: request.content_type.map(ToOwned::to_owned),
            accept: accept.map(ToOwned::to_owned),
        }
    }

    /// Verify a header produced for this signer's credential.
    pub fn verify(
        &self,
        header: &str,
        request: &SignableRequest<'_>,
    ) -> Result<ParsedAuthorization, AuthError> {
        let parsed = parse_authorization_header(header)?;
        if parsed.client_id != self.credential.client_id() {
            return Err(AuthError::UnknownClient(parsed.client_id));
        }
        verify_signature(header, self.credential.private_key(), request)
    }
}

/// Compute `Base64(HMAC-SHA256(key, message))`.
///
/// # Examples
///
/// ```
/// use imbor_auth::compute_hmac;
///
/// assert_eq!(
///     compute_hmac(b"key", "The quick brown fox jumps over the lazy dog"),
///     "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg=",
/// );
/// ```
#[must_use]
pub fn compute_hmac(key: &[u8], message: &str) -> String {
    let mut mac =
        <HmacSha256 as KeyInit>::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(message.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Verify an `Authorization` header against a request and private key.
///
/// The canonical message is rebuilt from the timestamp and nonce carried in
/// the header, then compared in constant time.
pub fn verify_signature(
    header: &str,
    private_key: &str,
    request: &SignableRequest<'_>,
) -> Result<ParsedAuthorization, AuthError> {
    let parsed = parse_authorization_header(header)?;
    let params = SigningParams::new(parsed.current_date.clone(), parsed.nonce.clone());
    let expected = compute_hmac(private_key.as_bytes(), &request.string_to_sign(&params));

    if parsed
        .signature
        .as_bytes()
        .ct_eq(expected.as_bytes())
        .into()
    {
        debug!(client_id = %parsed.client_id, "HMAC verification succeeded");
        Ok(parsed)
    } else {
        debug!(
            expected = %expected,
            provided = %parsed.signature,
            "HMAC signature mismatch"
        );
        Err(AuthError::SignatureDoesNotMatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.org/ldp?toolid=t1";
    const NONCE: &str = "11111111-1111-1111-1111-111111111111";
    const DATE: &str = "2023-01-01T00:00:00Z";
    const QUERY: &[u8] = b"SELECT * WHERE {?s ?p ?o} LIMIT 1";
    const SPARQL: &str = "application/sparql-query";

    fn test_signer() -> RequestSigner {
        RequestSigner::new(
            Credential::new("client", "t1", "secret", "https://example.org/ldp").unwrap(),
        )
    }

    fn fixed_params() -> SigningParams {
        SigningParams::new(DATE, NONCE)
    }

    #[test]
    fn test_should_sign_post_matching_reference_vector() {
        let signer = test_signer();
        let header = signer
            .compute_signature_with(&fixed_params(), &SignableRequest::post(URL, QUERY, SPARQL));
        assert_eq!(
            header,
            "HMAC clientId=\"client\", nonce=\"11111111-1111-1111-1111-111111111111\", \
             currentDate=\"2023-01-01T00:00:00Z\", \
             signature=\"P6wKGpW1ObNgEXg0G5Ibz6LFMM2x30yGtm6tvwCZoOg=\""
        );
    }

    #[test]
    fn test_should_sign_get_matching_reference_vector() {
        let signer = test_signer();
        let header = signer.compute_signature_with(&fixed_params(), &SignableRequest::get(URL));
        let parsed = parse_authorization_header(&header).unwrap();
        assert_eq!(
            parsed.signature,
            "GaplkFiUc8rMsFWyZ3+y7ky6mNs6ELsstdV4ghOE54k="
        );
    }

    #[test]
    fn test_should_be_deterministic_for_fixed_params() {
        let signer = test_signer();
        let request = SignableRequest::post(URL, QUERY, SPARQL);
        assert_eq!(
            signer.compute_signature_with(&fixed_params(), &request),
            signer.compute_signature_with(&fixed_params(), &request),
        );
    }

    #[test]
    fn test_should_ignore_body_on_get() {
        let signer = test_signer();
        let bare = SignableRequest::get(URL);
        let with_body = SignableRequest {
            body: Some(QUERY),
            content_type: Some(SPARQL),
            ..bare.clone()
        };
        assert_eq!(
            signer.compute_signature_with(&fixed_params(), &bare),
            signer.compute_signature_with(&fixed_params(), &with_body),
        );
    }

    #[test]
    fn test_should_ignore_content_type_on_empty_post() {
        let signer = test_signer();
        let empty = SignableRequest::post(URL, b"", SPARQL);
        let other_type = SignableRequest::post(URL, b"", "text/plain");
        assert_eq!(
            signer.compute_signature_with(&fixed_params(), &empty),
            signer.compute_signature_with(&fixed_params(), &other_type),
        );
    }

    #[test]
    fn test_should_change_signature_when_one_body_byte_changes() {
        let signer = test_signer();
        let a = signer.compute_signature_with(
            &fixed_params(),
            &SignableRequest::post(URL, b"SELECT * WHERE {?s ?p ?o} LIMIT 1", SPARQL),
        );
        let b = signer.compute_signature_with(
            &fixed_params(),
            &SignableRequest::post(URL, b"SELECT * WHERE {?s ?p ?o} LIMIT 2", SPARQL),
        );
        assert_ne!(a, b);
    }

    #[test]
    fn test_should_use_fresh_params_per_call() {
        let signer = test_signer();
        let request = SignableRequest::get(URL);
        let a = parse_authorization_header(&signer.compute_signature(&request)).unwrap();
        let b = parse_authorization_header(&signer.compute_signature(&request)).unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn test_should_verify_own_signature() {
        let signer = test_signer();
        let request = SignableRequest::post(URL, QUERY, SPARQL);
        let header = signer.compute_signature(&request);

        let parsed = signer.verify(&header, &request).unwrap();
        assert_eq!(parsed.client_id, "client");

        let recomputed = compute_hmac(
            b"secret",
            &request.string_to_sign(&SigningParams::new(&parsed.current_date, &parsed.nonce)),
        );
        assert_eq!(recomputed, parsed.signature);
    }

    #[test]
    fn test_should_fail_verification_after_tampering() {
        let signer = test_signer();
        let request = SignableRequest::post(URL, QUERY, SPARQL);
        let header = signer.compute_signature(&request);

        let tampered = SignableRequest::post(URL, b"SELECT * WHERE {?s ?p ?o} LIMIT 2", SPARQL);
        assert_eq!(
            signer.verify(&header, &tampered).unwrap_err(),
            AuthError::SignatureDoesNotMatch,
        );
        assert_eq!(
            verify_signature(&header, "other-secret", &request).unwrap_err(),
            AuthError::SignatureDoesNotMatch,
        );
    }

    #[test]
    fn test_should_reject_foreign_client() {
        let signer = test_signer();
        let other =
            RequestSigner::new(Credential::new("intruder", "t1", "secret", "https://x").unwrap());
        let request = SignableRequest::get(URL);
        let header = other.compute_signature(&request);
        assert!(matches!(
            signer.verify(&header, &request),
            Err(AuthError::UnknownClient(id)) if id == "intruder"
        ));
    }

    #[test]
    fn test_should_collect_signed_headers() {
        let signer = test_signer();
        let headers = signer.sign(
            &SignableRequest::post(URL, QUERY, SPARQL),
            Some("application/ld+json"),
        );
        assert!(headers.authorization.starts_with("HMAC clientId=\"client\""));
        assert_eq!(headers.content_type.as_deref(), Some(SPARQL));
        assert_eq!(headers.accept.as_deref(), Some("application/ld+json"));
    }

    #[test]
    fn test_should_be_shareable_across_threads() {
        let signer = std::sync::Arc::new(test_signer());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let signer = std::sync::Arc::clone(&signer);
                std::thread::spawn(move || {
                    let request = SignableRequest::get(URL);
                    let header = signer.compute_signature(&request);
                    signer.verify(&header, &request).map(|p| p.nonce)
                })
            })
            .collect();

        let mut nonces: Vec<String> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        nonces.sort();
        nonces.dedup();
        assert_eq!(nonces.len(), 4);
    }
}
