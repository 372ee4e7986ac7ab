//! HMAC request signing for the LDP SPARQL endpoint.
//!
//! The remote Linked Data Platform authenticates every request with an
//! `Authorization` header of the form:
//!
//! ```text
//! HMAC clientId="<id>", nonce="<uuid>", currentDate="<YYYY-MM-DDTHH:MM:SSZ>", signature="<base64>"
//! ```
//!
//! where the signature is `Base64(HMAC-SHA256(privateKey, message))` over the
//! comma-separated canonical message built in [`canonical`].
//!
//! # Usage
//!
//! ```rust
//! use imbor_auth::{Credential, RequestSigner, SignableRequest};
//!
//! let credential = Credential::new("client", "tool", "secret", "https://ldp.example.org/sparql")
//!     .unwrap();
//! let signer = RequestSigner::new(credential);
//!
//! let request = SignableRequest::post(
//!     "https://ldp.example.org/sparql?toolid=tool",
//!     b"SELECT * WHERE { ?s ?p ?o } LIMIT 1",
//!     "application/sparql-query",
//! );
//! let authorization = signer.compute_signature(&request);
//! assert!(authorization.starts_with("HMAC clientId=\"client\""));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Timestamp, nonce and canonical message construction
//! - [`credential`] - The immutable client credential
//! - [`error`] - Authentication error types
//! - [`header`] - `Authorization` header formatting and parsing
//! - [`signer`] - Signature computation and verification

pub mod canonical;
pub mod credential;
pub mod error;
pub mod header;
pub mod signer;

pub use canonical::{SigningParams, build_string_to_sign, hash_body};
pub use credential::Credential;
pub use error::AuthError;
pub use header::{ParsedAuthorization, parse_authorization_header};
pub use signer::{RequestSigner, SignableRequest, SignedHeaders, compute_hmac, verify_signature};
