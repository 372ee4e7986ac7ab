//! Authentication error types.

/// Errors produced while building credentials or checking signatures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// A credential field was empty.
    #[error("credential field `{0}` must not be empty")]
    EmptyCredentialField(&'static str),

    /// The `Authorization` header could not be parsed.
    #[error("invalid Authorization header")]
    InvalidAuthHeader,

    /// The `Authorization` header uses a scheme other than `HMAC`.
    #[error("unsupported authorization scheme: {0}")]
    UnsupportedScheme(String),

    /// The header was signed by a different client.
    #[error("unknown client id: {0}")]
    UnknownClient(String),

    /// The recomputed signature differs from the provided one.
    #[error("the request signature does not match")]
    SignatureDoesNotMatch,
}
