//! LDP client and configuration errors.

use std::time::Duration;

use imbor_auth::AuthError;
use imbor_http::GatewayError;

/// Failure of a single round trip to the LDP.
///
/// No variant is retried; each is terminal for the request that caused it.
#[derive(Debug, thiserror::Error)]
pub enum LdpError {
    /// The LDP answered with a status other than `200 OK`.
    #[error("Query failed to run by returning code of {status}. {body}")]
    Query {
        /// HTTP status returned by the LDP.
        status: u16,
        /// Response body text, verbatim.
        body: String,
    },
    /// No response arrived within the configured timeout.
    #[error("LDP request timed out after {0:?}")]
    Timeout(Duration),
    /// The caller abandoned the request before it completed.
    #[error("LDP request was cancelled")]
    Cancelled,
    /// The request could not be sent or the connection failed.
    #[error("LDP transport error: {0}")]
    Transport(#[source] reqwest::Error),
    /// A `200 OK` whose body could not be read or decoded as JSON.
    #[error("Invalid LDP response: {0}")]
    InvalidResponse(String),
}

impl LdpError {
    /// Status returned by the LDP, if the failure came from a response.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Query { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<LdpError> for GatewayError {
    fn from(err: LdpError) -> Self {
        match err {
            LdpError::Query { status, .. } => GatewayError::bad_gateway(err.to_string())
                .with_upstream_status(status)
                .with_source(err),
            LdpError::Timeout(_) => GatewayError::gateway_timeout(err.to_string()).with_source(err),
            LdpError::Cancelled => {
                GatewayError::service_unavailable(err.to_string()).with_source(err)
            }
            LdpError::Transport(_) | LdpError::InvalidResponse(_) => {
                GatewayError::bad_gateway(err.to_string()).with_source(err)
            }
        }
    }
}

/// Configuration errors; any of these aborts startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("missing required configuration `{0}`")]
    Missing(&'static str),
    /// A variable could not be parsed.
    #[error("invalid value for `{key}`: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value as provided.
        value: String,
    },
    /// The LDP base URL is not an absolute http(s) URL.
    #[error("invalid LDP base URL {0:?}: expected an absolute http or https URL")]
    InvalidBaseUrl(String),
    /// The credential could not be constructed.
    #[error("invalid credential: {0}")]
    Credential(#[from] AuthError),
    /// The outbound HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
