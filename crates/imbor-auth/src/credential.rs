//! The client credential used to sign LDP requests.

use std::fmt;

use crate::error::AuthError;

/// Credential issued by the LDP operator.
///
/// All fields are validated as non-empty on construction and never change
/// afterwards. The private key is redacted from the `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    client_id: String,
    tool_id: String,
    private_key: String,
    base_url: String,
}

impl Credential {
    /// Create a credential, rejecting empty fields.
    pub fn new(
        client_id: impl Into<String>,
        tool_id: impl Into<String>,
        private_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let credential = Self {
            client_id: client_id.into(),
            tool_id: tool_id.into(),
            private_key: private_key.into(),
            base_url: base_url.into(),
        };

        for (name, value) in [
            ("client_id", &credential.client_id),
            ("tool_id", &credential.tool_id),
            ("private_key", &credential.private_key),
            ("base_url", &credential.base_url),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::EmptyCredentialField(name));
            }
        }

        Ok(credential)
    }

    /// The client identifier sent in the `Authorization` header.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The tool identifier sent as the `toolid` query parameter.
    #[must_use]
    pub fn tool_id(&self) -> &str {
        &self.tool_id
    }

    /// The shared HMAC secret.
    #[must_use]
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// The remote SPARQL endpoint URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("tool_id", &self.tool_id)
            .field("private_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}
