//! Gateway configuration.
//!
//! Provides [`LdpConfig`] for the remote LDP connection and [`GatewayConfig`]
//! for the inbound HTTP surface. Both are loaded from environment variables
//! at startup and validated into typed structs.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use typed_builder::TypedBuilder;

use imbor_auth::Credential;

use crate::error::ConfigError;

/// Default outbound request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the remote LDP SPARQL endpoint.
///
/// # Examples
///
/// ```
/// use imbor_ldp_core::config::LdpConfig;
///
/// let config = LdpConfig::builder()
///     .client_id("client")
///     .tool_id("tool")
///     .private_key("secret")
///     .base_url("https://ldp.example.org/sparql")
///     .build();
/// assert_eq!(config.timeout.as_secs(), 30);
/// ```
#[derive(Clone, TypedBuilder)]
pub struct LdpConfig {
    /// HMAC client id.
    #[builder(setter(into))]
    pub client_id: String,
    /// Tool id sent as the `toolid` query parameter.
    #[builder(setter(into))]
    pub tool_id: String,
    /// HMAC secret.
    #[builder(setter(into))]
    pub private_key: String,
    /// Remote SPARQL endpoint.
    #[builder(setter(into))]
    pub base_url: String,
    /// Outbound request timeout.
    #[builder(default = Duration::from_secs(DEFAULT_TIMEOUT_SECS))]
    pub timeout: Duration,
}

impl fmt::Debug for LdpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdpConfig")
            .field("client_id", &self.client_id)
            .field("tool_id", &self.tool_id)
            .field("private_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LdpConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `LDP_CLIENT_ID` | required |
    /// | `LDP_TOOL_ID` | required |
    /// | `LDP_PRIVATE_KEY` | required |
    /// | `LDP_BASE_URL` | required |
    /// | `LDP_TIMEOUT_SECS` | `30` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let config = Self {
            client_id: required("LDP_CLIENT_ID")?,
            tool_id: required("LDP_TOOL_ID")?,
            private_key: required("LDP_PRIVATE_KEY")?,
            base_url: required("LDP_BASE_URL")?,
            timeout: Duration::from_secs(parse_number(
                &lookup,
                "LDP_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the base URL is an absolute http(s) URL and the timeout is positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|_| ConfigError::InvalidBaseUrl(self.base_url.clone()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "LDP_TIMEOUT_SECS",
                value: "0".to_owned(),
            });
        }
        Ok(())
    }

    /// Build the signing credential.
    pub fn credential(&self) -> Result<Credential, ConfigError> {
        Credential::new(
            self.client_id.clone(),
            self.tool_id.clone(),
            self.private_key.clone(),
            self.base_url.clone(),
        )
        .map_err(ConfigError::Credential)
    }
}

/// Inbound HTTP settings for the gateway server.
///
/// # Examples
///
/// ```
/// use imbor_ldp_core::config::GatewayConfig;
///
/// let config = GatewayConfig::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:5000");
/// assert!(!config.cors);
/// ```
#[derive(Debug, Clone, Serialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Bind address for the gateway.
    #[builder(default = String::from("0.0.0.0:5000"))]
    pub gateway_listen: String,

    /// Whether permissive CORS is enabled.
    #[builder(default = false)]
    pub cors: bool,

    /// Largest accepted `POST /endpoint/sparql` body in bytes.
    #[builder(default = 1_048_576)]
    pub max_query_bytes: usize,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gateway_listen: String::from("0.0.0.0:5000"),
            cors: false,
            max_query_bytes: 1_048_576,
            log_level: String::from("info"),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:5000` |
    /// | `CORS` | `false` |
    /// | `MAX_QUERY_BYTES` | `1048576` |
    /// | `LOG_LEVEL` | `info` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// The effective settings as camelCase JSON, logged at startup.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("CORS") {
            config.cors = parse_bool(&v);
        }
        config.max_query_bytes =
            parse_number(&lookup, "MAX_QUERY_BYTES", config.max_query_bytes as u64)?
                .try_into()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "MAX_QUERY_BYTES",
                    value: lookup("MAX_QUERY_BYTES").unwrap_or_default(),
                })?;
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue { key, value: v }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const LDP_VARS: &[(&str, &str)] = &[
        ("LDP_CLIENT_ID", "client"),
        ("LDP_TOOL_ID", "tool"),
        ("LDP_PRIVATE_KEY", "secret"),
        ("LDP_BASE_URL", "https://ldp.example.org/sparql"),
    ];

    #[test]
    fn test_should_load_ldp_config_with_default_timeout() {
        let config = LdpConfig::from_lookup(lookup(LDP_VARS)).unwrap();
        assert_eq!(config.client_id, "client");
        assert_eq!(config.tool_id, "tool");
        assert_eq!(config.base_url, "https://ldp.example.org/sparql");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    fn ldp_vars_with(
        key: &'static str,
        value: Option<&'static str>,
    ) -> Vec<(&'static str, &'static str)> {
        let mut vars: Vec<_> = LDP_VARS.iter().copied().filter(|(k, _)| *k != key).collect();
        if let Some(value) = value {
            vars.push((key, value));
        }
        vars
    }

    #[test]
    fn test_should_report_missing_required_field() {
        let err =
            LdpConfig::from_lookup(lookup(&ldp_vars_with("LDP_PRIVATE_KEY", None))).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("LDP_PRIVATE_KEY")));
    }

    #[test]
    fn test_should_treat_blank_value_as_missing() {
        let vars = ldp_vars_with("LDP_CLIENT_ID", Some("  "));
        let err = LdpConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("LDP_CLIENT_ID")));
    }

    #[test]
    fn test_should_reject_non_http_base_url() {
        let vars = ldp_vars_with("LDP_BASE_URL", Some("ftp://ldp.example.org"));
        let err = LdpConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));

        let vars = ldp_vars_with("LDP_BASE_URL", Some("not a url"));
        let err = LdpConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));
    }

    #[test]
    fn test_should_reject_invalid_timeout() {
        let vars = ldp_vars_with("LDP_TIMEOUT_SECS", Some("soon"));
        let err = LdpConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "LDP_TIMEOUT_SECS",
                ..
            }
        ));

        let vars = ldp_vars_with("LDP_TIMEOUT_SECS", Some("0"));
        assert!(LdpConfig::from_lookup(lookup(&vars)).is_err());

        let vars = ldp_vars_with("LDP_TIMEOUT_SECS", Some("5"));
        let config = LdpConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_should_redact_private_key_in_debug() {
        let config = LdpConfig::from_lookup(lookup(LDP_VARS)).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_should_build_credential() {
        let config = LdpConfig::from_lookup(lookup(LDP_VARS)).unwrap();
        let credential = config.credential().unwrap();
        assert_eq!(credential.client_id(), "client");
        assert_eq!(credential.private_key(), "secret");
    }

    #[test]
    fn test_should_load_gateway_defaults() {
        let config = GatewayConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.gateway_listen, "0.0.0.0:5000");
        assert!(!config.cors);
        assert_eq!(config.max_query_bytes, 1_048_576);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_should_load_gateway_overrides() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("GATEWAY_LISTEN", "127.0.0.1:8080"),
            ("CORS", "True"),
            ("MAX_QUERY_BYTES", "2048"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.gateway_listen, "127.0.0.1:8080");
        assert!(config.cors);
        assert_eq!(config.max_query_bytes, 2048);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_should_render_gateway_config_as_camel_case_json() {
        let config = GatewayConfig::builder().cors(true).build();
        assert_eq!(
            config.to_json(),
            serde_json::json!({
                "gatewayListen": "0.0.0.0:5000",
                "cors": true,
                "maxQueryBytes": 1_048_576,
                "logLevel": "info"
            })
        );
    }

    #[test]
    fn test_should_reject_invalid_max_query_bytes() {
        let err = GatewayConfig::from_lookup(lookup(&[("MAX_QUERY_BYTES", "lots")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "MAX_QUERY_BYTES",
                ..
            }
        ));
    }

    #[test]
    fn test_should_parse_bool_values() {
        for v in ["1", "true", "TRUE", "yes", "on"] {
            assert!(parse_bool(v), "{v}");
        }
        for v in ["0", "false", "no", ""] {
            assert!(!parse_bool(v), "{v}");
        }
    }
}
