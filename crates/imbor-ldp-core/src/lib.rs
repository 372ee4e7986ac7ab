//! Signed SPARQL client and IMBOR query handlers for the LDP gateway.
//!
//! The central type is [`SparqlClient`], which signs every query with the
//! HMAC scheme from [`imbor_auth`] and sends it to the LDP endpoint:
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use imbor_ldp_core::{LdpConfig, SparqlClient};
//!
//! let config = LdpConfig::from_env()?;
//! let client = SparqlClient::new(&config)?;
//! let rows = client.select("SELECT * WHERE { ?s ?p ?o } LIMIT 1").await?;
//! println!("{rows}");
//! # Ok(())
//! # }
//! ```
//!
//! [`LdpHandler`] plugs the client into the HTTP layer from `imbor_http`.

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod jsonld;
pub mod queries;
pub mod results;

pub use client::{PreparedRequest, QueryKind, SparqlClient};
pub use config::{GatewayConfig, LdpConfig};
pub use error::{ConfigError, LdpError};
pub use handler::{LdpHandler, SparqlExecutor};
pub use jsonld::{DocumentContext, JsonLdContext};
pub use results::flatten_bindings;
