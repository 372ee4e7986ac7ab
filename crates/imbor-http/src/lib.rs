//! HTTP service layer for the IMBOR LDP gateway.
//!
//! This crate turns incoming HTTP requests into [`ImborOperation`]s and
//! renders their results, providing:
//!
//! - **Router**: Maps method + path onto a [`Route`]
//! - **Handler trait**: Defines the boundary between HTTP and the LDP client
//! - **Service**: Hyper `Service` implementation with payload cap and CORS
//! - **Response helpers**: JSON success/error response formatting
#![allow(missing_docs)]

pub mod body;
pub mod dispatch;
pub mod error;
pub mod form;
pub mod response;
pub mod router;
pub mod service;
pub mod ui;

pub use body::ImborResponseBody;
pub use dispatch::{ImborHandler, ImborOperation};
pub use error::{GatewayError, GatewayErrorCode};
pub use router::Route;
pub use service::{ImborHttpConfig, ImborHttpService};
