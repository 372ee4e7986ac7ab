//! Gateway handler trait and operation dispatch.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::body::ImborResponseBody;
use crate::error::GatewayError;

/// An operation the gateway forwards to the LDP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImborOperation {
    /// `GET /collecties/`
    Collections,
    /// `GET /vakdisciplines/`
    Disciplines,
    /// `GET /objecttypegroepen/`
    ObjectTypeGroups,
    /// `GET /vakdisciplines/{discipline}/`
    ObjectTypesPerDiscipline {
        /// Discipline label, percent-decoded.
        discipline: String,
    },
    /// `GET /beheerobjecten/`
    ManagementObjects,
    /// `GET /beheerobjecten/{object}/`
    PropertiesPerManagementObject {
        /// Management object label, percent-decoded.
        object: String,
    },
    /// `POST /endpoint/sparql`
    SparqlSelect {
        /// The SPARQL query text.
        query: String,
    },
}

impl ImborOperation {
    /// Operation name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collections => "Collections",
            Self::Disciplines => "Disciplines",
            Self::ObjectTypeGroups => "ObjectTypeGroups",
            Self::ObjectTypesPerDiscipline { .. } => "ObjectTypesPerDiscipline",
            Self::ManagementObjects => "ManagementObjects",
            Self::PropertiesPerManagementObject { .. } => "PropertiesPerManagementObject",
            Self::SparqlSelect { .. } => "SparqlSelect",
        }
    }
}

impl fmt::Display for ImborOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait that the LDP-backed business logic must implement.
///
/// The handler receives a parsed operation and returns a complete HTTP
/// response. This trait is the boundary between the HTTP transport layer and
/// the signed LDP client.
pub trait ImborHandler: Send + Sync + 'static {
    /// Handle an operation and produce an HTTP response.
    fn handle_operation(
        &self,
        op: ImborOperation,
    ) -> Pin<
        Box<dyn Future<Output = Result<http::Response<ImborResponseBody>, GatewayError>> + Send>,
    >;
}

/// Dispatch an operation to the handler.
pub async fn dispatch_operation<H: ImborHandler>(
    handler: &H,
    op: ImborOperation,
) -> Result<http::Response<ImborResponseBody>, GatewayError> {
    tracing::debug!(operation = %op, "dispatching gateway operation");
    handler.handle_operation(op).await
}
