//! Handler bridging the HTTP layer to the signed SPARQL client.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use imbor_http::body::ImborResponseBody;
use imbor_http::dispatch::{ImborHandler, ImborOperation};
use imbor_http::error::GatewayError;
use imbor_http::response::{JSON_CONTENT_TYPE, JSON_LD_CONTENT_TYPE, value_response};

use crate::client::SparqlClient;
use crate::error::LdpError;
use crate::jsonld::{DocumentContext, JsonLdContext};
use crate::queries;
use crate::results::flatten_bindings;

/// Executes SPARQL against the LDP.
///
/// Implemented by [`SparqlClient`]; the trait lets the handler run against
/// an in-memory double in tests.
#[async_trait]
pub trait SparqlExecutor: Send + Sync + 'static {
    /// Run a user-supplied SELECT query.
    async fn select(&self, query: &str) -> Result<Value, LdpError>;

    /// Run one of the gateway's fixed queries.
    async fn run_query(&self, payload: &str) -> Result<Value, LdpError>;
}

#[async_trait]
impl SparqlExecutor for SparqlClient {
    async fn select(&self, query: &str) -> Result<Value, LdpError> {
        SparqlClient::select(self, query).await
    }

    async fn run_query(&self, payload: &str) -> Result<Value, LdpError> {
        SparqlClient::run_query(self, payload).await
    }
}

/// Handler that answers gateway operations by querying the LDP.
#[derive(Debug)]
pub struct LdpHandler<E: SparqlExecutor = SparqlClient> {
    executor: Arc<E>,
    context: Arc<JsonLdContext>,
}

impl<E: SparqlExecutor> LdpHandler<E> {
    /// Create a new handler wrapping an executor.
    #[must_use]
    pub fn new(executor: Arc<E>) -> Self {
        Self {
            executor,
            context: Arc::new(JsonLdContext::beheerobject()),
        }
    }
}

impl<E: SparqlExecutor> ImborHandler for LdpHandler<E> {
    fn handle_operation(
        &self,
        op: ImborOperation,
    ) -> Pin<
        Box<dyn Future<Output = Result<http::Response<ImborResponseBody>, GatewayError>> + Send>,
    > {
        let executor = Arc::clone(&self.executor);
        let context = Arc::clone(&self.context);
        Box::pin(async move { dispatch(executor.as_ref(), &context, op).await })
    }
}

/// Dispatch an operation to the appropriate query.
async fn dispatch<E: SparqlExecutor>(
    executor: &E,
    context: &JsonLdContext,
    op: ImborOperation,
) -> Result<http::Response<ImborResponseBody>, GatewayError> {
    let query = match op {
        ImborOperation::SparqlSelect { query } => {
            let result = executor.select(&query).await?;
            return value_response(&result, JSON_CONTENT_TYPE);
        }
        ImborOperation::ManagementObjects => {
            let result = executor.run_query(&queries::management_objects()).await?;
            let input = DocumentContext::from_document(&result);
            let nodes: Vec<Value> = as_nodes(result)
                .iter()
                .map(|node| context.compact(&input.expand(node)))
                .collect();
            return value_response(&Value::Array(nodes), JSON_LD_CONTENT_TYPE);
        }
        ImborOperation::Collections => queries::collections(),
        ImborOperation::Disciplines => queries::disciplines(),
        ImborOperation::ObjectTypeGroups => queries::object_type_groups(),
        ImborOperation::ObjectTypesPerDiscipline { discipline } => {
            queries::object_types_per_discipline(&discipline)
        }
        ImborOperation::PropertiesPerManagementObject { object } => {
            queries::properties_per_management_object(&object)
        }
    };

    let result = executor.run_query(&query).await?;
    value_response(&flatten_bindings(result), JSON_CONTENT_TYPE)
}

/// Split a JSON-LD result into its top-level nodes.
fn as_nodes(result: Value) -> Vec<Value> {
    match result {
        Value::Array(nodes) => nodes,
        Value::Object(mut map) => match map.remove("@graph") {
            Some(Value::Array(nodes)) => nodes,
            Some(other) => vec![other],
            None => vec![Value::Object(map)],
        },
        other => vec![other],
    }
}
