//! Gateway request router.
//!
//! The REST surface is a fixed set of paths. A trailing slash is optional and
//! path parameters are percent-decoded:
//!
//! ```text
//! GET  /collecties/
//! GET  /vakdisciplines/
//! GET  /vakdisciplines/{discipline}/
//! GET  /objecttypegroepen/
//! GET  /beheerobjecten/
//! GET  /beheerobjecten/{object}/
//! POST /endpoint/sparql
//! GET  /query
//! GET  /health
//! ```

use percent_encoding::percent_decode_str;

use crate::dispatch::ImborOperation;
use crate::error::GatewayError;

/// Where a request should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A fixed LDP-backed REST operation.
    Operation(ImborOperation),
    /// The SPARQL pass-through endpoint; the query is read from the body.
    SparqlEndpoint,
    /// The static SPARQL query page.
    QueryUi,
    /// Liveness check.
    Health,
}

/// Resolve a route from the request method and path.
pub fn resolve_route(method: &http::Method, path: &str) -> Result<Route, GatewayError> {
    let segments = decode_segments(path)?;
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    let (allowed, route) = match segments.as_slice() {
        ["collecties"] => (
            http::Method::GET,
            Route::Operation(ImborOperation::Collections),
        ),
        ["vakdisciplines"] => (
            http::Method::GET,
            Route::Operation(ImborOperation::Disciplines),
        ),
        ["vakdisciplines", discipline] => (
            http::Method::GET,
            Route::Operation(ImborOperation::ObjectTypesPerDiscipline {
                discipline: (*discipline).to_owned(),
            }),
        ),
        ["objecttypegroepen"] => (
            http::Method::GET,
            Route::Operation(ImborOperation::ObjectTypeGroups),
        ),
        ["beheerobjecten"] => (
            http::Method::GET,
            Route::Operation(ImborOperation::ManagementObjects),
        ),
        ["beheerobjecten", object] => (
            http::Method::GET,
            Route::Operation(ImborOperation::PropertiesPerManagementObject {
                object: (*object).to_owned(),
            }),
        ),
        ["endpoint", "sparql"] => (http::Method::POST, Route::SparqlEndpoint),
        ["query"] => (http::Method::GET, Route::QueryUi),
        ["health" | "_health"] => (http::Method::GET, Route::Health),
        _ => return Err(GatewayError::not_found(path)),
    };

    if *method == allowed {
        Ok(route)
    } else {
        Err(GatewayError::method_not_allowed(method, path))
    }
}

/// Split a path into non-empty, percent-decoded segments.
fn decode_segments(path: &str) -> Result<Vec<String>, GatewayError> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            percent_decode_str(segment)
                .decode_utf8()
                .map(std::borrow::Cow::into_owned)
                .map_err(|_| GatewayError::bad_request(format!("Invalid UTF-8 in path: {path}")))
        })
        .collect()
}
