//! Extraction of the SPARQL query from a request body.
//!
//! `POST /endpoint/sparql` accepts the query either as the `query` field of an
//! `application/x-www-form-urlencoded` body, or, following the SPARQL 1.1
//! protocol, as a raw `application/sparql-query` body.

use crate::error::GatewayError;

/// The form field that carries the query.
pub const QUERY_FIELD: &str = "query";

/// Content type of a raw SPARQL query body.
pub const SPARQL_QUERY_CONTENT_TYPE: &str = "application/sparql-query";

/// Find the first value of `name` in a urlencoded form body.
#[must_use]
pub fn form_field(body: &[u8], name: &str) -> Option<String> {
    form_urlencoded::parse(body)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Pull the SPARQL query out of a request body.
pub fn extract_query(content_type: Option<&str>, body: &[u8]) -> Result<String, GatewayError> {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .unwrap_or_default();

    let query = if mime.eq_ignore_ascii_case(SPARQL_QUERY_CONTENT_TYPE) {
        String::from_utf8(body.to_vec())
            .map_err(|_| GatewayError::bad_request("SPARQL query is not valid UTF-8"))?
    } else {
        form_field(body, QUERY_FIELD).ok_or_else(|| {
            GatewayError::bad_request(format!("Missing form field `{QUERY_FIELD}`"))
        })?
    };

    if query.trim().is_empty() {
        return Err(GatewayError::bad_request("SPARQL query is empty"));
    }

    Ok(query)
}
