//! SPARQL-JSON result flattening.

use serde_json::{Map, Value};

/// Flatten a SPARQL-JSON result into an array of `{variable: value}` objects.
///
/// Each binding's RDF term is reduced to its lexical `value`; unbound
/// variables are left out. Anything that is not a SPARQL-JSON result set
/// (for example a JSON-LD document or an `ASK` answer) is returned unchanged.
///
/// # Examples
///
/// ```
/// use imbor_ldp_core::results::flatten_bindings;
/// use serde_json::json;
///
/// let raw = json!({
///     "head": {"vars": ["naam"]},
///     "results": {"bindings": [{"naam": {"type": "literal", "value": "Groen"}}]}
/// });
/// assert_eq!(flatten_bindings(raw), json!([{"naam": "Groen"}]));
/// ```
#[must_use]
pub fn flatten_bindings(value: Value) -> Value {
    let Some(bindings) = value
        .get("results")
        .and_then(|r| r.get("bindings"))
        .and_then(Value::as_array)
    else {
        return value;
    };

    let rows = bindings
        .iter()
        .filter_map(Value::as_object)
        .map(|binding| {
            binding
                .iter()
                .filter_map(|(var, term)| {
                    term.get("value").map(|v| (var.clone(), v.clone()))
                })
                .collect::<Map<String, Value>>()
        })
        .map(Value::Object)
        .collect();

    Value::Array(rows)
}
