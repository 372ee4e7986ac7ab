//! Static SPARQL query page served at `GET /query`.
//!
//! The page embeds the YASGUI editor and points it at this gateway's
//! `/endpoint/sparql` route, so the base URL is derived from the request.

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="nl">
<head>
  <meta charset="utf-8">
  <title>IMBOR SPARQL</title>
  <link href="https://unpkg.com/@triply/yasgui@4/build/yasgui.min.css" rel="stylesheet" type="text/css" />
  <script src="https://unpkg.com/@triply/yasgui@4/build/yasgui.min.js"></script>
  <style>.yasgui .autocompleteWrapper { display: none !important; }</style>
</head>
<body>
  <div id="yasgui"></div>
  <script>
    const yasgui = new Yasgui(document.getElementById("yasgui"), {
      requestConfig: { endpoint: "{{BASE_URL}}endpoint/sparql", method: "POST" },
      copyEndpointOnNewTab: false,
    });
  </script>
</body>
</html>
"#;

/// Base URL (`scheme://host/`) of the gateway as seen by the client.
#[must_use]
pub fn base_url_from_headers(headers: &http::HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let scheme = header("x-forwarded-proto").unwrap_or("http");
    let host = header("x-forwarded-host")
        .or_else(|| header("host"))
        .unwrap_or("localhost");

    format!("{scheme}://{host}/")
}

/// Render the query page for `base_url`.
#[must_use]
pub fn render_query_page(base_url: &str) -> String {
    PAGE_TEMPLATE.replace("{{BASE_URL}}", &escape_js_string(base_url))
}

fn escape_js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '\n' | '\r' => {}
            c => out.push(c),
        }
    }
    out
}
