//! Signed SPARQL client for the LDP.
//!
//! Every call is a single stateless round trip:
//!
//! 1. Build the endpoint URL with `toolid`, `trace=namespaces` and, for JSON
//!    results, `output=json`, form-urlencoded in that order.
//! 2. Sign `POST` + that exact URL + the query body with the client's
//!    [`RequestSigner`].
//! 3. Send the query as `application/sparql-query`.
//! 4. Return the decoded JSON on `200 OK`, or fail with an [`LdpError`].

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use imbor_auth::{Credential, RequestSigner, SignableRequest, SigningParams};
use tracing::{debug, warn};

use crate::config::LdpConfig;
use crate::error::{ConfigError, LdpError};

/// Content type of every query sent to the LDP.
pub const SPARQL_QUERY_CONTENT_TYPE: &str = "application/sparql-query";

/// `Accept` header sent with CONSTRUCT queries.
pub const CONSTRUCT_ACCEPT: &str = "application/ld+json, text/turtle, */*";

/// The flavour of query, which decides the `output` parameter and `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// SELECT query answered as SPARQL-JSON.
    Select,
    /// CONSTRUCT query answered as JSON-LD.
    Construct,
    /// One of the gateway's fixed queries, answered as JSON.
    Run,
}

impl QueryKind {
    /// Value of the `output` query parameter, if any.
    #[must_use]
    pub fn output(self) -> Option<&'static str> {
        match self {
            Self::Select | Self::Run => Some("json"),
            Self::Construct => None,
        }
    }

    /// Value of the `Accept` header, if any.
    #[must_use]
    pub fn accept(self) -> Option<&'static str> {
        match self {
            Self::Construct => Some(CONSTRUCT_ACCEPT),
            Self::Select | Self::Run => None,
        }
    }

    /// Name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Construct => "construct",
            Self::Run => "run_query",
        }
    }
}

/// A fully signed request, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// Endpoint URL including query parameters. This exact string was signed.
    pub url: String,
    /// `Authorization` header value.
    pub authorization: String,
    /// `Content-Type` header value.
    pub content_type: String,
    /// `Accept` header value, if any.
    pub accept: Option<String>,
    /// The query text sent as the body.
    pub body: String,
}

/// Client for the LDP SPARQL endpoint.
///
/// Cheap to clone; clones share the connection pool and credential.
#[derive(Debug, Clone)]
pub struct SparqlClient {
    http: reqwest::Client,
    signer: Arc<RequestSigner>,
    base_url: reqwest::Url,
    timeout: Duration,
}

impl SparqlClient {
    /// Create a client from validated configuration.
    pub fn new(config: &LdpConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::from_credential(config.credential()?, config.timeout)
    }

    /// Create a client for `credential` with the given request timeout.
    pub fn from_credential(credential: Credential, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = reqwest::Url::parse(credential.base_url())
            .map_err(|_| ConfigError::InvalidBaseUrl(credential.base_url().to_owned()))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            signer: Arc::new(RequestSigner::new(credential)),
            base_url,
            timeout,
        })
    }

    /// The signer this client uses.
    #[must_use]
    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// The configured request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Endpoint URL for a query of the given kind.
    #[must_use]
    pub fn endpoint_url(&self, kind: QueryKind) -> reqwest::Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("toolid", self.signer.credential().tool_id());
            pairs.append_pair("trace", "namespaces");
            if let Some(output) = kind.output() {
                pairs.append_pair("output", output);
            }
        }
        url
    }

    /// Build and sign a request with a fresh timestamp and nonce.
    #[must_use]
    pub fn prepare(&self, kind: QueryKind, query: &str) -> PreparedRequest {
        self.prepare_with(kind, query, &SigningParams::generate())
    }

    /// Build and sign a request with a fixed timestamp and nonce.
    #[must_use]
    pub fn prepare_with(
        &self,
        kind: QueryKind,
        query: &str,
        params: &SigningParams,
    ) -> PreparedRequest {
        let url = self.endpoint_url(kind);
        let signable =
            SignableRequest::post(url.as_str(), query.as_bytes(), SPARQL_QUERY_CONTENT_TYPE);

        PreparedRequest {
            authorization: self.signer.compute_signature_with(params, &signable),
            url: url.into(),
            content_type: SPARQL_QUERY_CONTENT_TYPE.to_owned(),
            accept: kind.accept().map(ToOwned::to_owned),
            body: query.to_owned(),
        }
    }

    /// Send a SELECT query and return the SPARQL-JSON result.
    pub async fn select(&self, query: &str) -> Result<serde_json::Value, LdpError> {
        self.execute(QueryKind::Select, query).await
    }

    /// Send a CONSTRUCT query and return the JSON-LD result.
    pub async fn construct(&self, query: &str) -> Result<serde_json::Value, LdpError> {
        self.execute(QueryKind::Construct, query).await
    }

    /// Send one of the gateway's fixed queries and return the JSON result.
    pub async fn run_query(&self, payload: &str) -> Result<serde_json::Value, LdpError> {
        self.execute(QueryKind::Run, payload).await
    }

    /// [`select`](Self::select), abandoned as soon as `cancel` completes.
    pub async fn select_until(
        &self,
        query: &str,
        cancel: impl Future<Output = ()>,
    ) -> Result<serde_json::Value, LdpError> {
        self.execute_until(QueryKind::Select, query, cancel).await
    }

    /// [`construct`](Self::construct), abandoned as soon as `cancel` completes.
    pub async fn construct_until(
        &self,
        query: &str,
        cancel: impl Future<Output = ()>,
    ) -> Result<serde_json::Value, LdpError> {
        self.execute_until(QueryKind::Construct, query, cancel).await
    }

    /// [`run_query`](Self::run_query), abandoned as soon as `cancel` completes.
    pub async fn run_query_until(
        &self,
        payload: &str,
        cancel: impl Future<Output = ()>,
    ) -> Result<serde_json::Value, LdpError> {
        self.execute_until(QueryKind::Run, payload, cancel).await
    }

    /// Race a round trip against `cancel`.
    ///
    /// If `cancel` is already complete the request is never sent.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use imbor_auth::Credential;
    /// use imbor_ldp_core::{LdpError, QueryKind, SparqlClient};
    ///
    /// # tokio_test::block_on(async {
    /// let credential = Credential::new("c1", "t1", "secret", "http://127.0.0.1:9/sparql").unwrap();
    /// let client = SparqlClient::from_credential(credential, Duration::from_secs(5)).unwrap();
    ///
    /// let err = client
    ///     .execute_until(QueryKind::Select, "ASK {}", std::future::ready(()))
    ///     .await
    ///     .unwrap_err();
    /// assert!(matches!(err, LdpError::Cancelled));
    /// # });
    /// ```
    pub async fn execute_until(
        &self,
        kind: QueryKind,
        query: &str,
        cancel: impl Future<Output = ()>,
    ) -> Result<serde_json::Value, LdpError> {
        tokio::select! {
            biased;
            () = cancel => {
                debug!(kind = kind.as_str(), "LDP request cancelled");
                Err(LdpError::Cancelled)
            }
            result = self.execute(kind, query) => result,
        }
    }

    /// Perform one signed round trip.
    pub async fn execute(
        &self,
        kind: QueryKind,
        query: &str,
    ) -> Result<serde_json::Value, LdpError> {
        let prepared = self.prepare(kind, query);
        let started = Instant::now();
        debug!(kind = kind.as_str(), url = %prepared.url, "sending LDP query");

        let mut request = self
            .http
            .post(prepared.url.as_str())
            .header(http::header::AUTHORIZATION, prepared.authorization)
            .header(http::header::CONTENT_TYPE, prepared.content_type)
            .body(prepared.body);
        if let Some(accept) = prepared.accept {
            request = request.header(http::header::ACCEPT, accept);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LdpError::Timeout(self.timeout)
            } else {
                LdpError::InvalidResponse(format!("failed to read body: {e}"))
            }
        })?;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        if status != reqwest::StatusCode::OK {
            warn!(
                kind = kind.as_str(),
                status = status.as_u16(),
                elapsed_ms,
                "LDP query failed"
            );
            return Err(LdpError::Query {
                status: status.as_u16(),
                body: text,
            });
        }
        debug!(
            kind = kind.as_str(),
            status = status.as_u16(),
            elapsed_ms,
            bytes = text.len(),
            "LDP query succeeded"
        );

        serde_json::from_str(&text)
            .map_err(|e| LdpError::InvalidResponse(format!("body is not JSON: {e}")))
    }

    fn classify(&self, err: reqwest::Error) -> LdpError {
        if err.is_timeout() {
            LdpError::Timeout(self.timeout)
        } else {
            LdpError::Transport(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    const SELECT_BODY: &str = "SELECT * WHERE {?s ?p ?o} LIMIT 1";

    fn client(base_url: &str, timeout: Duration) -> SparqlClient {
        let credential = Credential::new("c1", "t1", "secret", base_url).unwrap();
        SparqlClient::from_credential(credential, timeout).unwrap()
    }

    /// Serve one canned response and hand back the raw request text.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });

        (format!("http://{addr}/sparql"), handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8(buf).unwrap()
    }

    fn fixed_params() -> SigningParams {
        SigningParams::new(
            "2023-01-01T00:00:00Z",
            "11111111-1111-1111-1111-111111111111",
        )
    }

    #[test]
    fn test_should_build_select_url() {
        let client = client("https://example.org/ldp", Duration::from_secs(30));
        assert_eq!(
            client.endpoint_url(QueryKind::Select).as_str(),
            "https://example.org/ldp?toolid=t1&trace=namespaces&output=json"
        );
        assert_eq!(
            client.endpoint_url(QueryKind::Run).as_str(),
            "https://example.org/ldp?toolid=t1&trace=namespaces&output=json"
        );
    }

    #[test]
    fn test_should_omit_output_for_construct() {
        let client = client("https://example.org/ldp", Duration::from_secs(30));
        assert_eq!(
            client.endpoint_url(QueryKind::Construct).as_str(),
            "https://example.org/ldp?toolid=t1&trace=namespaces"
        );
    }

    #[test]
    fn test_should_form_encode_tool_id() {
        let credential =
            Credential::new("c1", "tool id&x", "secret", "https://example.org/ldp").unwrap();
        let client = SparqlClient::from_credential(credential, Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint_url(QueryKind::Construct).as_str(),
            "https://example.org/ldp?toolid=tool+id%26x&trace=namespaces"
        );
    }

    #[test]
    fn test_should_sign_exact_url_and_body() {
        let client = client("https://example.org/ldp", Duration::from_secs(30));
        let prepared = client.prepare_with(QueryKind::Select, SELECT_BODY, &fixed_params());

        let signable = SignableRequest::post(
            &prepared.url,
            prepared.body.as_bytes(),
            SPARQL_QUERY_CONTENT_TYPE,
        );
        assert!(client.signer().verify(&prepared.authorization, &signable).is_ok());
        assert_eq!(prepared.content_type, "application/sparql-query");
        assert_eq!(prepared.accept, None);
        assert!(prepared.authorization.starts_with("HMAC clientId=\"c1\", nonce=\"11111111-"));
    }

    #[test]
    fn test_should_set_accept_for_construct() {
        let client = client("https://example.org/ldp", Duration::from_secs(30));
        let prepared = client.prepare(QueryKind::Construct, "CONSTRUCT WHERE { ?s ?p ?o }");
        assert_eq!(
            prepared.accept.as_deref(),
            Some("application/ld+json, text/turtle, */*")
        );
    }

    #[tokio::test]
    async fn test_should_return_json_on_success() {
        let (base_url, server) = serve_once("200 OK", r#"{"results":{"bindings":[]}}"#).await;
        let client = client(&base_url, Duration::from_secs(5));

        let value = client.select(SELECT_BODY).await.unwrap();
        assert_eq!(value["results"]["bindings"], serde_json::json!([]));

        let request = server.await.unwrap();
        assert!(
            request.starts_with("POST /sparql?toolid=t1&trace=namespaces&output=json HTTP/1.1")
        );
        let lower = request.to_ascii_lowercase();
        assert!(lower.contains("content-type: application/sparql-query"));
        assert!(lower.contains("authorization: hmac clientid=\"c1\""));
        assert!(!lower.contains("\r\naccept: application/ld+json"));
        assert!(request.ends_with(SELECT_BODY));
    }

    #[tokio::test]
    async fn test_should_send_accept_header_for_construct() {
        let (base_url, server) = serve_once("200 OK", r#"{"@graph":[]}"#).await;
        let client = client(&base_url, Duration::from_secs(5));

        client.construct("CONSTRUCT WHERE { ?s ?p ?o }").await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /sparql?toolid=t1&trace=namespaces HTTP/1.1"));
        assert!(
            request
                .to_ascii_lowercase()
                .contains("accept: application/ld+json, text/turtle, */*")
        );
    }

    #[tokio::test]
    async fn test_should_fail_with_query_error_on_non_200() {
        let (base_url, server) = serve_once("401 Unauthorized", "Unauthorized").await;
        let client = client(&base_url, Duration::from_secs(5));

        let err = client.run_query(SELECT_BODY).await.unwrap_err();
        match err {
            LdpError::Query { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "Unauthorized");
            }
            other => panic!("expected Query error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_should_fail_with_invalid_response_on_non_json() {
        let (base_url, server) = serve_once("200 OK", "<html>").await;
        let client = client(&base_url, Duration::from_secs(5));

        let err = client.select(SELECT_BODY).await.unwrap_err();
        assert!(matches!(err, LdpError::InvalidResponse(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_should_time_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let client = client(&format!("http://{addr}/sparql"), Duration::from_millis(100));
        let err = client.select(SELECT_BODY).await.unwrap_err();
        assert!(matches!(err, LdpError::Timeout(d) if d == Duration::from_millis(100)));
        server.abort();
    }

    #[tokio::test]
    async fn test_should_report_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(&format!("http://{addr}/sparql"), Duration::from_secs(5));
        let err = client.select(SELECT_BODY).await.unwrap_err();
        assert!(matches!(err, LdpError::Transport(_)));
    }

    #[tokio::test]
    async fn test_should_cancel_before_sending() {
        let client = client("http://127.0.0.1:9/sparql", Duration::from_secs(5));
        let err = client
            .select_until(SELECT_BODY, std::future::ready(()))
            .await
            .unwrap_err();
        assert!(matches!(err, LdpError::Cancelled));
    }

    #[tokio::test]
    async fn test_should_cancel_in_flight_request() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let client = client(&format!("http://{addr}/sparql"), Duration::from_secs(30));
        let err = client
            .construct_until(
                "CONSTRUCT WHERE { ?s ?p ?o }",
                tokio::time::sleep(Duration::from_millis(50)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LdpError::Cancelled));
        server.abort();
    }

    #[tokio::test]
    async fn test_should_run_until_when_not_cancelled() {
        let (base_url, server) = serve_once("200 OK", "[]").await;
        let client = client(&base_url, Duration::from_secs(5));

        let value = client
            .run_query_until(SELECT_BODY, std::future::pending())
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!([]));
        server.await.unwrap();
    }
}
