//! IMBOR Server - REST gateway in front of the IMBOR Linked Data Platform.
//!
//! Exposes the IMBOR/OTL vocabulary as plain REST resources and a SPARQL
//! pass-through endpoint. Every outbound query is signed with the configured
//! HMAC credential.
//!
//! # Usage
//!
//! ```text
//! LDP_CLIENT_ID=.. LDP_TOOL_ID=.. LDP_PRIVATE_KEY=.. LDP_BASE_URL=https://.. imbor-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LDP_CLIENT_ID` | *(required)* | HMAC client id |
//! | `LDP_TOOL_ID` | *(required)* | Tool id sent as `toolid` |
//! | `LDP_PRIVATE_KEY` | *(required)* | HMAC secret |
//! | `LDP_BASE_URL` | *(required)* | Remote SPARQL endpoint |
//! | `LDP_TIMEOUT_SECS` | `30` | Outbound request timeout |
//! | `GATEWAY_LISTEN` | `0.0.0.0:5000` | Bind address |
//! | `CORS` | `false` | Permissive CORS headers |
//! | `MAX_QUERY_BYTES` | `1048576` | Cap on `POST /endpoint/sparql` bodies |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `json` for structured log lines |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use imbor_http::{ImborHttpConfig, ImborHttpService};
use imbor_ldp_core::{GatewayConfig, LdpConfig, LdpHandler, SparqlClient};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

/// Build the [`ImborHttpConfig`] from the application [`GatewayConfig`].
fn build_http_config(config: &GatewayConfig) -> ImborHttpConfig {
    ImborHttpConfig {
        cors: config.cors,
        max_query_bytes: config.max_query_bytes,
    }
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: ImborHttpService<LdpHandler>) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Address to check for `--health-check`; a wildcard bind is checked on loopback.
fn health_check_addr(listen_addr: &str) -> String {
    listen_addr.replace("0.0.0.0", "127.0.0.1")
}

/// Perform a health check by connecting to the gateway and requesting `/health`.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.starts_with("HTTP/1.1 200") && response.contains("\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let gateway_config = GatewayConfig::from_env().context("invalid gateway configuration")?;

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = health_check_addr(&gateway_config.gateway_listen);
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    init_tracing(&gateway_config.log_level, json_logs)?;

    let ldp_config = LdpConfig::from_env().context("invalid LDP configuration")?;
    info!(
        base_url = %ldp_config.base_url,
        client_id = %ldp_config.client_id,
        timeout_secs = ldp_config.timeout.as_secs(),
        "initializing LDP client",
    );
    let client = SparqlClient::new(&ldp_config).context("failed to build LDP client")?;

    let handler = LdpHandler::new(Arc::new(client));
    let service = ImborHttpService::new(Arc::new(handler), build_http_config(&gateway_config));

    let listen_addr = &gateway_config.gateway_listen;
    let addr: SocketAddr = listen_addr
        .parse()
        .with_context(|| format!("invalid bind address: {listen_addr}"))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        config = %gateway_config.to_json(),
        version = VERSION,
        "starting IMBOR gateway",
    );

    serve(listener, service).await
}
