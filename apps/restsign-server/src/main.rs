//! RestSign Server - signature-enforcing HTTP front.
//!
//! This binary serves the [`EchoHandler`] behind the signing layer. Requests to
//! enforced routes must carry a valid HMAC-SHA256 signature in the `hisv`
//! header; every request and response is written to the audit log.
//!
//! # Usage
//!
//! ```text
//! RESTSIGN_SECRET=s3cr3t RESTSIGN_SIGN_DEFAULT=true restsign-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RESTSIGN_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `RESTSIGN_SECRET` | *(unset)* | Shared HMAC secret |
//! | `RESTSIGN_SIGN_DEFAULT` | `false` | Require signatures on unmatched routes |
//! | `RESTSIGN_SIGN_PATHS` | *(empty)* | Comma-separated prefixes requiring signatures |
//! | `RESTSIGN_EXEMPT_PATHS` | *(empty)* | Comma-separated prefixes exempt from signing |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use restsign_core::RestSignConfig;
use restsign_http::{EchoHandler, SignHttpConfig, SignHttpService};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Accept connections until ctrl-c, then drain in-flight requests.
async fn serve(listener: TcpListener, service: SignHttpService<EchoHandler>) -> Result<()> {
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

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Request the health endpoint of a running server.
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

    if response.contains("200 OK") && response.contains("\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

/// Address a local health probe should dial for a bind address.
fn probe_addr(listen: &str) -> String {
    listen.replace("0.0.0.0", "127.0.0.1")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RestSignConfig::from_env().context("invalid RestSign configuration")?;

    // Handle --health-check flag for container health probes.
    if std::env::args().any(|a| a == "--health-check") {
        let healthy = run_health_check(&probe_addr(&config.listen)).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;
    if !config.signing_possible() {
        warn!("signature enforcement is disabled on every route");
    }

    let http_config = SignHttpConfig::from_config(&config);
    let service = SignHttpService::new(EchoHandler, http_config);

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        version = VERSION,
        server_name = %config.server_name,
        sign_default = config.sign_default,
        sign_paths = ?config.sign_paths,
        exempt_paths = ?config.exempt_paths,
        file_digest = %config.file_digest,
        "starting RestSign Server",
    );

    serve(listener, service).await
}
