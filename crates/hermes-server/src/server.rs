//! HTTP server.
//!
//! Serves an [`App`] over HTTP/1.1 with hyper on tokio:
//!
//! - a TCP accept loop that stops on a [`ShutdownSignal`]
//! - one task per connection, counted by a [`ConnectionTracker`]
//! - body collection bounded by `max_body_bytes` and `request_timeout_ms`
//! - the synchronous [`App`] run on the blocking pool
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hermes_config::ServerConfig;
//! use hermes_core::fixtures::fantasy_api;
//! use hermes_server::{App, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = fantasy_api("http://localhost:8080")?;
//!     let server = Server::new(ServerConfig::default(), App::new(Arc::new(api)));
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;

use bytes::Bytes;
use hermes_config::ServerConfig;
use hermes_core::JsonApiError;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::app::App;
use crate::response::{self, JsonApiResponse};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Body type written to the wire.
pub type ResponseBody = Full<Bytes>;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parser error.
        #[source]
        source: AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The Hermes HTTP server.
pub struct Server {
    config: ServerConfig,
    app: Arc<App>,
}

impl Server {
    /// Creates a server for `app`.
    #[must_use]
    pub fn new(config: ServerConfig, app: App) -> Self {
        Self {
            config,
            app: Arc::new(app),
        }
    }

    /// The server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The application being served.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Binds the configured address and serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and serves until `shutdown` triggers.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr.clone(),
                source,
            })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// triggers, then waits up to the shutdown timeout for them to finish.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server.handle_connection(stream, shutdown).await {
                                tracing::warn!(remote = %remote_addr, error = %e, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            active = tracker.active_connections(),
            timeout_secs = timeout.as_secs(),
            "draining connections"
        );
        tokio::select! {
            () = tracker.wait_for_drain() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(timeout) => tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            ),
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(&self);
        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(into_hyper(server.handle_request(request).await)) }
        });

        let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(connection);

        tokio::select! {
            result = connection.as_mut() => result,
            () = shutdown.recv() => {
                // Let the in-flight request finish, then close.
                connection.as_mut().graceful_shutdown();
                connection.await
            }
        }
    }

    async fn handle_request(&self, request: Request<Incoming>) -> JsonApiResponse {
        let method = request.method().clone();
        let uri = request.uri().clone();
        tracing::debug!(%method, %uri, "request");

        let (parts, body) = request.into_parts();
        let limit = self.config.max_body_bytes;
        let timeout = self.config.request_timeout();

        let collected = tokio::time::timeout(timeout, Limited::new(body, limit).collect()).await;
        let body = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) if e.downcast_ref::<LengthLimitError>().is_some() => {
                tracing::debug!(%uri, limit, "request body too large");
                return response::transport_error(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "Payload Too Large",
                    &format!("request body exceeds {limit} bytes"),
                );
            }
            Ok(Err(e)) => {
                tracing::debug!(%uri, error = %e, "failed to read request body");
                return response::transport_error(
                    StatusCode::BAD_REQUEST,
                    "Bad Request",
                    &format!("failed to read request body: {e}"),
                );
            }
            Err(_) => {
                tracing::warn!(%uri, "request body timed out");
                return response::transport_error(
                    StatusCode::REQUEST_TIMEOUT,
                    "Request Timeout",
                    "request body was not received in time",
                );
            }
        };

        let app = Arc::clone(&self.app);
        let request = Request::from_parts(parts, body);
        let handled = tokio::time::timeout(timeout, tokio::task::spawn_blocking(move || app.handle(request))).await;

        let response = match handled {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => response::error(&JsonApiError::internal_with_source("request handler failed", e)),
            Err(_) => {
                tracing::warn!(%method, %uri, "request handling timed out");
                response::transport_error(
                    StatusCode::GATEWAY_TIMEOUT,
                    "Gateway Timeout",
                    "request handling timed out",
                )
            }
        };
        tracing::debug!(%method, %uri, status = response.status().as_u16(), "response");
        response
    }
}

fn into_hyper(response: JsonApiResponse) -> Response<ResponseBody> {
    response.map(Full::new)
}
