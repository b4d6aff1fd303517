//! HTTP server implementation.
//!
//! The server accepts connections on a Tokio listener and serves HTTP/1.1
//! with Hyper. Every request gets an id, a tracing span, a whole-request
//! deadline and a metrics sample. Routing is a fixed table:
//!
//! | Method | Path       | Handler                      |
//! |--------|------------|------------------------------|
//! | GET    | `/`        | service name and version     |
//! | GET    | `/status`  | liveness                     |
//! | POST   | `/analyze` | multipart upload → analysis  |
//!
//! Other methods on a known path get 405; unknown paths get 404. Every body
//! is JSON, and every error body has the shape `{"detail": "..."}`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docaudit_config::DocauditConfig;
//! use docaudit_engine::CommandEngine;
//! use docaudit_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), docaudit_server::ServerError> {
//!     let config = DocauditConfig::default();
//!     let engine = Arc::new(CommandEngine::new("audit-engine"));
//!     Server::from_config(&config, engine).run().await
//! }
//! ```

use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use docaudit_config::DocauditConfig;
use docaudit_core::{AuditError, ErrorDetail, RequestOutcome};
use docaudit_engine::AnalysisEngine;
use docaudit_telemetry::metrics::{record_request, InFlightGuard};
use http::header::{self, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::{TcpListener, TcpStream};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::gateway::Gateway;
use crate::multipart::{self, UploadLimits};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Header carrying the request id, echoed on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied request id that is reused instead of replaced.
const MAX_REQUEST_ID_LEN: usize = 128;

/// The routing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Root,
    Status,
    Analyze,
    MethodNotAllowed { allow: &'static str },
    NotFound,
}

impl Route {
    fn resolve(method: &Method, path: &str) -> Self {
        let (route, allow) = match path {
            "/" => (Self::Root, Method::GET),
            "/status" => (Self::Status, Method::GET),
            "/analyze" => (Self::Analyze, Method::POST),
            _ => return Self::NotFound,
        };

        if *method == allow {
            route
        } else {
            Self::MethodNotAllowed {
                allow: if allow == Method::GET { "GET" } else { "POST" },
            }
        }
    }

    /// Endpoint label for metrics.
    const fn label(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Status => "status",
            Self::Analyze => "analyze",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::NotFound => "not_found",
        }
    }
}

/// The document audit HTTP server.
#[derive(Debug)]
pub struct Server {
    gateway: Arc<Gateway>,
    http_addr: String,
    limits: UploadLimits,
    request_timeout: Duration,
    shutdown_timeout: Duration,
}

impl Server {
    /// Creates a server around `gateway` with default limits and timeouts.
    #[must_use]
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
            http_addr: "0.0.0.0:8000".to_string(),
            limits: UploadLimits::default(),
            request_timeout: Duration::from_secs(600),
            shutdown_timeout: Duration::from_secs(30),
        }
    }

    /// Builds a server, and its gateway, from service configuration.
    #[must_use]
    pub fn from_config(config: &DocauditConfig, engine: Arc<dyn AnalysisEngine>) -> Self {
        Self::new(Gateway::from_config(config, engine))
            .with_http_addr(config.server.http_addr.clone())
            .with_upload_limits(
                UploadLimits::new()
                    .max_body_bytes(config.upload.max_body_bytes)
                    .max_fields(config.upload.max_fields),
            )
            .with_request_timeout(config.server.request_timeout())
            .with_shutdown_timeout(config.server.shutdown_timeout())
    }

    /// Sets the listen address used by [`run`](Self::run).
    #[must_use]
    pub fn with_http_addr(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = addr.into();
        self
    }

    /// Sets the request body limits.
    #[must_use]
    pub fn with_upload_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the whole-request deadline.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets how long shutdown waits for open connections.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// The gateway that handles requests.
    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// The configured listen address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// The request body limits.
    #[must_use]
    pub fn upload_limits(&self) -> UploadLimits {
        self.limits
    }

    /// The whole-request deadline.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Runs the server until SIGTERM or Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self) -> ServerResult<()> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let addr: SocketAddr =
            self.http_addr
                .parse()
                .map_err(|e: std::net::AddrParseError| ServerError::InvalidAddress {
                    addr: self.http_addr.clone(),
                    reason: e.to_string(),
                })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown` fires.
    ///
    /// Open connections finish their in-flight requests, bounded by the
    /// shutdown timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's address cannot be read.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> ServerResult<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                    tracing::debug!(%remote_addr, error = %e, "connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        drop(listener);

        tracing::info!(
            timeout_secs = server.shutdown_timeout.as_secs(),
            active = tracker.active_connections(),
            "waiting for open connections"
        );

        tokio::select! {
            () = tracker.wait_for_idle() => {
                tracing::info!("all connections closed");
            }
            () = tokio::time::sleep(server.shutdown_timeout) => {
                tracing::warn!(
                    active = tracker.active_connections(),
                    "shutdown timeout reached with connections still open"
                );
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { server.handle_request(req).await }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                tracing::debug!(%remote_addr, "draining connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    /// Handles one request end to end.
    ///
    /// Never fails: every outcome, including a blown deadline, becomes a
    /// JSON response.
    pub(crate) async fn handle_request<B>(&self, req: Request<B>) -> Result<HttpResponse, Infallible>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let started = Instant::now();
        let request_id = request_id_of(&req);
        let route = Route::resolve(req.method(), req.uri().path());

        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        async move {
            let _in_flight = InFlightGuard::new();

            let mut response =
                match tokio::time::timeout(self.request_timeout, self.dispatch(route, req)).await {
                    Ok(response) => response,
                    Err(_) => {
                        let timeout_ms =
                            u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX);
                        tracing::warn!(timeout_ms, "request timed out");
                        outcome_response(&RequestOutcome::from(AuditError::unexpected(
                            format!("request timed out after {timeout_ms}ms"),
                        )))
                    }
                };

            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }

            let status = response.status();
            let elapsed = started.elapsed();
            record_request(route.label(), status.as_u16(), elapsed);
            tracing::info!(
                status = status.as_u16(),
                duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                "request completed"
            );

            Ok(response)
        }
        .instrument(span)
        .await
    }

    async fn dispatch<B>(&self, route: Route, req: Request<B>) -> HttpResponse
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        match route {
            Route::Root => json_response(StatusCode::OK, &self.gateway.root()),
            Route::Status => json_response(StatusCode::OK, &self.gateway.status()),
            Route::Analyze => outcome_response(&self.analyze(req).await),
            Route::MethodNotAllowed { allow } => {
                let mut response = detail_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
                response
                    .headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static(allow));
                response
            }
            Route::NotFound => detail_response(StatusCode::NOT_FOUND, "Not Found"),
        }
    }

    async fn analyze<B>(&self, req: Request<B>) -> RequestOutcome
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();

        let upload = match multipart::collect_body(body, self.limits.max_body_bytes).await {
            Ok(bytes) => multipart::read_upload(&parts.headers, bytes, &self.limits).await,
            Err(e) => Err(e),
        };

        match upload {
            Ok(upload) => {
                let (filename, content) = upload.into_parts();
                self.gateway.analyze(filename.as_deref(), content).await
            }
            Err(err) => {
                tracing::info!(error = %err, "upload rejected");
                RequestOutcome::from(err)
            }
        }
    }
}

/// Reuses a sane client-supplied request id, or mints a new one.
fn request_id_of<B>(req: &Request<B>) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(|| Uuid::now_v7().to_string(), ToString::to_string)
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => build_json(status, Bytes::from(bytes)),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response body");
            detail_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn detail_response(status: StatusCode, detail: &str) -> HttpResponse {
    let bytes = serde_json::to_vec(&ErrorDetail::new(detail)).unwrap_or_default();
    build_json(status, Bytes::from(bytes))
}

fn outcome_response(outcome: &RequestOutcome) -> HttpResponse {
    build_json(outcome.status_code(), outcome.to_body_bytes())
}

fn build_json(status: StatusCode, body: Bytes) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(body))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}
