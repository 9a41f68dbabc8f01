//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Own the route table and error handler of one server instance
//! - Create the Axum Router that funnels every request into the dispatcher
//! - Wire up middleware (tracing, timeout, request ID)
//! - Drain and normalize bodies before dispatch
//! - Bind, serve and shut down

use std::future::Future;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body as HttpBody,
    extract::{Request as HttpRequest, State},
    http::StatusCode,
    response::{IntoResponse, Response as HttpResponse},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::http::dispatcher::Dispatcher;
use crate::http::handler::{
    async_error_handler, async_handler, sync_error_handler, sync_handler, ErrorHandler, Handler,
    HandlerResult, Reply,
};
use crate::http::normalize::{accumulate, BodyError};
use crate::http::request::Request;
use crate::http::request_id::{UuidRequestId, X_REQUEST_ID};
use crate::http::response::Response;
use crate::lifecycle::Shutdown;
use crate::observability::metrics::{self, method_label, Outcome};
use crate::routing::{Captures, Method, RouteTable};

/// Application state injected into the dispatch handler.
#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Dispatcher>,
    max_body_bytes: usize,
    metrics_enabled: bool,
}

/// A router server under construction.
///
/// Routes and the error handler are registered first; `listen`, `bind`,
/// `serve` or `into_router` then freeze them.
pub struct Server {
    config: ServerConfig,
    table: RouteTable<Handler>,
    error_handler: Option<ErrorHandler>,
}

impl Server {
    /// Create a server with default configuration.
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a server with the given configuration.
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            config,
            table: RouteTable::new(),
            error_handler: None,
        }
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Register `handler` for `method` (case-insensitive verb name) and `pattern`.
    pub fn route<F>(&mut self, method: &str, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(&Request, &mut Response, &Captures) -> HandlerResult + Send + Sync + 'static,
    {
        let method = Method::from_str(method)?;
        self.on(method, pattern, handler)
    }

    /// Register `handler` for `method` and `pattern`, replacing any handler
    /// previously registered for the same pair.
    pub fn on<F>(&mut self, method: Method, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(&Request, &mut Response, &Captures) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(method, pattern, sync_handler(handler))
    }

    /// Register an async `handler` for `method` and `pattern`.
    ///
    /// The handler owns the response while it runs and returns it with its
    /// result, so it can await I/O before writing.
    pub fn on_async<F, Fut>(&mut self, method: Method, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(Arc<Request>, Response, Captures) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        self.register(method, pattern, async_handler(handler))
    }

    fn register(&mut self, method: Method, pattern: &str, handler: Handler) -> Result<&mut Self> {
        self.table.register(method, pattern, handler)?;
        Ok(self)
    }

    pub fn get<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(&Request, &mut Response, &Captures) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::Get, pattern, handler)
    }

    pub fn post<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(&Request, &mut Response, &Captures) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::Post, pattern, handler)
    }

    pub fn put<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(&Request, &mut Response, &Captures) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::Put, pattern, handler)
    }

    pub fn delete<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(&Request, &mut Response, &Captures) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::Delete, pattern, handler)
    }

    /// Set the handler for unmatched requests. The last registration wins.
    pub fn on_error<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.set_error_handler(sync_error_handler(handler))
    }

    /// Async variant of [`Server::on_error`].
    pub fn on_error_async<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Arc<Request>, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        self.set_error_handler(async_error_handler(handler))
    }

    fn set_error_handler(&mut self, handler: ErrorHandler) -> &mut Self {
        if self.error_handler.is_some() {
            tracing::debug!("Error handler replaced");
        }
        self.error_handler = Some(handler);
        self
    }

    /// Freeze the routes into a fully layered Axum router.
    #[allow(deprecated)]
    pub fn into_router(self) -> Router {
        let state = AppState {
            dispatcher: Arc::new(Dispatcher::new(self.table, self.error_handler)),
            max_body_bytes: self.config.limits.max_body_bytes,
            metrics_enabled: self.config.observability.metrics_enabled,
        };

        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Serve on `listener` until `shutdown` completes, then drain in-flight requests.
    pub async fn serve<S>(self, listener: TcpListener, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.table.len(),
            error_handler = self.error_handler.is_some(),
            "HTTP server starting"
        );

        let app = self.into_router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }

    /// Bind `0.0.0.0:<port>` and start serving in the background.
    pub async fn listen(self, port: u16) -> Result<ServerHandle> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        self.bind(&addr.to_string()).await
    }

    /// Bind the configured `listener.bind_address` and start serving.
    pub async fn start(self) -> Result<ServerHandle> {
        let addr = self.config.listener.bind_address.clone();
        self.bind(&addr).await
    }

    /// Bind `addr` and start serving in the background.
    pub async fn bind(self, addr: &str) -> Result<ServerHandle> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!(address = %local_addr, "Listening for connections");

        let shutdown = Shutdown::new();
        // Subscribe before spawning so an early trigger is never missed.
        let signal = shutdown.signalled();
        let task = tokio::spawn(self.serve(listener, signal));

        Ok(ServerHandle {
            local_addr,
            shutdown,
            task,
        })
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

/// A running server.
///
/// The serve loop stops only when [`ServerHandle::shutdown`] (or a trigger
/// from [`ServerHandle::shutdown_trigger`]) fires. Dropping the handle
/// detaches the server, which keeps serving until the runtime exits.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<Result<()>>,
}

impl ServerHandle {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Coordinator that stops this server when triggered.
    pub fn shutdown_trigger(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Stop accepting, drain in-flight requests and wait for the serve loop.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown.trigger();
        self.wait().await
    }

    /// Wait for the serve loop to exit.
    pub async fn wait(self) -> Result<()> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(Error::Io(std::io::Error::other(e))),
        }
    }
}

/// Single entry point for every request: normalize, dispatch, reply.
async fn dispatch_handler(State(state): State<AppState>, request: HttpRequest) -> HttpResponse {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let method = method_label(&parts.method);
    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        uri = %parts.uri,
        "Normalizing request"
    );

    let raw = match accumulate(body, state.max_body_bytes).await {
        Ok(raw) => raw,
        Err(e) => {
            let status = match e {
                BodyError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                BodyError::Read(_) => StatusCode::BAD_REQUEST,
            };
            tracing::warn!(request_id = %request_id, error = %e, "Request rejected before dispatch");
            if state.metrics_enabled {
                metrics::record_request(method, Outcome::Rejected, status.as_u16(), start);
            }
            return (status, e.to_string()).into_response();
        }
    };

    let request = Request::normalize(parts, raw);
    let (response, outcome) = state.dispatcher.dispatch(request).await;

    let response = response.into_http().unwrap_or_else(|| {
        // The dispatcher always writes; keep the connection answered regardless.
        tracing::error!(request_id = %request_id, "Dispatcher produced no response");
        (StatusCode::INTERNAL_SERVER_ERROR, HttpBody::empty()).into_response()
    });

    if state.metrics_enabled {
        metrics::record_request(method, outcome, response.status().as_u16(), start);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(router: Router, request: HttpRequest) -> (StatusCode, Option<String>, String) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    fn get(uri: &str) -> HttpRequest {
        axum::http::Request::builder().uri(uri).body(HttpBody::empty()).unwrap()
    }

    fn post(uri: &str, body: &'static str) -> HttpRequest {
        axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .body(HttpBody::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn ping_pong() {
        let mut server = Server::new();
        server.get("/ping", |_, res, _| res.plain("pong", None)).unwrap();

        let (status, content_type, body) = call(server.into_router(), get("/ping")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/plain"));
        assert_eq!(body, "pong");
    }

    #[tokio::test]
    async fn json_body_is_structured_not_params() {
        let mut server = Server::new();
        server
            .post("/echo", |req, res, _| {
                res.json(
                    json!({ "body": req.json().cloned(), "a": req.param("a") }),
                    None,
                )
            })
            .unwrap();

        let (_, _, body) = call(server.into_router(), post("/echo", r#"{"a":1}"#)).await;
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value, json!({ "body": { "a": 1 }, "a": null }));
    }

    #[tokio::test]
    async fn form_body_becomes_params() {
        let mut server = Server::new();
        server
            .post("/form", |req, res, _| {
                let a = req.param("a").unwrap_or("-");
                let b = req.param("b").unwrap_or("-");
                res.plain(format!("{a},{b}"), None)
            })
            .unwrap();

        let (_, _, body) = call(server.into_router(), post("/form", "a=1&b=2")).await;
        assert_eq!(body, "1,2");
    }

    #[tokio::test]
    async fn structured_send_with_status() {
        let mut server = Server::new();
        server
            .put("/items/:id", |_, res, caps| {
                res.send(json!({ "ok": true, "id": caps.get(0) }), Some(StatusCode::CREATED), None)
            })
            .unwrap();

        let request = axum::http::Request::builder()
            .method("PUT")
            .uri("/items/9")
            .body(HttpBody::empty())
            .unwrap();
        let (status, content_type, body) = call(server.into_router(), request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body, r#"{"id":"9","ok":true}"#);
    }

    #[tokio::test]
    async fn last_error_handler_wins() {
        let mut server = Server::new();
        server
            .on_error(|_, res| res.plain("first", Some(StatusCode::NOT_FOUND)))
            .on_error(|req, res| res.plain(format!("missing {}", req.path()), Some(StatusCode::NOT_FOUND)));

        let (status, _, body) = call(server.into_router(), get("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "missing /nope");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let mut config = ServerConfig::default();
        config.limits.max_body_bytes = 4;
        let mut server = Server::with_config(config);
        server.post("/upload", |_, res, _| res.plain("stored", None)).unwrap();

        let (status, _, _) = call(server.into_router(), post("/upload", "0123456789")).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn request_id_is_assigned_and_propagated() {
        let mut server = Server::new();
        server
            .get("/id", |req, res, _| res.plain(req.request_id().unwrap_or("none").to_string(), None))
            .unwrap();

        let response = server.into_router().oneshot(get("/id")).await.unwrap();
        let header_id = response.headers()[X_REQUEST_ID].to_str().unwrap().to_string();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        assert_eq!(String::from_utf8(body.to_vec()).unwrap(), header_id);
        assert_ne!(header_id, "none");
    }

    #[tokio::test]
    async fn async_route_and_error_handler() {
        let mut server = Server::new();
        server
            .on_async(Method::Get, "/slow/:id", |req, mut res, caps| async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                let id = caps.get(0).unwrap_or_default().to_string();
                let result = res.json(json!({ "id": id, "q": req.param("q") }), None);
                (res, result)
            })
            .unwrap();
        server.on_error_async(|req, mut res| async move {
            tokio::task::yield_now().await;
            let result = res.plain(format!("no {}", req.path()), Some(StatusCode::NOT_FOUND));
            (res, result)
        });
        let router = server.into_router();

        let (status, _, body) = call(router.clone(), get("/slow/4?q=x")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"id":"4","q":"x"}"#);

        let (status, _, body) = call(router, get("/fast")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "no /fast");
    }

    #[tokio::test]
    async fn unreadable_body_is_bad_request() {
        let mut server = Server::new();
        server
            .post("/upload", |_, _, _| Err(Error::handler("should not run")))
            .unwrap();

        let chunks: Vec<std::result::Result<&'static str, std::io::Error>> =
            vec![Ok("ab"), Err(std::io::Error::other("connection reset"))];
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/upload")
            .body(HttpBody::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();

        let (status, _, _) = call(server.into_router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn registration_errors_surface() {
        let mut server = Server::new();
        assert!(matches!(
            server.route("PATCH", "/x", |_, res, _| res.plain("x", None)),
            Err(Error::UnsupportedMethod(_))
        ));
        assert!(matches!(
            server.get("x", |_, res, _| res.plain("x", None)),
            Err(Error::MalformedPattern { .. })
        ));
        assert!(server.route("delete", "/x/:id", |_, res, _| res.plain("x", None)).is_ok());
    }
}
