//! Demo router server.
//!
//! Serves a handful of routes that exercise captures, query and body
//! parameters, and the response helpers:
//!
//! ```text
//! GET    /ping                     → text/plain "pong"
//! GET    /users/:id/posts/:postId  → JSON with both captures
//! GET    /delay/:ms                → async handler, replies after the delay
//! POST   /echo                     → JSON echo of params and body
//! PUT    /items/:id                → 201 JSON
//! DELETE /items/:id                → text/plain confirmation
//! *                                → HTML 404 from the error handler
//! ```

use std::path::PathBuf;
use std::time::Duration;

use axum::http::StatusCode;
use clap::Parser;
use serde_json::json;

use waypost::config::{load_config, ServerConfig};
use waypost::lifecycle::signals::shutdown_on_ctrl_c;
use waypost::observability::logging::init_logging;
use waypost::{Body, Method, Server};

#[derive(Parser)]
#[command(name = "waypost")]
#[command(about = "Minimal HTTP request router (demo server)", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configured bind address.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    init_logging(&config.observability);

    tracing::info!("waypost v{} starting", env!("CARGO_PKG_VERSION"));

    let mut server = Server::with_config(config);
    register_demo_routes(&mut server)?;

    let handle = match cli.port {
        Some(port) => server.listen(port).await?,
        None => server.start().await?,
    };

    tracing::info!(address = %handle.local_addr(), "Demo routes registered");

    tokio::spawn(shutdown_on_ctrl_c(handle.shutdown_trigger()));
    handle.wait().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn register_demo_routes(server: &mut Server) -> waypost::Result<()> {
    server
        .get("/ping", |_, res, _| res.plain("pong", None))?
        .get("/users/:id/posts/:postId", |_, res, caps| {
            res.json(
                json!({ "user": caps.named("id"), "post": caps.named("postId") }),
                None,
            )
        })?
        .on_async(Method::Get, "/delay/:ms", |_, mut res, caps| async move {
            let ms = caps.get(0).and_then(|v| v.parse::<u64>().ok()).unwrap_or(0).min(5_000);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            let result = res.json(json!({ "delayed_ms": ms }), None);
            (res, result)
        })?
        .post("/echo", |req, res, _| {
            let body = match req.body() {
                Body::Json(value) => value.clone(),
                Body::Text(text) => json!(text),
                Body::Empty | Body::Binary(_) => json!(null),
            };
            res.json(json!({ "params": req.params(), "body": body }), None)
        })?
        .put("/items/:id", |req, res, caps| {
            res.json(
                json!({ "id": caps.get(0), "name": req.param("name") }),
                Some(StatusCode::CREATED),
            )
        })?
        .delete("/items/:id", |_, res, caps| {
            res.plain(format!("deleted {}", caps.get(0).unwrap_or_default()), None)
        })?;

    server.on_error(|req, res| {
        res.html(
            format!("<h1>Not Found</h1><p>{} {}</p>", req.method(), req.path()),
            Some(StatusCode::NOT_FOUND),
        )
    });

    Ok(())
}
