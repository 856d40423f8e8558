//! ox-web demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http::server (axum, request id, timeout, body limit)
//!                        │
//!                        ▼
//!                    app::Dispatcher ── groups whose prefix matches ──▶ middleware
//!                        │
//!                        ▼
//!                    routing::Router (per-method trie) ──▶ handler | 404
//!                        │
//!                        ▼
//!                    http::Context::next() drives the chain
//!     Client Response    │
//!     ◀──────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use serde_json::json;

use ox_web::config::{load_config, AppConfig};
use ox_web::lifecycle::{shutdown_signal, Shutdown};
use ox_web::observability::init_logging;
use ox_web::{middleware, Application, HttpServer, StatusCode};

#[derive(Parser)]
#[command(name = "ox-web")]
#[command(about = "Demo server for the ox-web framework", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Serve this directory under /assets.
    #[arg(long)]
    assets: Option<PathBuf>,
}

#[derive(Deserialize)]
struct Echo {
    message: String,
}

fn build_app(assets: Option<PathBuf>) -> Application {
    let mut app = Application::new();
    app.use_middleware(middleware::recovery())
        .use_middleware(middleware::logger());

    app.get("/", |c| c.json(StatusCode::OK, &json!({ "message": "go" })));
    app.get("/hello", |c| {
        let name = c.query("name").unwrap_or_else(|| "stranger".to_string());
        let body = format!("hello {}, you're at {}\n", name, c.path());
        c.string(StatusCode::OK, body);
    });

    {
        let mut v1 = app.group("/v1");
        v1.get("/user/:id", |c| {
            let id = c.param("id").unwrap_or_default().to_string();
            c.json(StatusCode::OK, &json!({ "id": id }));
        });
        v1.post("/echo", |c| match c.bind::<Echo>() {
            Ok(echo) => c.json(StatusCode::OK, &json!({ "message": echo.message })),
            Err(e) => c.fail(StatusCode::BAD_REQUEST, e.to_string()),
        });

        let mut admin = v1.group("/admin");
        admin.use_middleware(|c| {
            if c.header("authorization").is_none() {
                c.fail(StatusCode::UNAUTHORIZED, "missing authorization header");
                return;
            }
            c.next();
        });
        admin.get("/stats", |c| c.json(StatusCode::OK, &json!({ "ok": true })));
    }

    if let Some(dir) = assets {
        app.static_files("/assets", dir);
    }
    app
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability);
    tracing::info!("ox-web v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.limits.max_body_bytes,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let dispatcher = build_app(cli.assets).seal()?;

    let server = HttpServer::new(dispatcher, config);
    let listener = server.bind().await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on(shutdown_signal());

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
