//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum router forwarding every request to the dispatcher
//! - Wire up transport middleware (tracing, request ID, timeout)
//! - Buffer request bodies up to the configured limit
//! - Run each dispatch on its own blocking worker
//! - Serve until the shutdown signal fires

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request as HttpRequest, StatusCode},
    response::{IntoResponse, Response as HttpResponse},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::Dispatcher;
use crate::config::AppConfig;
use crate::http::request::{Request, UuidRequestId};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] io::Error),
}

/// State injected into the fallback handler.
#[derive(Clone)]
struct ServerState {
    dispatcher: Arc<Dispatcher>,
    max_body_bytes: usize,
}

/// HTTP front end for a sealed application.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    pub fn new(dispatcher: Dispatcher, config: AppConfig) -> Self {
        let state = ServerState {
            dispatcher: Arc::new(dispatcher),
            max_body_bytes: config.limits.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: ServerState) -> Router {
        let router = Router::new().fallback(dispatch_handler).with_state(state);

        let router = if config.timeouts.request_secs > 0 {
            router.layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
        } else {
            router
        };

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind a listener on the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let address = &self.config.listener.bind_address;
        TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })
    }

    /// Serve connections from `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The configured axum router, for embedding into another service.
    pub fn into_router(self) -> Router {
        self.router
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Sets the request's cancellation flag if dropped while armed.
///
/// axum drops the handler future when the client goes away or the timeout
/// layer fires; the blocking worker keeps running and observes the flag.
struct CancelOnDrop {
    flag: Arc<AtomicBool>,
    armed: bool,
}

impl CancelOnDrop {
    fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            armed: true,
        }
    }

    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.flag.store(true, Ordering::Release);
        }
    }
}

/// Forward one request into the dispatcher.
async fn dispatch_handler(
    State(state): State<ServerState>,
    request: HttpRequest<Body>,
) -> HttpResponse {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Rejecting request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let cancel = CancelOnDrop::new();
    let request = Request::from_parts(&parts, body).with_cancellation(cancel.flag());
    let dispatcher = Arc::clone(&state.dispatcher);

    let result = tokio::task::spawn_blocking(move || dispatcher.dispatch(request)).await;
    cancel.disarm();

    match result {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::error!(path = %parts.uri.path(), error = %e, "Dispatch worker failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
