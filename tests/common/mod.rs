//! Shared utilities for integration tests.

use std::net::SocketAddr;

use ox_web::config::AppConfig;
use ox_web::{Application, HttpServer, Shutdown};

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Seal `app` and serve it with default settings.
#[allow(dead_code)]
pub async fn spawn_app(app: Application) -> TestServer {
    spawn_app_with(app, AppConfig::default()).await
}

/// Seal `app` and serve it with `config` on 127.0.0.1:0.
pub async fn spawn_app_with(app: Application, mut config: AppConfig) -> TestServer {
    config.listener.bind_address = "127.0.0.1:0".to_string();
    let dispatcher = app.seal().expect("test application must seal");

    let server = HttpServer::new(dispatcher, config);
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer { addr, shutdown }
}

/// Client that never goes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}
