//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use phonegen_api::config::ServiceConfig;
use phonegen_api::http::HttpServer;
use phonegen_api::lifecycle::Shutdown;

/// A server running on an ephemeral local port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    #[allow(dead_code)]
    pub async fn stop(self) -> Result<(), std::io::Error> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

/// Boot the real server with `config` on `127.0.0.1:0`.
pub async fn spawn_server(mut config: ServiceConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Default config with the given API keys and request quota.
#[allow(dead_code)]
pub fn config_with(api_keys: &[&str], max_requests: u64) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.auth.api_keys = api_keys.iter().map(|k| k.to_string()).collect();
    config.rate_limit.max_requests = max_requests;
    config
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
