//! Test server harness shared by the integration tests.

#![allow(dead_code)]

use hello_server::config::ServerConfig;
use hello_server::server::{self, Readiness};
use hello_server::{ClientOptions, HelloClient};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct TestServer {
    pub url: String,
    pub readiness: Readiness,
    shutdown: CancellationToken,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    pub async fn start(config: ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("http://{}", listener.local_addr().unwrap());
        let readiness = Readiness::new();
        let shutdown = CancellationToken::new();

        let handle = {
            let readiness = readiness.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { server::serve(&config, listener, readiness, shutdown).await })
        };

        Self {
            url,
            readiness,
            shutdown,
            handle,
        }
    }

    pub async fn client(&self) -> HelloClient {
        self.client_with(ClientOptions::default()).await
    }

    pub async fn client_with(&self, options: ClientOptions) -> HelloClient {
        HelloClient::connect(&self.url, options)
            .await
            .expect("connect to test server")
    }

    pub async fn stop(self) {
        self.shutdown.cancel();
        self.handle
            .await
            .expect("server task")
            .expect("server exits cleanly");
        assert!(!self.readiness.is_ready());
    }
}
