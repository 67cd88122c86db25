//! gRPC and admin servers

pub mod auth;
pub mod grpc;
pub mod http;

use crate::config::ServerConfig;
use crate::greeter::Greeter;
use crate::proto::hello_world_server::HelloWorldServer;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::codec::CompressionEncoding;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::Server;
use tracing::info;

/// Whether the gRPC listener is currently serving. Shared with `/readyz`.
#[derive(Debug, Clone, Default)]
pub struct Readiness {
    ready: Arc<AtomicBool>,
}

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn mark_not_ready(&self) {
        self.ready.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

/// Serve HelloWorld (plus gRPC health) on `listener` until `shutdown` is cancelled.
pub async fn serve(
    config: &ServerConfig,
    listener: TcpListener,
    readiness: Readiness,
    shutdown: CancellationToken,
) -> Result<()> {
    config.validate()?;
    let greeter = Greeter::new(&config.greeter).context("Invalid greeter configuration")?;
    let hello = grpc::HelloWorldService::new(greeter)
        .into_server()
        .accept_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Gzip)
        .max_decoding_message_size(config.max_message_size)
        .max_encoding_message_size(config.max_message_size);

    let auth = auth::BearerAuth::new(config.auth_token.clone());
    if auth.is_enabled() {
        info!("Bearer token authentication enabled");
    }

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<HelloWorldServer<grpc::HelloWorldService>>()
        .await;

    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("HelloWorld gRPC server listening on {}", addr);
    readiness.mark_ready();

    let result = Server::builder()
        .add_service(health_service)
        .add_service(InterceptedService::new(hello, auth))
        .serve_with_incoming_shutdown(
            TcpListenerStream::new(listener),
            shutdown.cancelled(),
        )
        .await;

    readiness.mark_not_ready();
    info!("HelloWorld gRPC server stopped");
    result.context("gRPC server error")
}
