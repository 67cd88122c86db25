//! Client for `pb.hello.HelloWorld`
//!
//! Wraps the generated stub with connection setup (timeouts, gzip, retried
//! connect) and bearer-token metadata on every call.

use crate::proto::{
    hello_world_client::HelloWorldClient, SayHelloRequest, SayHelloResponse, SayHelloResponses,
};
use crate::retry::retry_with_backoff;
use crate::server::auth::insert_bearer;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio_stream::Stream;
use tonic::codec::CompressionEncoding;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status, Streaming};
use tracing::debug;

const INITIAL_BACKOFF: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub connect_timeout: Duration,

    /// Per-call deadline; `None` leaves calls unbounded, which long streams need
    pub request_timeout: Option<Duration>,

    /// Sent as `authorization: Bearer <token>`
    pub auth_token: Option<String>,

    /// Connection attempts before giving up
    pub connect_attempts: u32,

    pub gzip: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: None,
            auth_token: None,
            connect_attempts: 3,
            gzip: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HelloClient {
    inner: HelloWorldClient<Channel>,
    auth_token: Option<String>,
}

impl HelloClient {
    /// Connect to `url` (e.g. `http://127.0.0.1:50051`), retrying with backoff.
    pub async fn connect(url: &str, options: ClientOptions) -> Result<Self> {
        let mut endpoint = Endpoint::from_shared(url.to_string())
            .with_context(|| format!("Invalid endpoint: {}", url))?
            .connect_timeout(options.connect_timeout);
        if let Some(timeout) = options.request_timeout {
            endpoint = endpoint.timeout(timeout);
        }

        let channel = retry_with_backoff(
            "connect",
            options.connect_attempts,
            INITIAL_BACKOFF,
            || endpoint.connect(),
        )
        .await
        .with_context(|| format!("Failed to connect to {}", url))?;
        debug!("Connected to {}", url);

        let mut inner = HelloWorldClient::new(channel);
        if options.gzip {
            inner = inner
                .send_compressed(CompressionEncoding::Gzip)
                .accept_compressed(CompressionEncoding::Gzip);
        }

        Ok(Self {
            inner,
            auth_token: options.auth_token,
        })
    }

    fn request<T>(&self, message: T) -> Result<Request<T>, Status> {
        let mut request = Request::new(message);
        if let Some(token) = &self.auth_token {
            insert_bearer(&mut request, token)?;
        }
        Ok(request)
    }

    pub async fn say_hello(&mut self, req: SayHelloRequest) -> Result<SayHelloResponse, Status> {
        let request = self.request(req)?;
        Ok(self.inner.say_hello(request).await?.into_inner())
    }

    pub async fn lots_of_replies(
        &mut self,
        req: SayHelloRequest,
    ) -> Result<Streaming<SayHelloResponse>, Status> {
        let request = self.request(req)?;
        Ok(self.inner.lots_of_replies(request).await?.into_inner())
    }

    /// Stream `reqs` to the server and wait for the collected reply.
    pub async fn lots_of_greetings(
        &mut self,
        reqs: Vec<SayHelloRequest>,
    ) -> Result<SayHelloResponses, Status> {
        let request = self.request(tokio_stream::iter(reqs))?;
        Ok(self.inner.lots_of_greetings(request).await?.into_inner())
    }

    /// Open BidiHello over an arbitrary outbound stream; responses arrive as
    /// the server answers each request.
    pub async fn bidi_hello_stream<S>(
        &mut self,
        outbound: S,
    ) -> Result<Streaming<SayHelloResponse>, Status>
    where
        S: Stream<Item = SayHelloRequest> + Send + 'static,
    {
        let request = self.request(outbound)?;
        Ok(self.inner.bidi_hello(request).await?.into_inner())
    }

    /// BidiHello over a fixed list, pausing `interval` between sends.
    pub async fn bidi_hello(
        &mut self,
        reqs: Vec<SayHelloRequest>,
        interval: Duration,
    ) -> Result<Streaming<SayHelloResponse>, Status> {
        let outbound = async_stream::stream! {
            for (i, req) in reqs.into_iter().enumerate() {
                if i > 0 && !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
                yield req;
            }
        };
        self.bidi_hello_stream(outbound).await
    }
}

/// Drain a response stream, stopping at the first error.
pub async fn collect_responses(
    mut stream: Streaming<SayHelloResponse>,
) -> Result<Vec<SayHelloResponse>, Status> {
    let mut responses = Vec::new();
    while let Some(response) = stream.message().await? {
        responses.push(response);
    }
    Ok(responses)
}
