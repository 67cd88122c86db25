//! gRPC service implementation of `pb.hello.HelloWorld`

use crate::audit;
use crate::error::HelloError;
use crate::greeter::Greeter;
use crate::metrics::{self, ActiveStreamGuard, Direction, RpcTimer};
use crate::proto::{
    hello_world_server::{HelloWorld, HelloWorldServer},
    SayHelloRequest, SayHelloResponse, SayHelloResponses,
};
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tonic::{Request, Response, Status, Streaming};
use tracing::debug;

const SAY_HELLO: &str = "SayHello";
const LOTS_OF_REPLIES: &str = "LotsOfReplies";
const LOTS_OF_GREETINGS: &str = "LotsOfGreetings";
const BIDI_HELLO: &str = "BidiHello";

/// Replies buffered ahead of a slow LotsOfReplies reader
const REPLY_CHANNEL_CAPACITY: usize = 16;

pub type ResponseStream =
    Pin<Box<dyn Stream<Item = Result<SayHelloResponse, Status>> + Send + 'static>>;

/// gRPC server state
#[derive(Debug, Clone)]
pub struct HelloWorldService {
    greeter: Arc<Greeter>,
}

impl HelloWorldService {
    pub fn new(greeter: Greeter) -> Self {
        Self {
            greeter: Arc::new(greeter),
        }
    }

    pub fn into_server(self) -> HelloWorldServer<Self> {
        HelloWorldServer::new(self)
    }

    async fn collect_greetings(
        &self,
        mut inbound: Streaming<SayHelloRequest>,
    ) -> Result<SayHelloResponses, Status> {
        let max = self.greeter.max_collected();
        let mut responses = Vec::new();

        while let Some(req) = inbound.message().await? {
            metrics::stream_message(LOTS_OF_GREETINGS, Direction::Received);
            if responses.len() >= max {
                return Err(HelloError::TooManyGreetings(max).into());
            }
            responses.push(self.greeter.greet(&req)?);
        }

        debug!(count = responses.len(), "LotsOfGreetings stream closed");
        Ok(SayHelloResponses { responses })
    }
}

/// Audit a refused call and hand its status back.
fn rejected(method: &str, peer: Option<SocketAddr>, status: Status) -> Status {
    audit::greeting_rejected(method, peer, &status);
    status
}

#[tonic::async_trait]
impl HelloWorld for HelloWorldService {
    async fn say_hello(
        &self,
        request: Request<SayHelloRequest>,
    ) -> Result<Response<SayHelloResponse>, Status> {
        let timer = RpcTimer::start(SAY_HELLO);
        let result = self
            .greeter
            .greet(request.get_ref())
            .map(Response::new)
            .map_err(|e| rejected(SAY_HELLO, request.remote_addr(), e.into()));
        timer.finish(&result);
        result
    }

    type LotsOfRepliesStream = ReceiverStream<Result<SayHelloResponse, Status>>;

    async fn lots_of_replies(
        &self,
        request: Request<SayHelloRequest>,
    ) -> Result<Response<Self::LotsOfRepliesStream>, Status> {
        let timer = RpcTimer::start(LOTS_OF_REPLIES);
        let replies = match self.greeter.replies(request.get_ref()) {
            Ok(replies) => replies,
            Err(e) => {
                let status = rejected(LOTS_OF_REPLIES, request.remote_addr(), e.into());
                let result: Result<(), Status> = Err(status.clone());
                timer.finish(&result);
                return Err(status);
            }
        };

        let interval = self.greeter.reply_interval();
        let (tx, rx) = mpsc::channel(REPLY_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let _active = ActiveStreamGuard::new();
            let total = replies.total();
            for (i, reply) in replies.enumerate() {
                if i > 0 && !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
                if tx.send(Ok(reply)).await.is_err() {
                    // Dropping the unfinished timer records the call as cancelled
                    debug!("LotsOfReplies receiver dropped after {}/{} replies", i, total);
                    return;
                }
                metrics::stream_message(LOTS_OF_REPLIES, Direction::Sent);
            }
            timer.finish::<()>(&Ok(()));
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn lots_of_greetings(
        &self,
        request: Request<Streaming<SayHelloRequest>>,
    ) -> Result<Response<SayHelloResponses>, Status> {
        let timer = RpcTimer::start(LOTS_OF_GREETINGS);
        let peer = request.remote_addr();
        let result = self
            .collect_greetings(request.into_inner())
            .await
            .map_err(|status| rejected(LOTS_OF_GREETINGS, peer, status));
        timer.finish(&result);
        result.map(Response::new)
    }

    type BidiHelloStream = ResponseStream;

    async fn bidi_hello(
        &self,
        request: Request<Streaming<SayHelloRequest>>,
    ) -> Result<Response<Self::BidiHelloStream>, Status> {
        let timer = RpcTimer::start(BIDI_HELLO);
        let greeter = self.greeter.clone();
        let peer = request.remote_addr();
        let mut inbound = request.into_inner();

        let outbound = async_stream::stream! {
            let _active = ActiveStreamGuard::new();
            while let Some(req) = inbound.next().await {
                let reply = req.and_then(|req| {
                    metrics::stream_message(BIDI_HELLO, Direction::Received);
                    greeter.greet(&req).map_err(Status::from)
                });
                match reply {
                    Ok(reply) => {
                        metrics::stream_message(BIDI_HELLO, Direction::Sent);
                        yield Ok(reply);
                    }
                    Err(status) => {
                        debug!(code = ?status.code(), "BidiHello terminated");
                        let status = rejected(BIDI_HELLO, peer, status);
                        let result: Result<(), Status> = Err(status.clone());
                        timer.finish(&result);
                        // The response encoder drops greetings it still buffers when
                        // it meets an error, so let it flush them first
                        tokio::task::yield_now().await;
                        yield Err(status);
                        return;
                    }
                }
            }
            debug!("BidiHello inbound stream closed");
            timer.finish::<()>(&Ok(()));
        };

        Ok(Response::new(Box::pin(outbound) as Self::BidiHelloStream))
    }
}
