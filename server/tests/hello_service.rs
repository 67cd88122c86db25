//! End-to-end tests: run the server on an ephemeral port and drive every
//! HelloWorld method through the client.

mod common;

use common::TestServer;
use hello_server::client::collect_responses;
use hello_server::config::ServerConfig;
use hello_server::proto::{say_hello_request::AOneof, SayHelloRequest};
use hello_server::ClientOptions;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Code;

fn with_int(name: &str, n: i32) -> SayHelloRequest {
    SayHelloRequest {
        a_oneof: Some(AOneof::MaybeInt(n)),
        ..SayHelloRequest::named(name)
    }
}

fn texts(responses: Vec<hello_server::proto::SayHelloResponse>) -> Vec<String> {
    responses.into_iter().map(|r| r.hello).collect()
}

#[tokio::test]
async fn say_hello_returns_one_greeting() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut client = server.client().await;

    let req = SayHelloRequest {
        phone: "555-0100".to_string(),
        a_map: [("apples".to_string(), 3u32)].into_iter().collect(),
        an_array: vec!["x".to_string()],
        a_oneof: Some(AOneof::MaybeString("s".to_string())),
        ..SayHelloRequest::named("ada")
    };
    let resp = client.say_hello(req).await.unwrap();
    assert_eq!(resp.hello, "Hello, ada!");

    let status = client
        .say_hello(SayHelloRequest::named("  "))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    server.stop().await;
}

#[tokio::test]
async fn lots_of_replies_streams_zero_or_more() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut client = server.client().await;

    let default = collect_responses(
        client
            .lots_of_replies(SayHelloRequest::named("ada"))
            .await
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(
        texts(default),
        vec![
            "Hello, ada! (1/3)",
            "Hello, ada! (2/3)",
            "Hello, ada! (3/3)"
        ]
    );

    let none = collect_responses(client.lots_of_replies(with_int("ada", 0)).await.unwrap())
        .await
        .unwrap();
    assert!(none.is_empty());

    let five = collect_responses(client.lots_of_replies(with_int("ada", 5)).await.unwrap())
        .await
        .unwrap();
    assert_eq!(five.len(), 5);

    let status = client
        .lots_of_replies(with_int("ada", -1))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    server.stop().await;
}

#[tokio::test]
async fn lots_of_replies_honours_max_replies() {
    let mut config = ServerConfig::default();
    config.greeter.max_replies = 4;
    config.greeter.reply_interval_ms = 1;
    let server = TestServer::start(config).await;
    let mut client = server.client().await;

    let replies = collect_responses(client.lots_of_replies(with_int("ada", 50)).await.unwrap())
        .await
        .unwrap();
    assert_eq!(replies.len(), 4);
    assert_eq!(replies[3].hello, "Hello, ada! (4/4)");

    server.stop().await;
}

#[tokio::test]
async fn lots_of_greetings_collects_in_order() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut client = server.client().await;

    let empty = client.lots_of_greetings(vec![]).await.unwrap();
    assert!(empty.responses.is_empty());

    let reqs = ["ada", "bob", "cy"]
        .into_iter()
        .map(SayHelloRequest::named)
        .collect();
    let collected = client.lots_of_greetings(reqs).await.unwrap();
    assert_eq!(
        texts(collected.responses),
        vec!["Hello, ada!", "Hello, bob!", "Hello, cy!"]
    );

    let status = client
        .lots_of_greetings(vec![SayHelloRequest::named("ada"), SayHelloRequest::default()])
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    server.stop().await;
}

#[tokio::test]
async fn lots_of_greetings_is_bounded() {
    let mut config = ServerConfig::default();
    config.greeter.max_collected = 2;
    let server = TestServer::start(config).await;
    let mut client = server.client().await;

    let ok = client
        .lots_of_greetings(vec![SayHelloRequest::named("a"), SayHelloRequest::named("b")])
        .await
        .unwrap();
    assert_eq!(ok.responses.len(), 2);

    let status = client
        .lots_of_greetings(vec![
            SayHelloRequest::named("a"),
            SayHelloRequest::named("b"),
            SayHelloRequest::named("c"),
        ])
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::ResourceExhausted);

    server.stop().await;
}

#[tokio::test]
async fn bidi_hello_interleaves_reads_and_writes() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut client = server.client().await;

    let (tx, rx) = mpsc::channel(4);
    let mut responses = client
        .bidi_hello_stream(ReceiverStream::new(rx))
        .await
        .unwrap();

    // Each reply arrives while the request side is still open
    for name in ["ada", "bob", "cy"] {
        tx.send(SayHelloRequest::named(name)).await.unwrap();
        let reply = responses.message().await.unwrap().expect("reply");
        assert_eq!(reply.hello, format!("Hello, {}!", name));
    }

    drop(tx);
    assert!(responses.message().await.unwrap().is_none());

    server.stop().await;
}

#[tokio::test]
async fn bidi_hello_from_list() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut client = server.client().await;

    let reqs = vec![SayHelloRequest::named("ada"), SayHelloRequest::named("bob")];
    let stream = client
        .bidi_hello(reqs, std::time::Duration::from_millis(5))
        .await
        .unwrap();
    let replies = collect_responses(stream).await.unwrap();
    assert_eq!(texts(replies), vec!["Hello, ada!", "Hello, bob!"]);

    let empty = collect_responses(
        client
            .bidi_hello(vec![], std::time::Duration::ZERO)
            .await
            .unwrap(),
    )
    .await
    .unwrap();
    assert!(empty.is_empty());

    server.stop().await;
}

#[tokio::test]
async fn bidi_hello_stops_at_invalid_request() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut client = server.client().await;

    // Sent back to back, so the valid greetings are still queued for
    // encoding when the empty name is rejected
    let reqs = vec![
        SayHelloRequest::named("ada"),
        SayHelloRequest::named("bob"),
        SayHelloRequest::named(""),
        SayHelloRequest::named("cy"),
    ];
    let mut stream = client
        .bidi_hello(reqs, std::time::Duration::ZERO)
        .await
        .unwrap();

    let first = stream.message().await.unwrap().expect("first reply");
    assert_eq!(first.hello, "Hello, ada!");
    let second = stream.message().await.unwrap().expect("second reply");
    assert_eq!(second.hello, "Hello, bob!");
    let status = stream.message().await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    server.stop().await;
}

#[tokio::test]
async fn bearer_token_is_enforced() {
    let config = ServerConfig {
        auth_token: Some("secret123".to_string()),
        ..Default::default()
    };
    let server = TestServer::start(config).await;

    let mut anonymous = server.client().await;
    let status = anonymous
        .say_hello(SayHelloRequest::named("ada"))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    let mut wrong = server
        .client_with(ClientOptions {
            auth_token: Some("nope".to_string()),
            ..Default::default()
        })
        .await;
    let status = wrong
        .lots_of_greetings(vec![SayHelloRequest::named("ada")])
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    let mut authorized = server
        .client_with(ClientOptions {
            auth_token: Some("secret123".to_string()),
            ..Default::default()
        })
        .await;
    let resp = authorized
        .say_hello(SayHelloRequest::named("ada"))
        .await
        .unwrap();
    assert_eq!(resp.hello, "Hello, ada!");

    server.stop().await;
}

#[tokio::test]
async fn custom_template_and_plain_transport() {
    let mut config = ServerConfig::default();
    config.greeter.template = "Howdy {name}".to_string();
    let server = TestServer::start(config).await;

    let mut client = server
        .client_with(ClientOptions {
            gzip: false,
            ..Default::default()
        })
        .await;
    let resp = client.say_hello(SayHelloRequest::named("ada")).await.unwrap();
    assert_eq!(resp.hello, "Howdy ada");

    server.stop().await;
}

#[tokio::test]
async fn health_service_reports_serving() {
    use tonic_health::pb::health_check_response::ServingStatus;
    use tonic_health::pb::health_client::HealthClient;
    use tonic_health::pb::HealthCheckRequest;

    let server = TestServer::start(ServerConfig::default()).await;
    // Connecting first guarantees the server task has registered its services
    let _client = server.client().await;

    let channel = tonic::transport::Endpoint::from_shared(server.url.clone())
        .unwrap()
        .connect()
        .await
        .unwrap();
    let mut health = HealthClient::new(channel);
    let resp = health
        .check(HealthCheckRequest {
            service: "pb.hello.HelloWorld".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(resp.status, ServingStatus::Serving as i32);
    assert!(server.readiness.is_ready());

    server.stop().await;
}
