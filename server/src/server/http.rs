//! Admin HTTP server for health checks, metrics and the service map

use super::Readiness;
use crate::audit;
use crate::metrics;
use crate::proto;
use hyper::service::{make_service_fn, service_fn};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Request, Response, Server, StatusCode};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

/// Start the admin HTTP server serving /healthz, /readyz, /metrics and /servicemap.
/// Returns once `shutdown` is cancelled.
pub async fn serve_admin(
    addr: SocketAddr,
    readiness: Readiness,
    shutdown: CancellationToken,
) -> Result<(), hyper::Error> {
    let make_svc = make_service_fn(move |_| {
        let readiness = readiness.clone();
        async move {
            Ok::<_, hyper::Error>(service_fn(move |req: Request<Body>| {
                let readiness = readiness.clone();
                async move { Ok::<_, hyper::Error>(handle(&req, &readiness)) }
            }))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_svc);
    tracing::info!("Admin HTTP server listening on {}", server.local_addr());
    server
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

fn respond(status: StatusCode, content_type: &'static str, body: impl Into<Body>) -> Response<Body> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn text(status: StatusCode, body: &'static str) -> Response<Body> {
    respond(status, "text/plain; charset=utf-8", body)
}

fn service_map() -> Response<Body> {
    let rendered = proto::service_descriptors()
        .map_err(|e| e.to_string())
        .and_then(|services| {
            hello_shared::service_map::to_json_pretty(&services).map_err(|e| e.to_string())
        });
    match rendered {
        Ok(json) => respond(StatusCode::OK, "application/json", json),
        Err(e) => {
            tracing::warn!("Service map unavailable: {}", e);
            text(StatusCode::INTERNAL_SERVER_ERROR, "service map unavailable\n")
        }
    }
}

fn handle(req: &Request<Body>, readiness: &Readiness) -> Response<Body> {
    let path = req.uri().path();
    let response = match path {
        "/healthz" => text(StatusCode::OK, "ok\n"),

        "/readyz" if readiness.is_ready() => text(StatusCode::OK, "ready\n"),
        "/readyz" => text(StatusCode::SERVICE_UNAVAILABLE, "not ready\n"),

        "/metrics" => respond(
            StatusCode::OK,
            "text/plain; version=0.0.4",
            metrics::encode_metrics(),
        ),

        "/servicemap" => service_map(),

        _ => text(StatusCode::NOT_FOUND, "not found\n"),
    };

    if response.status() != StatusCode::NOT_FOUND {
        audit::admin_http_request(path, response.status().as_u16());
    }
    response
}
