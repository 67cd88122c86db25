//! Audit trail for access to the HelloWorld service.
//!
//! Events go to the `hello::audit` target so they can be routed apart from
//! operational logs. Every event carries an `event` name and the caller's
//! `peer` address when one is known.

use std::net::SocketAddr;
use tonic::Status;
use tracing::{info, warn};

pub const AUDIT_TARGET: &str = "hello::audit";

const UNKNOWN_PEER: &str = "unknown";

/// Result of the bearer-token check for one gRPC call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No token configured, every caller is let through
    Open,
    Accepted,
    Denied(&'static str),
}

fn peer_label(peer: Option<SocketAddr>) -> String {
    peer.map_or_else(|| UNKNOWN_PEER.to_string(), |addr| addr.to_string())
}

/// Record the bearer-token decision for a gRPC call.
pub fn grpc_auth(peer: Option<SocketAddr>, outcome: AuthOutcome) {
    let peer = peer_label(peer);
    match outcome {
        AuthOutcome::Open => info!(
            target: AUDIT_TARGET,
            event = "grpc_auth",
            result = "open",
            peer = %peer,
        ),
        AuthOutcome::Accepted => info!(
            target: AUDIT_TARGET,
            event = "grpc_auth",
            result = "accepted",
            peer = %peer,
        ),
        AuthOutcome::Denied(reason) => warn!(
            target: AUDIT_TARGET,
            event = "grpc_auth",
            result = "denied",
            peer = %peer,
            reason = %reason,
        ),
    }
}

/// Record a HelloWorld call that was refused because of its request content.
pub fn greeting_rejected(method: &str, peer: Option<SocketAddr>, status: &Status) {
    warn!(
        target: AUDIT_TARGET,
        event = "greeting_rejected",
        method = %method,
        peer = %peer_label(peer),
        code = %crate::metrics::code_label(status.code()),
        reason = %status.message(),
    );
}

/// Record a request to the admin HTTP endpoint.
pub fn admin_http_request(path: &str, status: u16) {
    info!(
        target: AUDIT_TARGET,
        event = "admin_http_request",
        path = %path,
        status = status,
    );
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run `f` under a JSON subscriber and return the audit events it emitted.
    pub fn audit_events(f: impl FnOnce()) -> Vec<serde_json::Value> {
        let sink = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(sink.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);

        let bytes = sink.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
            .filter(|event| event["target"] == super::AUDIT_TARGET)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::audit_events;
    use super::*;

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.7:52000".parse().unwrap())
    }

    #[test]
    fn test_auth_events_carry_peer_and_result() {
        let events = audit_events(|| {
            grpc_auth(peer(), AuthOutcome::Accepted);
            grpc_auth(None, AuthOutcome::Open);
            grpc_auth(peer(), AuthOutcome::Denied("invalid token"));
        });
        assert_eq!(events.len(), 3);

        assert_eq!(events[0]["fields"]["event"], "grpc_auth");
        assert_eq!(events[0]["fields"]["result"], "accepted");
        assert_eq!(events[0]["fields"]["peer"], "10.0.0.7:52000");
        assert_eq!(events[0]["level"], "INFO");

        assert_eq!(events[1]["fields"]["result"], "open");
        assert_eq!(events[1]["fields"]["peer"], "unknown");

        assert_eq!(events[2]["fields"]["result"], "denied");
        assert_eq!(events[2]["fields"]["reason"], "invalid token");
        assert_eq!(events[2]["level"], "WARN");
    }

    #[test]
    fn test_greeting_rejected_event() {
        let events = audit_events(|| {
            greeting_rejected(
                "BidiHello",
                peer(),
                &Status::invalid_argument("name must not be empty"),
            );
        });
        assert_eq!(events.len(), 1);
        let fields = &events[0]["fields"];
        assert_eq!(fields["event"], "greeting_rejected");
        assert_eq!(fields["method"], "BidiHello");
        assert_eq!(fields["code"], "invalidargument");
        assert_eq!(fields["reason"], "name must not be empty");
    }

    #[test]
    fn test_admin_request_event() {
        let events = audit_events(|| admin_http_request("/metrics", 200));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["fields"]["path"], "/metrics");
        assert_eq!(events[0]["fields"]["status"], 200);
    }
}
