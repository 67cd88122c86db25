//! Prometheus metrics for the HelloWorld service

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, Encoder,
    HistogramVec, IntGauge, TextEncoder,
};
use std::time::Instant;
use tonic::{Code, Status};

// ── RPC metrics ──────────────────────────────────────────────────────────────

pub static RPC_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hello_rpc_total",
        "Completed HelloWorld RPCs by method and status code",
        &["method", "code"]
    )
    .unwrap()
});

pub static RPC_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "hello_rpc_duration_seconds",
        "HelloWorld RPC latency (streams: until the handler finishes)",
        &["method"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .unwrap()
});

// ── Streaming metrics ────────────────────────────────────────────────────────

pub static STREAM_MESSAGES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hello_stream_messages_total",
        "Messages moved over streaming RPCs",
        &["method", "direction"]
    )
    .unwrap()
});

pub static ACTIVE_STREAMS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "hello_active_streams",
        "Streaming RPCs currently producing responses"
    )
    .unwrap()
});

/// Stream message direction label.
#[derive(Debug, Clone, Copy)]
pub enum Direction {
    Received,
    Sent,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Received => "received",
            Direction::Sent => "sent",
        }
    }
}

/// `code` label for a gRPC status code, e.g. `invalidargument`.
pub fn code_label(code: Code) -> String {
    format!("{:?}", code).to_lowercase()
}

/// Record the outcome and latency of one RPC.
pub fn observe_rpc<T>(method: &str, started: Instant, result: &Result<T, Status>) {
    let code = match result {
        Ok(_) => code_label(Code::Ok),
        Err(status) => code_label(status.code()),
    };
    record(method, started, &code);
}

fn record(method: &str, started: Instant, code: &str) {
    RPC_TOTAL.with_label_values(&[method, code]).inc();
    RPC_DURATION
        .with_label_values(&[method])
        .observe(started.elapsed().as_secs_f64());
}

/// Times one RPC from the handler call until its last message.
///
/// Streaming handlers move the timer into the response stream and call
/// [`RpcTimer::finish`] with the final status. A timer dropped unfinished
/// (the client went away mid-stream) counts as `cancelled`.
#[derive(Debug)]
pub struct RpcTimer {
    method: &'static str,
    started: Instant,
    finished: bool,
}

impl RpcTimer {
    pub fn start(method: &'static str) -> Self {
        Self {
            method,
            started: Instant::now(),
            finished: false,
        }
    }

    pub fn finish<T>(mut self, result: &Result<T, Status>) {
        self.finished = true;
        observe_rpc(self.method, self.started, result);
    }
}

impl Drop for RpcTimer {
    fn drop(&mut self) {
        if !self.finished {
            record(self.method, self.started, &code_label(Code::Cancelled));
        }
    }
}

pub fn stream_message(method: &str, direction: Direction) {
    STREAM_MESSAGES
        .with_label_values(&[method, direction.as_str()])
        .inc();
}

/// Keeps `hello_active_streams` raised for as long as it is alive.
pub struct ActiveStreamGuard;

impl ActiveStreamGuard {
    pub fn new() -> Self {
        ACTIVE_STREAMS.inc();
        Self
    }
}

impl Default for ActiveStreamGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ActiveStreamGuard {
    fn drop(&mut self) {
        ACTIVE_STREAMS.dec();
    }
}

/// Render all registered metrics to Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
