//! HelloWorld gRPC service library
//!
//! Generated `pb.hello` types, the reference server for `pb.hello.HelloWorld`,
//! and a client that drives all four call shapes.

pub mod audit;
pub mod client;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod greeter;
pub mod metrics;
pub mod proto;
pub mod retry;
pub mod server;

pub use client::{ClientOptions, HelloClient};
pub use config::ServerConfig;
pub use error::{DescriptorError, HelloError};
pub use greeter::Greeter;
