//! Shared types and utilities for the HelloWorld service
//!
//! This crate holds the pieces used by both the server and the command-line
//! client that do not depend on generated protobuf code: method/service
//! descriptors, the service map built from them, and small helpers.

pub mod service_map;
pub mod utils;

// Re-export commonly used types
pub use service_map::{HttpRoute, MethodDescriptor, MethodKind, ServiceDescriptor};
