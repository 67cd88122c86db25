//! Generated `pb.hello` types and the runtime descriptor of `HelloWorld`.

use crate::descriptor;
use crate::error::DescriptorError;
use hello_shared::ServiceDescriptor;

pub mod pb {
    tonic::include_proto!("pb");

    pub mod hello {
        tonic::include_proto!("pb.hello");
    }

    pub mod http {
        tonic::include_proto!("pb.http");
    }
}

pub use pb::hello::*;

pub const PACKAGE: &str = "pb.hello";
pub const SERVICE: &str = "HelloWorld";

/// Compiled schema: `hello.proto` and the files it imports
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("hello_descriptor");

/// Every service declared in the compiled schema.
pub fn service_descriptors() -> Result<Vec<ServiceDescriptor>, DescriptorError> {
    descriptor::services(FILE_DESCRIPTOR_SET)
}

/// Descriptor of `pb.hello.HelloWorld`, read from the compiled schema.
pub fn hello_world_descriptor() -> Result<ServiceDescriptor, DescriptorError> {
    let full_name = format!("{}.{}", PACKAGE, SERVICE);
    service_descriptors()?
        .into_iter()
        .find(|service| service.full_name() == full_name)
        .ok_or(DescriptorError::MissingService(full_name))
}

impl SayHelloRequest {
    /// Request carrying only a name; every other field left at its default.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl SayHelloResponse {
    pub fn new(hello: impl Into<String>) -> Self {
        Self {
            hello: hello.into(),
        }
    }
}
