//! Service descriptors read from a compiled schema.
//!
//! `prost_types::MethodOptions` discards extension fields, so the file
//! descriptor set is decoded through a narrow mirror of
//! `google/protobuf/descriptor.proto` that keeps the `(pb.http.rule)` method
//! option. Field numbers match `descriptor.proto`; everything else is skipped.

use crate::error::DescriptorError;
use crate::proto::pb::http::HttpRule;
use hello_shared::{HttpRoute, MethodDescriptor, ServiceDescriptor};
use prost::Message;

#[derive(Clone, PartialEq, Message)]
pub struct FileDescriptorSet {
    #[prost(message, repeated, tag = "1")]
    pub file: Vec<FileDescriptorProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FileDescriptorProto {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub package: String,
    #[prost(message, repeated, tag = "6")]
    pub service: Vec<ServiceDescriptorProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ServiceDescriptorProto {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub method: Vec<MethodDescriptorProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct MethodDescriptorProto {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub input_type: String,
    #[prost(string, tag = "3")]
    pub output_type: String,
    #[prost(message, optional, tag = "4")]
    pub options: Option<MethodOptions>,
    #[prost(bool, tag = "5")]
    pub client_streaming: bool,
    #[prost(bool, tag = "6")]
    pub server_streaming: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct MethodOptions {
    /// `(pb.http.rule)`
    #[prost(message, optional, tag = "50101")]
    pub http_rule: Option<HttpRule>,
}

impl MethodDescriptorProto {
    fn http_route(&self) -> Option<HttpRoute> {
        let rule = self.options.as_ref()?.http_rule.as_ref()?;
        if rule.method.is_empty() || rule.path.is_empty() {
            return None;
        }
        Some(HttpRoute::new(rule.method.as_str(), rule.path.as_str()))
    }
}

impl From<&MethodDescriptorProto> for MethodDescriptor {
    fn from(proto: &MethodDescriptorProto) -> Self {
        let mut method = MethodDescriptor::new(
            proto.name.as_str(),
            proto.input_type.as_str(),
            proto.output_type.as_str(),
        );
        method.client_streaming = proto.client_streaming;
        method.server_streaming = proto.server_streaming;
        method.http = proto.http_route();
        method
    }
}

/// Decode an encoded `FileDescriptorSet` into the services it declares, in
/// file order.
pub fn services(bytes: &[u8]) -> Result<Vec<ServiceDescriptor>, DescriptorError> {
    let set = FileDescriptorSet::decode(bytes)?;

    Ok(set
        .file
        .iter()
        .flat_map(|file| {
            file.service.iter().map(move |service| ServiceDescriptor {
                package: file.package.clone(),
                name: service.name.clone(),
                methods: service.method.iter().map(MethodDescriptor::from).collect(),
            })
        })
        .collect())
}
