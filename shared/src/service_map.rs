//! Service descriptors and the service map built from them.
//!
//! The service map is a tree that lets a caller resolve the request and
//! response type of a method from its URL path:
//!
//! - branches are the segments of the URL path, with `:param` segments
//!   replaced by `*`
//! - the final key names the transport: `grpc`, or the lowercase HTTP verb
//!   of a method that declares an HTTP route
//! - leaves are `[RequestTypeName, ResponseTypeName, URL]`
//!
//! For `pb.hello.HelloWorld` the map looks like:
//!
//! ```json
//! {
//!   "pb.hello.HelloWorld": {
//!     "SayHello": {
//!       "grpc": ["pb.hello.SayHelloRequest", "pb.hello.SayHelloResponse", "/pb.hello.HelloWorld/SayHello"]
//!     }
//!   }
//! }
//! ```

use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Key under which gRPC leaves are stored.
pub const GRPC_LEAF: &str = "grpc";

/// Call shape of a method, derived from its streaming flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Unary,
    ServerStreaming,
    ClientStreaming,
    BidiStreaming,
}

impl std::fmt::Display for MethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MethodKind::Unary => "unary",
            MethodKind::ServerStreaming => "server-streaming",
            MethodKind::ClientStreaming => "client-streaming",
            MethodKind::BidiStreaming => "bidi-streaming",
        };
        f.write_str(s)
    }
}

/// Segment standing in for a `:param` path segment
pub const WILDCARD_SEGMENT: &str = "*";

/// HTTP route a method is also exposed under, e.g. `GET /hello/:name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpRoute {
    pub method: String,
    pub path: String,
}

impl HttpRoute {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }

    /// Path segments with `:param` segments replaced by `*`
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(|seg| {
                if seg.starts_with(':') {
                    WILDCARD_SEGMENT
                } else {
                    seg
                }
            })
    }
}

/// One RPC of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    pub name: String,

    /// Fully-qualified request type, e.g. `.pb.hello.SayHelloRequest`
    pub input_type: String,

    /// Fully-qualified response type
    pub output_type: String,

    pub client_streaming: bool,
    pub server_streaming: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpRoute>,
}

impl MethodDescriptor {
    /// A unary method. Use [`Self::streaming_requests`] / [`Self::streaming_responses`]
    /// to change its shape.
    pub fn new(
        name: impl Into<String>,
        input_type: impl Into<String>,
        output_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input_type: input_type.into(),
            output_type: output_type.into(),
            client_streaming: false,
            server_streaming: false,
            http: None,
        }
    }

    pub fn with_http(mut self, route: HttpRoute) -> Self {
        self.http = Some(route);
        self
    }

    pub fn streaming_requests(mut self) -> Self {
        self.client_streaming = true;
        self
    }

    pub fn streaming_responses(mut self) -> Self {
        self.server_streaming = true;
        self
    }

    pub fn kind(&self) -> MethodKind {
        match (self.client_streaming, self.server_streaming) {
            (false, false) => MethodKind::Unary,
            (false, true) => MethodKind::ServerStreaming,
            (true, false) => MethodKind::ClientStreaming,
            (true, true) => MethodKind::BidiStreaming,
        }
    }
}

/// A protobuf service and its methods
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub package: String,
    pub name: String,
    pub methods: Vec<MethodDescriptor>,
}

impl ServiceDescriptor {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            methods: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// `package.Service`, or just `Service` when the package is empty.
    pub fn full_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    /// gRPC URL path of a method: `/package.Service/Method`
    pub fn path(&self, method: &str) -> String {
        format!("/{}/{}", self.full_name(), method)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Branches keyed by URL segment (or transport name at the last level).
pub type ServiceTreeMap<'a> = BTreeMap<Cow<'a, str>, ServiceMapNode<'a>>;

/// A branch or leaf of the service tree map
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum ServiceMapNode<'a> {
    Branch(ServiceTreeMap<'a>),

    #[serde(serialize_with = "serialize_leaf")]
    Leaf {
        method: &'a MethodDescriptor,
        url: String,
    },
}

impl<'a> ServiceMapNode<'a> {
    fn as_branch_mut(&mut self) -> Option<&mut ServiceTreeMap<'a>> {
        match self {
            Self::Branch(children) => Some(children),
            Self::Leaf { .. } => None,
        }
    }
}

/// Remove the leading . from a type path
fn no_leading_dot(s: &str) -> &str {
    s.strip_prefix('.').unwrap_or(s)
}

fn serialize_leaf<S>(method: &MethodDescriptor, url: &str, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    [
        no_leading_dot(&method.input_type),
        no_leading_dot(&method.output_type),
        url,
    ]
    .serialize(serializer)
}

/// Build the service tree map for the given services.
///
/// A method with an HTTP route is keyed by its route; every other method by
/// its gRPC path.
pub fn create(services: &[ServiceDescriptor]) -> ServiceTreeMap<'_> {
    let mut map = ServiceTreeMap::new();

    for service in services {
        'methods: for method in &service.methods {
            let (segments, leaf, url): (Vec<Cow<'_, str>>, Cow<'_, str>, String) =
                match &method.http {
                    Some(route) => (
                        route.segments().map(Cow::Borrowed).collect(),
                        Cow::Owned(route.method.to_lowercase()),
                        route.path.clone(),
                    ),
                    None => (
                        vec![
                            Cow::Owned(service.full_name()),
                            Cow::Borrowed(method.name.as_str()),
                        ],
                        Cow::Borrowed(GRPC_LEAF),
                        service.path(&method.name),
                    ),
                };

            let mut ptr = &mut map;
            for segment in segments {
                let next = ptr
                    .entry(segment)
                    .or_insert_with(|| ServiceMapNode::Branch(BTreeMap::new()))
                    .as_branch_mut();
                match next {
                    Some(next) => ptr = next,
                    // A leaf already occupies this segment
                    None => continue 'methods,
                }
            }

            ptr.insert(leaf, ServiceMapNode::Leaf { method, url });
        }
    }

    map
}

/// Render the service map as pretty-printed JSON.
pub fn to_json_pretty(services: &[ServiceDescriptor]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&create(services))
}
