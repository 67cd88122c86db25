//! Error type for greeting requests and its mapping to gRPC status codes

use thiserror::Error;
use tonic::Status;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HelloError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("name exceeds {max} characters")]
    NameTooLong { max: usize },

    #[error("maybe_int must be non-negative, got {0}")]
    NegativeReplyCount(i32),

    #[error("too many greetings in one call (max {0})")]
    TooManyGreetings(usize),

    #[error("greeting template must contain {{name}}: {0:?}")]
    InvalidTemplate(String),
}

/// Failure to read service descriptors from a compiled schema.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("invalid file descriptor set: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("service {0} not found in the file descriptor set")]
    MissingService(String),
}

impl From<HelloError> for Status {
    fn from(err: HelloError) -> Self {
        match err {
            HelloError::EmptyName
            | HelloError::NameTooLong { .. }
            | HelloError::NegativeReplyCount(_) => Status::invalid_argument(err.to_string()),
            HelloError::TooManyGreetings(_) => Status::resource_exhausted(err.to_string()),
            HelloError::InvalidTemplate(_) => Status::internal(err.to_string()),
        }
    }
}
