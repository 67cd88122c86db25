//! Bearer token authentication for the gRPC endpoint

use crate::audit::{self, AuthOutcome};
use std::sync::Arc;
use tonic::metadata::{Ascii, MetadataMap, MetadataValue};
use tonic::service::Interceptor;
use tonic::{Request, Status};

const AUTHORIZATION: &str = "authorization";
const BEARER_PREFIX: &str = "Bearer ";

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingHeader,
    InvalidEncoding,
    MissingBearerPrefix,
    InvalidToken,
}

impl AuthFailure {
    pub fn reason(self) -> &'static str {
        match self {
            AuthFailure::MissingHeader => "missing authorization header",
            AuthFailure::InvalidEncoding => "invalid authorization header encoding",
            AuthFailure::MissingBearerPrefix => "missing Bearer prefix",
            AuthFailure::InvalidToken => "invalid token",
        }
    }
}

impl From<AuthFailure> for Status {
    fn from(failure: AuthFailure) -> Self {
        Status::unauthenticated(failure.reason())
    }
}

/// Check `authorization: Bearer <expected>` in request metadata.
pub fn check_bearer(metadata: &MetadataMap, expected: &str) -> Result<(), AuthFailure> {
    let value = metadata
        .get(AUTHORIZATION)
        .ok_or(AuthFailure::MissingHeader)?
        .to_str()
        .map_err(|_| AuthFailure::InvalidEncoding)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthFailure::MissingBearerPrefix)?;
    if token == expected {
        Ok(())
    } else {
        Err(AuthFailure::InvalidToken)
    }
}

/// Interceptor enforcing a bearer token. With no token configured every
/// request passes.
#[derive(Debug, Clone, Default)]
pub struct BearerAuth {
    expected: Option<Arc<str>>,
}

impl BearerAuth {
    pub fn new(expected: Option<String>) -> Self {
        Self {
            expected: expected.map(Arc::from),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.expected.is_some()
    }
}

impl Interceptor for BearerAuth {
    fn call(&mut self, req: Request<()>) -> Result<Request<()>, Status> {
        let peer = req.remote_addr();
        let Some(expected) = self.expected.as_deref() else {
            audit::grpc_auth(peer, AuthOutcome::Open);
            return Ok(req);
        };

        match check_bearer(req.metadata(), expected) {
            Ok(()) => {
                audit::grpc_auth(peer, AuthOutcome::Accepted);
                Ok(req)
            }
            Err(failure) => {
                audit::grpc_auth(peer, AuthOutcome::Denied(failure.reason()));
                Err(failure.into())
            }
        }
    }
}

/// Attach `authorization: Bearer <token>` to an outgoing request.
pub fn insert_bearer<T>(request: &mut Request<T>, token: &str) -> Result<(), Status> {
    let value: MetadataValue<Ascii> = format!("{}{}", BEARER_PREFIX, token)
        .parse()
        .map_err(|_| Status::invalid_argument("auth token is not valid header text"))?;
    request.metadata_mut().insert(AUTHORIZATION, value);
    Ok(())
}
