//! Client side of the remote build service that hands out generated iOS packages.
//!
//! This crate provides the [`ArtifactBackend`] seam the generation orchestrator
//! talks to, an HTTP implementation of it ([`http::HttpBackend`]), endpoint
//! configuration with optional authentication, and the rules for turning a
//! service response into either an archive reference or an error message.

pub mod config;
pub mod http;
pub mod response;

pub use config::RemoteConfig;
pub use response::{failure_message, parse_archive, GENERIC_FAILURE};

use iospack_schema::{ArchiveRef, RequestId};
use thiserror::Error;

/// Protocol version sent as `X-Iospack-Protocol` header on all HTTP requests.
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The service could not be reached or the exchange broke off.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered, but with an error payload, a non-success status,
    /// or a body without an archive reference.
    #[error("artifact service error: {message}")]
    Service { status: u16, message: String },
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("remote config error: {0}")]
    Config(String),
}

impl RemoteError {
    /// The message a caller should show for this failure. Service errors are
    /// surfaced verbatim, without the variant prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::Service { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Trait for artifact lookup backends.
pub trait ArtifactBackend: Send + Sync {
    /// Look up the archive produced for a previously prepared package
    /// configuration. Issues exactly one request to the service.
    fn fetch_archive(&self, request_id: RequestId) -> Result<ArchiveRef, RemoteError>;
}

impl<T: ArtifactBackend + ?Sized> ArtifactBackend for std::sync::Arc<T> {
    fn fetch_archive(&self, request_id: RequestId) -> Result<ArchiveRef, RemoteError> {
        (**self).fetch_archive(request_id)
    }
}

/// An absent backend answers every lookup with a config error. Lets callers
/// skip building a backend when no lookup can happen.
impl<T: ArtifactBackend> ArtifactBackend for Option<T> {
    fn fetch_archive(&self, request_id: RequestId) -> Result<ArchiveRef, RemoteError> {
        match self {
            Some(backend) => backend.fetch_archive(request_id),
            None => Err(RemoteError::Config(
                "no artifact service configured".to_owned(),
            )),
        }
    }
}
