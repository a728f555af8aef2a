//! Lifecycle state of one generation flow and the transitions that mutate it.
//!
//! The store is a handle, not a global: each flow (e.g. each package target)
//! owns its own `Arc<GenerationStore>`. Readers only ever get owned snapshots.

use crate::lifecycle::GenerationPhase;
use crate::CoreError;
use iospack_remote::RemoteError;
use iospack_schema::{ArchiveRef, RequestId};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

/// Monotonically increasing tag of a begun request. Only the holder of the
/// current token may settle the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Handed out by [`GenerationStore::begin_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: RequestId,
    pub token: RequestToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing or non-positive identifier; no network call was made.
    InvalidRequest,
    /// The service could not be reached. Retrying the same id may succeed.
    TransportFailure,
    /// The service answered with an error or an unusable body.
    ServiceFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct GenerationFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl GenerationFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<CoreError> for GenerationFailure {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidRequest(_) => Self::new(FailureKind::InvalidRequest, err.to_string()),
        }
    }
}

impl From<RemoteError> for GenerationFailure {
    fn from(err: RemoteError) -> Self {
        let kind = match err {
            RemoteError::Io(_) | RemoteError::Transport(_) | RemoteError::Config(_) => {
                FailureKind::TransportFailure
            }
            RemoteError::Service { .. } | RemoteError::Serialization(_) => {
                FailureKind::ServiceFailure
            }
        };
        Self::new(kind, err.user_message())
    }
}

pub type GenerationOutcome = Result<ArchiveRef, GenerationFailure>;

/// Current state of a generation flow.
///
/// An archive and an error can never coexist: both live in the single
/// `outcome` of `Done`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationState {
    #[default]
    Idle,
    Pending {
        request_id: RequestId,
        token: RequestToken,
    },
    Done {
        /// Last accepted identifier, if any request was ever begun.
        request_id: Option<RequestId>,
        /// Set only when the outcome was settled by the request that began it.
        token: Option<RequestToken>,
        outcome: GenerationOutcome,
    },
}

impl GenerationState {
    pub fn phase(&self) -> GenerationPhase {
        match self {
            Self::Idle => GenerationPhase::Idle,
            Self::Pending { .. } => GenerationPhase::Pending,
            Self::Done { outcome: Ok(_), .. } => GenerationPhase::Archived,
            Self::Done { outcome: Err(_), .. } => GenerationPhase::Failed,
        }
    }

    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::Idle => None,
            Self::Pending { request_id, .. } => Some(*request_id),
            Self::Done { request_id, .. } => *request_id,
        }
    }

    pub fn archive_ref(&self) -> Option<&ArchiveRef> {
        match self {
            Self::Done {
                outcome: Ok(archive),
                ..
            } => Some(archive),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&GenerationFailure> {
        match self {
            Self::Done {
                outcome: Err(failure),
                ..
            } => Some(failure),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.failure().map(|failure| failure.message.as_str())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: GenerationState,
    last_token: u64,
}

/// Holder of one flow's [`GenerationState`].
///
/// `complete_with_archive` and `complete_with_error` apply unconditionally;
/// ordering is the orchestrator's job and goes through [`Self::settle`].
#[derive(Debug, Default)]
pub struct GenerationStore {
    inner: Mutex<Inner>,
}

impl GenerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation is a single assignment, so a poisoned lock still guards
    // a consistent state.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enter `Pending` for `raw`, superseding whatever came before.
    /// Absent, zero and negative identifiers leave the state untouched.
    pub fn begin_request(&self, raw: Option<i64>) -> Result<PendingRequest, CoreError> {
        let request_id = RequestId::from_raw(raw).ok_or(CoreError::InvalidRequest(raw))?;
        let mut inner = self.lock();
        inner.last_token += 1;
        let token = RequestToken(inner.last_token);
        inner.state = GenerationState::Pending { request_id, token };
        info!("generation request {request_id} pending (token {})", token.0);
        Ok(PendingRequest { request_id, token })
    }

    pub fn complete_with_archive(&self, archive: impl Into<ArchiveRef>) {
        self.complete(Ok(archive.into()));
    }

    pub fn complete_with_error(&self, failure: GenerationFailure) {
        self.complete(Err(failure));
    }

    fn complete(&self, outcome: GenerationOutcome) {
        let mut inner = self.lock();
        let request_id = inner.state.request_id();
        inner.state = GenerationState::Done {
            request_id,
            token: None,
            outcome,
        };
    }

    /// Settle the request identified by `token`. Returns `false`, leaving the
    /// state untouched, when that request is no longer the pending one.
    pub fn settle(&self, token: RequestToken, outcome: GenerationOutcome) -> bool {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match inner.state {
            GenerationState::Pending {
                request_id,
                token: current,
            } if current == token => {
                inner.state = GenerationState::Done {
                    request_id: Some(request_id),
                    token: Some(token),
                    outcome,
                };
                true
            }
            _ => {
                debug!(
                    "discarding stale resolution for token {} (now {})",
                    token.0,
                    inner.state.phase()
                );
                false
            }
        }
    }

    pub fn snapshot(&self) -> GenerationState {
        self.lock().state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exclusive(state: &GenerationState) {
        assert!(
            !(state.archive_ref().is_some() && state.error().is_some()),
            "archive and error both set: {state:?}"
        );
    }

    fn service_failure(msg: &str) -> GenerationFailure {
        GenerationFailure::new(FailureKind::ServiceFailure, msg)
    }

    #[test]
    fn starts_idle() {
        let store = GenerationStore::new();
        let state = store.snapshot();
        assert_eq!(state, GenerationState::Idle);
        assert_eq!(state.phase(), GenerationPhase::Idle);
        assert!(state.request_id().is_none());
        assert!(state.archive_ref().is_none());
        assert!(state.error().is_none());
    }

    #[test]
    fn begin_rejects_invalid_ids_without_mutation() {
        let store = GenerationStore::new();
        for raw in [None, Some(0), Some(-1), Some(i64::MIN)] {
            assert_eq!(
                store.begin_request(raw).unwrap_err(),
                CoreError::InvalidRequest(raw)
            );
            assert_eq!(store.snapshot(), GenerationState::Idle);
        }
    }

    #[test]
    fn begin_enters_pending_and_clears_outcome() {
        let store = GenerationStore::new();
        store.complete_with_error(service_failure("old"));
        let pending = store.begin_request(Some(42)).unwrap();

        let state = store.snapshot();
        assert!(state.is_pending());
        assert_eq!(state.request_id(), Some(pending.request_id));
        assert_eq!(pending.request_id.get(), 42);
        assert!(state.archive_ref().is_none());
        assert!(state.error().is_none());
    }

    #[test]
    fn tokens_increase_monotonically() {
        let store = GenerationStore::new();
        let a = store.begin_request(Some(1)).unwrap().token;
        let b = store.begin_request(Some(1)).unwrap().token;
        let c = store.begin_request(Some(2)).unwrap().token;
        assert!(a < b && b < c);
    }

    #[test]
    fn archive_clears_error() {
        let store = GenerationStore::new();
        store.begin_request(Some(5)).unwrap();
        store.complete_with_error(service_failure("boom"));
        store.complete_with_archive("https://x/pkg.zip");

        let state = store.snapshot();
        assert_eq!(state.phase(), GenerationPhase::Archived);
        assert_eq!(state.archive_ref().map(ArchiveRef::as_str), Some("https://x/pkg.zip"));
        assert!(state.error().is_none());
        assert_eq!(state.request_id().map(RequestId::get), Some(5));
    }

    #[test]
    fn error_clears_archive() {
        let store = GenerationStore::new();
        store.begin_request(Some(5)).unwrap();
        store.complete_with_archive("a.zip");
        store.complete_with_error(service_failure("build failed"));

        let state = store.snapshot();
        assert_eq!(state.phase(), GenerationPhase::Failed);
        assert_eq!(state.error(), Some("build failed"));
        assert!(state.archive_ref().is_none());
        assert_exclusive(&state);
    }

    #[test]
    fn completion_without_begin_still_applies() {
        let store = GenerationStore::new();
        store.complete_with_archive("orphan.zip");
        let state = store.snapshot();
        assert_eq!(state.archive_ref().map(ArchiveRef::as_str), Some("orphan.zip"));
        assert!(state.request_id().is_none());
    }

    #[test]
    fn settle_with_current_token_applies() {
        let store = GenerationStore::new();
        let pending = store.begin_request(Some(9)).unwrap();
        assert!(store.settle(pending.token, Ok(ArchiveRef::new("ok.zip"))));

        match store.snapshot() {
            GenerationState::Done {
                request_id, token, ..
            } => {
                assert_eq!(request_id, Some(pending.request_id));
                assert_eq!(token, Some(pending.token));
            }
            other => panic!("expected done, got {other:?}"),
        }
    }

    #[test]
    fn settle_with_stale_token_is_discarded() {
        let store = GenerationStore::new();
        let first = store.begin_request(Some(1)).unwrap();
        let second = store.begin_request(Some(2)).unwrap();

        assert!(!store.settle(first.token, Ok(ArchiveRef::new("stale.zip"))));
        assert!(store.snapshot().is_pending());

        assert!(store.settle(second.token, Err(service_failure("fresh"))));
        assert!(!store.settle(first.token, Ok(ArchiveRef::new("stale.zip"))));
        assert_eq!(store.snapshot().error(), Some("fresh"));
    }

    #[test]
    fn settle_after_unguarded_completion_is_discarded() {
        let store = GenerationStore::new();
        let pending = store.begin_request(Some(3)).unwrap();
        store.complete_with_error(service_failure("cancelled"));
        assert!(!store.settle(pending.token, Ok(ArchiveRef::new("late.zip"))));
        assert_eq!(store.snapshot().error(), Some("cancelled"));
    }

    #[test]
    fn snapshot_is_stable_and_detached() {
        let store = GenerationStore::new();
        store.begin_request(Some(4)).unwrap();
        let first = store.snapshot();
        let second = store.snapshot();
        assert_eq!(first, second);

        store.complete_with_archive("later.zip");
        assert!(first.is_pending());
        assert_ne!(store.snapshot(), first);
    }

    #[test]
    fn remote_errors_map_to_failure_kinds() {
        let transport = GenerationFailure::from(RemoteError::Transport("refused".to_owned()));
        assert_eq!(transport.kind, FailureKind::TransportFailure);

        let service = GenerationFailure::from(RemoteError::Service {
            status: 500,
            message: "build failed".to_owned(),
        });
        assert_eq!(service.kind, FailureKind::ServiceFailure);
        assert_eq!(service.message, "build failed");
    }

    #[test]
    fn failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::InvalidRequest).unwrap();
        assert_eq!(json, "\"invalid_request\"");
    }
}
