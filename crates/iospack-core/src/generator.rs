use crate::store::{GenerationFailure, GenerationState, GenerationStore};
use iospack_remote::ArtifactBackend;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives one generation flow: validates the request id, asks the backend
/// for the archive, and records the outcome in the flow's store.
pub struct Generator<B> {
    backend: B,
    store: Arc<GenerationStore>,
}

impl<B: ArtifactBackend> Generator<B> {
    pub fn new(backend: B, store: Arc<GenerationStore>) -> Self {
        Self { backend, store }
    }

    pub fn store(&self) -> &Arc<GenerationStore> {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Request the package prepared under `request_id` and return the
    /// resulting state. Never fails: invalid ids, transport errors and
    /// service errors all come back as a failed state.
    ///
    /// The store reads `Pending` for the whole duration of the backend call.
    /// If another call begins meanwhile, this call's result is discarded and
    /// the returned snapshot reflects the newer request.
    pub fn request_generation(&self, request_id: Option<i64>) -> GenerationState {
        let pending = match self.store.begin_request(request_id) {
            Ok(pending) => pending,
            Err(e) => {
                warn!("generation request rejected: {e}");
                self.store.complete_with_error(GenerationFailure::from(e));
                return self.store.snapshot();
            }
        };

        let outcome = self
            .backend
            .fetch_archive(pending.request_id)
            .map_err(GenerationFailure::from);

        match &outcome {
            Ok(archive) => info!("generation request {} archived: {archive}", pending.request_id),
            Err(failure) => warn!(
                "generation request {} failed ({:?}): {failure}",
                pending.request_id, failure.kind
            ),
        }

        if !self.store.settle(pending.token, outcome) {
            debug!(
                "generation request {} superseded before it resolved",
                pending.request_id
            );
        }
        self.store.snapshot()
    }
}
