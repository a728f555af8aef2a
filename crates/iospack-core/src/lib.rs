//! Orchestration of iOS package generation requests.
//!
//! This crate owns the lifecycle of one generation flow: the [`GenerationStore`]
//! holding the current [`GenerationState`], the [`Generator`] that drives a
//! request against an [`iospack_remote::ArtifactBackend`], and the failure
//! taxonomy every outcome is folded into. Callers never see an `Err` from
//! [`Generator::request_generation`]; failures live in the returned state.

pub mod generator;
pub mod lifecycle;
pub mod store;

pub use generator::Generator;
pub use lifecycle::GenerationPhase;
pub use store::{
    FailureKind, GenerationFailure, GenerationOutcome, GenerationState, GenerationStore,
    PendingRequest, RequestToken,
};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("{}", describe_invalid_request(.0))]
    InvalidRequest(Option<i64>),
}

fn describe_invalid_request(raw: &Option<i64>) -> String {
    match *raw {
        None => "request id is not defined".to_owned(),
        Some(id) => format!("request id is not defined: {id} is not a positive integer"),
    }
}
