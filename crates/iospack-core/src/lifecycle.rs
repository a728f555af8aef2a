use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse status of a generation flow: `Idle -> Pending -> {Archived | Failed}`.
///
/// A new request re-enters `Pending` from any phase; nothing returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationPhase {
    Idle,
    Pending,
    Archived,
    Failed,
}

impl fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Pending => write!(f, "pending"),
            Self::Archived => write!(f, "archived"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde() {
        for phase in [
            GenerationPhase::Idle,
            GenerationPhase::Pending,
            GenerationPhase::Archived,
            GenerationPhase::Failed,
        ] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, format!("\"{phase}\""));
        }
    }
}
