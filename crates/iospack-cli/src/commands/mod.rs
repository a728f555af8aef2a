pub mod completions;
pub mod generate;
pub mod options;

use indicatif::{ProgressBar, ProgressStyle};
use iospack_core::{GenerationPhase, GenerationState};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_GENERATION_FAILED: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_phase(phase: GenerationPhase) -> String {
    use console::Style;
    let label = phase.to_string();
    match phase {
        GenerationPhase::Archived => Style::new().green().apply_to(label).to_string(),
        GenerationPhase::Pending => Style::new().cyan().bold().apply_to(label).to_string(),
        GenerationPhase::Failed => Style::new().red().apply_to(label).to_string(),
        GenerationPhase::Idle => Style::new().dim().apply_to(label).to_string(),
    }
}

/// Flat JSON view of a generation state, the shape `--json` prints.
pub fn state_payload(state: &GenerationState) -> serde_json::Value {
    serde_json::json!({
        "phase": state.phase(),
        "request_id": state.request_id().map(iospack_schema::RequestId::get),
        "archive": state.archive_ref().map(iospack_schema::ArchiveRef::as_str),
        "error": state.error(),
        "error_kind": state.failure().map(|f| f.kind),
    })
}

pub fn make_remote_backend(
    remote_url: Option<&str>,
    token: Option<&str>,
) -> Result<iospack_remote::http::HttpBackend, String> {
    let mut config = if let Some(url) = remote_url {
        iospack_remote::RemoteConfig::new(url)
    } else {
        iospack_remote::RemoteConfig::load_default()
            .map_err(|e| format!("no --remote and no config: {e}"))?
    };
    if let Some(token) = token {
        config = config.with_token(token);
    }
    Ok(iospack_remote::http::HttpBackend::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use iospack_core::GenerationStore;

    #[test]
    fn json_pretty_serializes_string() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn state_payload_for_archived_state() {
        let store = GenerationStore::new();
        store.begin_request(Some(42)).unwrap();
        store.complete_with_archive("https://x/pkg.zip");

        let payload = state_payload(&store.snapshot());
        assert_eq!(payload["phase"], "archived");
        assert_eq!(payload["request_id"], 42);
        assert_eq!(payload["archive"], "https://x/pkg.zip");
        assert!(payload["error"].is_null());
        assert!(payload["error_kind"].is_null());
    }

    #[test]
    fn state_payload_for_idle_state() {
        let payload = state_payload(&GenerationState::Idle);
        assert_eq!(payload["phase"], "idle");
        assert!(payload["request_id"].is_null());
    }

    #[test]
    fn remote_backend_from_flag() {
        let backend = make_remote_backend(Some("http://build.local/"), Some("t0k")).unwrap();
        assert_eq!(backend.config().url, "http://build.local");
        assert_eq!(backend.config().auth_token.as_deref(), Some("t0k"));
    }
}
