use crate::RemoteError;
use iospack_schema::ArchiveRef;
use serde_json::Value;

/// Message used when neither the body nor the status line says anything.
pub const GENERIC_FAILURE: &str = "artifact request failed";

/// Extract the archive reference from a successful lookup body.
///
/// A body that is not a JSON object with a non-empty string `archive` member is
/// a service failure; its message follows [`failure_message`].
pub fn parse_archive(
    status: u16,
    status_text: Option<&str>,
    body: &[u8],
) -> Result<ArchiveRef, RemoteError> {
    let archive = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| match value.get("archive") {
            Some(Value::String(archive)) if !archive.trim().is_empty() => Some(archive.clone()),
            _ => None,
        });

    match archive {
        Some(archive) => Ok(ArchiveRef::new(archive)),
        None => Err(RemoteError::Service {
            status,
            message: failure_message(body, status_text),
        }),
    }
}

/// Most specific error message available for a failed lookup, in order:
/// the body's `error` member, the raw body, the status text, [`GENERIC_FAILURE`].
/// A body that is a bare JSON string counts as raw text without its quotes.
pub fn failure_message(body: &[u8], status_text: Option<&str>) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::String(text)) if !text.trim().is_empty() => return text.trim().to_owned(),
        Ok(value) => match value.get("error") {
            Some(Value::String(error)) if !error.trim().is_empty() => return error.clone(),
            Some(Value::Null | Value::String(_)) | None => {}
            Some(other) => return other.to_string(),
        },
        Err(_) => {}
    }

    let raw = String::from_utf8_lossy(body);
    let raw = raw.trim();
    if !raw.is_empty() {
        return raw.to_owned();
    }

    match status_text.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_owned(),
        _ => GENERIC_FAILURE.to_owned(),
    }
}
