use crate::{response, ArtifactBackend, RemoteConfig, RemoteError};
use iospack_schema::{ArchiveRef, RequestId};
use std::io::Read;
use std::time::Duration;

/// HTTP-based artifact lookup backend.
///
/// Expects a single REST route:
/// - `GET /artifacts?ids=<id>`: `200` with `{"archive": "<ref>"}` once the
///   package is ready; any other status, or a body without `archive`, is a
///   failure whose message is taken from `{"error": "..."}`, the raw body, or
///   the status text, in that order.
pub struct HttpBackend {
    config: RemoteConfig,
    agent: ureq::Agent,
}

impl HttpBackend {
    pub fn new(config: RemoteConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build();
        let agent = ureq::Agent::new_with_config(agent_config);
        Self { config, agent }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn lookup_url(&self, request_id: RequestId) -> String {
        format!("{}/artifacts?ids={request_id}", self.config.url)
    }

    /// Issue a GET and return `(status, status text, body)` for any response
    /// the server produced. Only transport failures are errors here.
    fn do_get(&self, url: &str) -> Result<(u16, Option<&'static str>, Vec<u8>), RemoteError> {
        let mut req = self
            .agent
            .get(url)
            .header("Accept", "application/json")
            .header("X-Iospack-Protocol", &crate::PROTOCOL_VERSION.to_string());
        if let Some(ref token) = self.config.auth_token {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }

        let resp = req
            .call()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = resp.status();
        let mut reader = resp.into_body().into_reader();
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok((status.as_u16(), status.canonical_reason(), body))
    }
}

impl ArtifactBackend for HttpBackend {
    fn fetch_archive(&self, request_id: RequestId) -> Result<ArchiveRef, RemoteError> {
        let url = self.lookup_url(request_id);
        tracing::debug!("GET {url}");
        let (code, status_text, body) = self.do_get(&url)?;
        tracing::debug!("GET {url}: HTTP {code} ({} bytes)", body.len());

        if (200..300).contains(&code) {
            response::parse_archive(code, status_text, &body)
        } else {
            Err(RemoteError::Service {
                status: code,
                message: response::failure_message(&body, status_text),
            })
        }
    }
}
