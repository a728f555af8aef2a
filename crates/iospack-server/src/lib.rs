//! Reference HTTP server for the iospack artifact lookup protocol v1.
//!
//! Serves `GET /artifacts?ids=<id>` the way the client in `iospack-remote`
//! expects, plus registration routes so builds (or tests) can publish an
//! archive reference or a failure payload for a request id. The artifact
//! index is kept in memory and mirrored to `{data_dir}/artifacts.json`.
//!
//! The [`TestServer`] helper starts a server on a random port for integration testing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{debug, error, info};

/// What the service answers for one request id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactEntry {
    Archive { archive: String },
    /// Replayed verbatim: `status` with `body` as the response body.
    Failure { status: u16, body: String },
}

/// In-memory + file-backed artifact index.
pub struct Store {
    data_dir: PathBuf,
    entries: RwLock<BTreeMap<u64, ArtifactEntry>>,
}

impl Store {
    pub fn open(data_dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&data_dir)?;
        let index_path = data_dir.join("artifacts.json");
        let entries = if index_path.exists() {
            let content = fs::read(&index_path)?;
            serde_json::from_slice(&content)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            data_dir,
            entries: RwLock::new(entries),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn get(&self, id: u64) -> Option<ArtifactEntry> {
        let entries = self.entries.read().expect("artifact index lock poisoned");
        entries.get(&id).cloned()
    }

    pub fn put_archive(&self, id: u64, archive: &str) -> io::Result<()> {
        self.put(
            id,
            ArtifactEntry::Archive {
                archive: archive.to_owned(),
            },
        )
    }

    pub fn put_failure(&self, id: u64, status: u16, body: &str) -> io::Result<()> {
        self.put(
            id,
            ArtifactEntry::Failure {
                status,
                body: body.to_owned(),
            },
        )
    }

    fn put(&self, id: u64, entry: ArtifactEntry) -> io::Result<()> {
        let mut entries = self.entries.write().expect("artifact index lock poisoned");
        entries.insert(id, entry);
        let json = serde_json::to_vec_pretty(&*entries)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(self.data_dir.join("artifacts.json"), json)
    }
}

/// Parse a strictly positive request id.
pub fn parse_request_id(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|id| *id > 0)
}

/// Percent-decoded value of `key` in a raw query string, if present.
fn query_param(query: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find_map(|(k, v)| (k == key).then(|| v.into_owned()))
}

/// Registration routes: `/artifacts/{id}` and `/artifacts/{id}/error`.
/// Returns `(id, is_error_route)`.
pub fn parse_registration_route(path: &str) -> Option<(u64, bool)> {
    let rest = path.strip_prefix("/artifacts/")?;
    match rest.split_once('/') {
        Some((id, "error")) => Some((parse_request_id(id)?, true)),
        Some(_) => None,
        None => Some((parse_request_id(rest)?, false)),
    }
}

fn respond_json(req: tiny_http::Request, code: u16, json: &serde_json::Value) {
    let header = Header::from_bytes("Content-Type", "application/json").expect("valid header");
    let _ = req.respond(
        Response::from_string(json.to_string())
            .with_header(header)
            .with_status_code(StatusCode(code)),
    );
}

fn respond_err(req: tiny_http::Request, code: u16, msg: &str) {
    respond_json(req, code, &serde_json::json!({ "error": msg }));
}

fn read_body(req: &mut tiny_http::Request) -> Option<String> {
    let mut body = String::new();
    if req.as_reader().read_to_string(&mut body).is_ok() {
        Some(body)
    } else {
        None
    }
}

fn handle_lookup(store: &Store, req: tiny_http::Request, query: &str) {
    let Some(id) = query_param(query, "ids").as_deref().and_then(parse_request_id) else {
        respond_err(req, 400, "ids must be a positive integer");
        return;
    };

    match store.get(id) {
        Some(ArtifactEntry::Archive { archive }) => {
            info!("GET /artifacts?ids={id}: archive {archive}");
            respond_json(req, 200, &serde_json::json!({ "archive": archive }));
        }
        Some(ArtifactEntry::Failure { status, body }) => {
            info!("GET /artifacts?ids={id}: replaying failure {status}");
            let _ = req.respond(Response::from_string(body).with_status_code(StatusCode(status)));
        }
        None => respond_err(req, 404, &format!("no artifact for request {id}")),
    }
}

#[derive(Deserialize)]
struct ArchiveRegistration {
    archive: String,
}

fn handle_registration(
    store: &Store,
    mut req: tiny_http::Request,
    id: u64,
    is_error: bool,
    query: &str,
) {
    let Some(body) = read_body(&mut req) else {
        respond_err(req, 500, "read error");
        return;
    };

    let result = if is_error {
        let status = query_param(query, "status")
            .and_then(|s| s.parse::<u16>().ok())
            .filter(|s| (400..600).contains(s))
            .unwrap_or(500);
        store.put_failure(id, status, &body)
    } else {
        match serde_json::from_str::<ArchiveRegistration>(&body) {
            Ok(reg) if !reg.archive.trim().is_empty() => store.put_archive(id, &reg.archive),
            _ => {
                respond_err(req, 400, "body must be {\"archive\": \"<ref>\"}");
                return;
            }
        }
    };

    match result {
        Ok(()) => {
            info!("PUT /artifacts/{id}: registered");
            let _ = req.respond(Response::from_string("ok"));
        }
        Err(e) => {
            error!("PUT /artifacts/{id}: {e}");
            respond_err(req, 500, &format!("write error: {e}"));
        }
    }
}

/// Handle a single HTTP request, dispatching to the appropriate route handler.
pub fn handle_request(store: &Store, req: tiny_http::Request) {
    let method = req.method().clone();
    let url = req.url().to_owned();
    debug!("{method} {url}");

    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));

    if path == "/artifacts" {
        if method == Method::Get {
            handle_lookup(store, req, query);
        } else {
            respond_err(req, 405, "method not allowed");
        }
    } else if let Some((id, is_error)) = parse_registration_route(path) {
        if method == Method::Put {
            handle_registration(store, req, id, is_error, query);
        } else {
            respond_err(req, 405, "method not allowed");
        }
    } else if path == "/health" && method == Method::Get {
        respond_json(req, 200, &serde_json::json!({ "status": "ok" }));
    } else {
        respond_err(req, 404, "not found");
    }
}

/// Start the server loop, blocking the current thread.
pub fn run_server(
    store: &Arc<Store>,
    addr: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let server = Server::http(addr)?;
    for request in server.incoming_requests() {
        handle_request(store, request);
    }
    Ok(())
}

/// A test helper that starts an iospack-server on a random port in a background thread.
///
/// The server listens on `127.0.0.1:{port}` and keeps its index in the provided `data_dir`.
pub struct TestServer {
    pub url: String,
    pub port: u16,
    pub store: Arc<Store>,
    server: Arc<Server>,
    _handle: std::thread::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server. Binds to `127.0.0.1:0` (random port).
    pub fn start(data_dir: PathBuf) -> Self {
        let server =
            Arc::new(Server::http("127.0.0.1:0").expect("failed to bind test HTTP server"));
        let port = server.server_addr().to_ip().expect("not an IP addr").port();
        let url = format!("http://127.0.0.1:{port}");

        let store = Arc::new(Store::open(data_dir).expect("failed to open test data dir"));
        let srv = Arc::clone(&server);
        let handler_store = Arc::clone(&store);
        let handle = std::thread::spawn(move || {
            for request in srv.incoming_requests() {
                handle_request(&handler_store, request);
            }
        });

        Self {
            url,
            port,
            store,
            server,
            _handle: handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_request_id_rejects_zero_and_garbage() {
        assert_eq!(parse_request_id("42"), Some(42));
        assert_eq!(parse_request_id("0"), None);
        assert_eq!(parse_request_id("-1"), None);
        assert_eq!(parse_request_id("abc"), None);
        assert_eq!(parse_request_id(""), None);
    }

    #[test]
    fn query_param_finds_key() {
        assert_eq!(query_param("ids=7", "ids").as_deref(), Some("7"));
        assert_eq!(query_param("x=1&ids=9&y", "ids").as_deref(), Some("9"));
        assert_eq!(query_param("x=1", "ids"), None);
        assert_eq!(query_param("", "ids"), None);
    }

    #[test]
    fn query_param_percent_decodes() {
        assert_eq!(query_param("ids=%34%32", "ids").as_deref(), Some("42"));
        assert_eq!(query_param("%69ds=5", "ids").as_deref(), Some("5"));
    }

    #[test]
    fn registration_routes() {
        assert_eq!(parse_registration_route("/artifacts/12"), Some((12, false)));
        assert_eq!(parse_registration_route("/artifacts/12/error"), Some((12, true)));
        assert_eq!(parse_registration_route("/artifacts/12/other"), None);
        assert_eq!(parse_registration_route("/artifacts/0"), None);
        assert_eq!(parse_registration_route("/other/12"), None);
    }

    #[test]
    fn store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().to_path_buf()).unwrap();

        assert!(store.get(1).is_none());
        store.put_archive(1, "https://x/1.zip").unwrap();
        store.put_failure(2, 500, r#"{"error":"build failed"}"#).unwrap();

        assert_eq!(
            store.get(1),
            Some(ArtifactEntry::Archive {
                archive: "https://x/1.zip".to_owned()
            })
        );
        assert!(matches!(
            store.get(2),
            Some(ArtifactEntry::Failure { status: 500, .. })
        ));
    }

    #[test]
    fn store_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = Store::open(dir.path().to_path_buf()).unwrap();
            store.put_archive(3, "kept.zip").unwrap();
        }
        let reopened = Store::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(
            reopened.get(3),
            Some(ArtifactEntry::Archive {
                archive: "kept.zip".to_owned()
            })
        );
    }

    #[test]
    fn store_rejects_corrupt_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("artifacts.json"), "not json").unwrap();
        assert!(Store::open(dir.path().to_path_buf()).is_err());
    }
}
