//! Remote diagram fetching.
//!
//! [`DiagramFetcher`] POSTs diagram source to Kroki and streams the response
//! into the diagram's file under the cache directory.
//!
//! In [`FetchMode::Detached`] the destination file is created before
//! [`fetch`](DiagramFetcher::fetch) returns, while the request itself runs as a
//! blocking task on the given runtime. The caller never sees the outcome; it is
//! logged, and [`wait_all`](DiagramFetcher::wait_all) lets a caller join every
//! outstanding task. In [`FetchMode::Inline`] the request completes before
//! `fetch` returns and failures are reported to the caller.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use ureq::Agent;

use crate::cache::DiagramCache;
use crate::language::{DiagramFormat, DiagramKind};

/// Diagram fetch failure.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Fetch Diagram Failed: {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Fetch Diagram Failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("Failed to write diagram {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// How fetches relate to the caller.
#[derive(Debug, Clone)]
pub enum FetchMode {
    /// Spawn a blocking task on the runtime and return immediately.
    Detached(Handle),
    /// Fetch on the calling thread.
    Inline,
}

/// Outcome counts of the fetches issued by one fetcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub completed: usize,
    pub failed: usize,
}

impl FetchSummary {
    fn record(&mut self, ok: bool) {
        if ok {
            self.completed += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// One diagram to render.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub kind: DiagramKind,
    pub format: DiagramFormat,
    /// Literal diagram source.
    pub source: &'a str,
    /// Destination file name inside the cache directory.
    pub file_name: &'a str,
}

/// Fetches diagrams from Kroki into a [`DiagramCache`].
pub struct DiagramFetcher {
    agent: Agent,
    service_url: String,
    cache: DiagramCache,
    mode: FetchMode,
    tasks: Mutex<Vec<FetchTask>>,
    settled: Mutex<FetchSummary>,
}

impl DiagramFetcher {
    /// Create a fetcher posting to `service_url` (scheme included, no trailing `/`).
    #[must_use]
    pub fn new(service_url: impl Into<String>, cache: DiagramCache, mode: FetchMode) -> Self {
        Self {
            agent: create_agent(None),
            service_url: service_url.into(),
            cache,
            mode,
            tasks: Mutex::new(Vec::new()),
            settled: Mutex::new(FetchSummary::default()),
        }
    }

    /// Limit each request to `timeout`. No limit by default.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.agent = create_agent(timeout);
        self
    }

    /// Cache this fetcher writes into.
    #[must_use]
    pub fn cache(&self) -> &DiagramCache {
        &self.cache
    }

    /// Request a diagram.
    ///
    /// A file name already requested by this fetcher is not fetched again.
    /// Errors creating the destination are always returned; request errors are
    /// returned only in [`FetchMode::Inline`].
    pub fn fetch(&self, request: &FetchRequest<'_>) -> Result<(), FetchError> {
        if !self.cache.claim(request.file_name) {
            tracing::debug!(file = request.file_name, "Diagram already requested");
            return Ok(());
        }

        let path = self.cache.path_for(request.file_name);
        let file = match self.create_destination(&path) {
            Ok(file) => file,
            Err(e) => {
                self.cache.release(request.file_name);
                return Err(e);
            }
        };

        let url = format!("{}/{}", self.service_url, request.kind.name());
        let accept = request.format.accept();

        match &self.mode {
            FetchMode::Detached(handle) => {
                let agent = self.agent.clone();
                let source = request.source.to_owned();
                let task = handle.spawn_blocking(move || {
                    let result = download(&agent, &url, accept, &source, file, &path);
                    log_outcome(&result, &path);
                    result
                });
                self.tasks
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(task);
                Ok(())
            }
            FetchMode::Inline => {
                let result = download(&self.agent, &url, accept, request.source, file, &path);
                log_outcome(&result, &path);
                self.settled
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .record(result.is_ok());
                if result.is_err() {
                    if let Err(e) = std::fs::remove_file(&path) {
                        tracing::debug!(path = %path.display(), error = %e, "Failed to remove diagram file");
                    }
                    self.cache.release(request.file_name);
                }
                result.map(|_| ())
            }
        }
    }

    /// Number of detached fetches not yet joined.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Wait for every outstanding fetch and return the counts so far.
    ///
    /// Cancel-safe: a fetch that was not joined when the future is dropped
    /// stays pending.
    pub async fn wait_all(&self) -> FetchSummary {
        loop {
            let next = self
                .tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop();
            let Some(task) = next else {
                break;
            };
            let mut pending = PendingTask {
                tasks: &self.tasks,
                task: Some(task),
            };
            let Some(task) = pending.task.as_mut() else {
                continue;
            };
            let outcome = task.await;
            pending.task = None;

            let ok = match outcome {
                Ok(result) => result.is_ok(),
                Err(e) => {
                    tracing::error!(error = %e, "Diagram fetch task failed");
                    false
                }
            };
            self.settled
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record(ok);
        }
        *self.settled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create_destination(&self, path: &std::path::Path) -> Result<File, FetchError> {
        let io_error = |source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        };
        std::fs::create_dir_all(self.cache.dir()).map_err(io_error)?;
        File::create(path).map_err(io_error)
    }
}

type FetchTask = JoinHandle<Result<u64, FetchError>>;

/// A task taken out of the pending list while it is awaited. Returned to the
/// list if dropped before completion.
struct PendingTask<'a> {
    tasks: &'a Mutex<Vec<FetchTask>>,
    task: Option<FetchTask>,
}

impl Drop for PendingTask<'_> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            self.tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(task);
        }
    }
}

/// Create HTTP agent, optionally bounded by `timeout`.
fn create_agent(timeout: Option<Duration>) -> Agent {
    Agent::config_builder()
        .timeout_global(timeout)
        .http_status_as_error(false)
        .build()
        .into()
}

/// POST `source` and stream a successful response into `file`.
fn download(
    agent: &Agent,
    url: &str,
    accept: &str,
    source: &str,
    mut file: File,
    path: &std::path::Path,
) -> Result<u64, FetchError> {
    let response = agent
        .post(url)
        .header("Accept", accept)
        .header("Content-Type", "text/plain")
        .send(source.as_bytes())?;

    let status = response.status().as_u16();
    let mut body = response.into_body().into_reader();

    if status != 200 && status != 201 {
        // Drain so the connection can be reused.
        let _ = io::copy(&mut body, &mut io::sink());
        return Err(FetchError::Status {
            status,
            url: url.to_owned(),
        });
    }

    io::copy(&mut body, &mut file).map_err(|source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn log_outcome(result: &Result<u64, FetchError>, path: &std::path::Path) {
    match result {
        Ok(bytes) => tracing::debug!(path = %path.display(), bytes, "Diagram fetched"),
        Err(e) => {
            tracing::error!(path = %path.display(), "{e}");
            let mut source = std::error::Error::source(e);
            while let Some(cause) = source {
                tracing::error!("  caused by: {cause}");
                source = cause.source();
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use tokio::runtime::Runtime;

    use axum::Router;
    use axum::extract::Path as UrlPath;
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::routing::post;

    /// Kroki stand-in: `plantuml` fails with 500, `graphviz` answers 201,
    /// everything else echoes `<accept>|<content-type>|<body>` with 200.
    async fn render(
        UrlPath(kind): UrlPath<String>,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, String) {
        let header_value = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_owned()
        };
        match kind.as_str() {
            "plantuml" => (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_owned()),
            "graphviz" => (StatusCode::CREATED, format!("<svg>{body}</svg>")),
            _ => (
                StatusCode::OK,
                format!(
                    "{}|{}|{body}",
                    header_value(header::ACCEPT),
                    header_value(header::CONTENT_TYPE)
                ),
            ),
        }
    }

    /// Start the stub service on `rt` and return its base URL.
    pub(crate) fn stub_service(rt: &Runtime) -> String {
        let listener = rt
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/{kind}", post(render));
        rt.spawn(async move { axum::serve(listener, app).await });
        format!("http://{addr}")
    }

    /// Nothing listens on port 1.
    pub(crate) const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

    fn request<'a>(kind: DiagramKind, source: &'a str, file_name: &'a str) -> FetchRequest<'a> {
        FetchRequest {
            kind,
            format: DiagramFormat::Svg,
            source,
            file_name,
        }
    }

    #[test]
    fn test_detached_fetch_streams_body_to_file() {
        let rt = Runtime::new().unwrap();
        let url = stub_service(&rt);
        let out = TempDir::new().unwrap();
        let fetcher = DiagramFetcher::new(
            url,
            DiagramCache::new(out.path()),
            FetchMode::Detached(rt.handle().clone()),
        );

        fetcher
            .fetch(&request(DiagramKind::Mermaid, "graph TD; A-->B", "diag-a.svg"))
            .unwrap();
        assert!(out.path().join("diagrams/diag-a.svg").is_file());

        let summary = rt.block_on(fetcher.wait_all());
        assert_eq!(summary, FetchSummary { completed: 1, failed: 0 });
        assert_eq!(fetcher.pending(), 0);
        let content = std::fs::read_to_string(out.path().join("diagrams/diag-a.svg")).unwrap();
        assert_eq!(content, "image/svg+xml|text/plain|graph TD; A-->B");
    }

    #[test]
    fn test_created_status_is_success() {
        let rt = Runtime::new().unwrap();
        let url = stub_service(&rt);
        let out = TempDir::new().unwrap();
        let fetcher = DiagramFetcher::new(url, DiagramCache::new(out.path()), FetchMode::Inline);

        fetcher
            .fetch(&request(DiagramKind::GraphViz, "digraph {}", "diag-g.svg"))
            .unwrap();
        let content = std::fs::read_to_string(out.path().join("diagrams/diag-g.svg")).unwrap();
        assert_eq!(content, "<svg>digraph {}</svg>");
    }

    #[test]
    fn test_accept_header_follows_format() {
        let rt = Runtime::new().unwrap();
        let url = stub_service(&rt);
        let out = TempDir::new().unwrap();
        let fetcher = DiagramFetcher::new(url, DiagramCache::new(out.path()), FetchMode::Inline);

        fetcher
            .fetch(&FetchRequest {
                kind: DiagramKind::Mermaid,
                format: DiagramFormat::Png,
                source: "x",
                file_name: "diag-p.png",
            })
            .unwrap();
        let content = std::fs::read_to_string(out.path().join("diagrams/diag-p.png")).unwrap();
        assert!(content.starts_with("image/png|"));
    }

    #[test]
    fn test_detached_server_error_is_logged_not_returned() {
        let rt = Runtime::new().unwrap();
        let url = stub_service(&rt);
        let out = TempDir::new().unwrap();
        let fetcher = DiagramFetcher::new(
            url,
            DiagramCache::new(out.path()),
            FetchMode::Detached(rt.handle().clone()),
        );

        fetcher
            .fetch(&request(DiagramKind::PlantUml, "@startuml\n@enduml", "diag-p.svg"))
            .unwrap();
        let summary = rt.block_on(fetcher.wait_all());
        assert_eq!(summary, FetchSummary { completed: 0, failed: 1 });

        // No rollback: the file stays, empty.
        let path = out.path().join("diagrams/diag-p.svg");
        assert_eq!(std::fs::metadata(path).unwrap().len(), 0);
    }

    #[test]
    fn test_inline_server_error_is_returned_and_file_removed() {
        let rt = Runtime::new().unwrap();
        let url = stub_service(&rt);
        let out = TempDir::new().unwrap();
        let fetcher = DiagramFetcher::new(url, DiagramCache::new(out.path()), FetchMode::Inline);

        let err = fetcher
            .fetch(&request(DiagramKind::PlantUml, "@startuml\n@enduml", "diag-p.svg"))
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
        assert!(!out.path().join("diagrams/diag-p.svg").exists());

        let summary = rt.block_on(fetcher.wait_all());
        assert_eq!(summary, FetchSummary { completed: 0, failed: 1 });
    }

    #[test]
    fn test_detached_connection_error_counts_as_failed() {
        let rt = Runtime::new().unwrap();
        let out = TempDir::new().unwrap();
        let fetcher = DiagramFetcher::new(
            UNREACHABLE_URL,
            DiagramCache::new(out.path()),
            FetchMode::Detached(rt.handle().clone()),
        );

        fetcher
            .fetch(&request(DiagramKind::Mermaid, "graph TD", "diag-u.svg"))
            .unwrap();
        assert!(out.path().join("diagrams/diag-u.svg").is_file());
        let summary = rt.block_on(fetcher.wait_all());
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_inline_connection_error() {
        let out = TempDir::new().unwrap();
        let fetcher = DiagramFetcher::new(
            UNREACHABLE_URL,
            DiagramCache::new(out.path()),
            FetchMode::Inline,
        )
        .with_timeout(Some(Duration::from_secs(5)));

        let err = fetcher
            .fetch(&request(DiagramKind::Mermaid, "graph TD", "diag-u.svg"))
            .unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
    }

    #[test]
    fn test_cancelled_wait_keeps_fetch_pending() {
        let rt = Runtime::new().unwrap();
        let out = TempDir::new().unwrap();
        // Accepts connections through the backlog but never answers.
        let silent = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let fetcher = DiagramFetcher::new(
            format!("http://{}", silent.local_addr().unwrap()),
            DiagramCache::new(out.path()),
            FetchMode::Detached(rt.handle().clone()),
        )
        .with_timeout(Some(Duration::from_secs(1)));

        fetcher
            .fetch(&request(DiagramKind::Mermaid, "graph TD", "diag-s.svg"))
            .unwrap();
        let joined = rt.block_on(async {
            tokio::time::timeout(Duration::from_millis(100), fetcher.wait_all()).await
        });
        assert!(joined.is_err());
        assert_eq!(fetcher.pending(), 1);

        let summary = rt.block_on(fetcher.wait_all());
        assert_eq!(summary, FetchSummary { completed: 0, failed: 1 });
        assert_eq!(fetcher.pending(), 0);
    }

    #[test]
    fn test_same_file_requested_once() {
        let rt = Runtime::new().unwrap();
        let url = stub_service(&rt);
        let out = TempDir::new().unwrap();
        let fetcher = DiagramFetcher::new(
            url,
            DiagramCache::new(out.path()),
            FetchMode::Detached(rt.handle().clone()),
        );

        fetcher
            .fetch(&request(DiagramKind::Mermaid, "first", "diag-d.svg"))
            .unwrap();
        fetcher
            .fetch(&request(DiagramKind::Mermaid, "second", "diag-d.svg"))
            .unwrap();
        assert_eq!(fetcher.pending(), 1);

        let summary = rt.block_on(fetcher.wait_all());
        assert_eq!(summary.completed, 1);
        let content = std::fs::read_to_string(out.path().join("diagrams/diag-d.svg")).unwrap();
        assert!(content.ends_with("|first"));
    }

    #[test]
    fn test_unwritable_cache_dir_is_an_error() {
        let out = TempDir::new().unwrap();
        // A file where the diagrams directory should be.
        std::fs::write(out.path().join("diagrams"), "").unwrap();
        let fetcher = DiagramFetcher::new(
            UNREACHABLE_URL,
            DiagramCache::new(out.path()),
            FetchMode::Inline,
        );

        let err = fetcher
            .fetch(&request(DiagramKind::Mermaid, "graph TD", "diag-x.svg"))
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
        assert!(fetcher.cache().claim("diag-x.svg"));
    }
}
