//! A static file server for remote schema documents.
//!
//! Serves files below a root directory over plain HTTP on an ephemeral
//! local port, so remote `$ref`s can be exercised end to end.
//!
//! ```no_run
//! use euclid_test::SchemaServer;
//!
//! # async fn run() -> Result<(), euclid_test::TestError> {
//! let mut server = SchemaServer::new("tests/fixtures/remote");
//! let base = server.start().await?;
//! // base is e.g. http://127.0.0.1:49152/
//! server.stop().await;
//! # Ok(())
//! # }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use euclid_schema::Url;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::TestError;

/// Serves schema files from a directory.
#[derive(Debug)]
pub struct SchemaServer {
    root: PathBuf,
    served: Arc<AtomicUsize>,
    running: Option<Running>,
}

#[derive(Debug)]
struct Running {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchemaServer {
    /// Creates a stopped server for files below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            served: Arc::new(AtomicUsize::new(0)),
            running: None,
        }
    }

    /// Binds `127.0.0.1` on a free port and starts serving. Returns the
    /// base URL. Starting a running server returns its current URL.
    pub async fn start(&mut self) -> Result<Url, TestError> {
        if self.running.is_some() {
            return self.base_url();
        }

        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(TestError::Bind)?;
        let addr = listener.local_addr().map_err(TestError::Bind)?;
        let (shutdown, signal) = watch::channel(false);
        let root = Arc::new(self.root.clone());
        let served = Arc::clone(&self.served);

        let task = tokio::spawn(accept_loop(listener, root, served, signal));
        info!(%addr, root = %self.root.display(), "schema server started");
        self.running = Some(Running {
            addr,
            shutdown,
            task,
        });
        self.base_url()
    }

    /// Stops serving and closes open connections. Stopping a stopped
    /// server does nothing.
    pub async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(true);
            let _ = running.task.await;
            info!(addr = %running.addr, "schema server stopped");
        }
    }

    /// Returns true while the server is accepting connections.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Returns the bound address.
    pub fn addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.addr)
    }

    /// Returns `http://127.0.0.1:<port>/`.
    pub fn base_url(&self) -> Result<Url, TestError> {
        let addr = self.addr().ok_or(TestError::NotRunning)?;
        Url::parse(&format!("http://{addr}/")).map_err(|e| TestError::RequestBuild(e.to_string()))
    }

    /// Returns the URL of a file below the root.
    pub fn url(&self, path: &str) -> Result<Url, TestError> {
        self.base_url()?
            .join(path.trim_start_matches('/'))
            .map_err(|e| TestError::RequestBuild(e.to_string()))
    }

    /// Returns how many files were served successfully.
    pub fn files_served(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }
}

impl Drop for SchemaServer {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(true);
            running.task.abort();
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    root: Arc<PathBuf>,
    served: Arc<AtomicUsize>,
    mut signal: watch::Receiver<bool>,
) {
    let mut failures = 0u32;
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, remote) = match accepted {
                    Ok(accepted) => {
                        failures = 0;
                        accepted
                    }
                    Err(e) => {
                        failures = failures.saturating_add(1);
                        let pause = accept_backoff(failures);
                        warn!(error = %e, ?pause, "schema server accept failed");
                        tokio::time::sleep(pause).await;
                        continue;
                    }
                };
                let root = Arc::clone(&root);
                let served = Arc::clone(&served);
                let mut connection_signal = signal.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |request: http::Request<Incoming>| {
                        let root = Arc::clone(&root);
                        let served = Arc::clone(&served);
                        async move {
                            let response = serve(&root, request.method(), request.uri().path()).await;
                            if response.status() == StatusCode::OK {
                                served.fetch_add(1, Ordering::SeqCst);
                            }
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                    tokio::select! {
                        result = connection => {
                            if let Err(e) = result {
                                debug!(%remote, error = %e, "schema server connection error");
                            }
                        }
                        _ = connection_signal.changed() => {}
                    }
                });
            }
            _ = signal.changed() => break,
        }
    }
}

/// Answers one request with the file at `request_path` below `root`.
async fn serve(root: &Path, method: &Method, request_path: &str) -> Response<Full<Bytes>> {
    if method != Method::GET && method != Method::HEAD {
        return plain(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
    }
    let relative = request_path.trim_start_matches('/');
    let relative = match checked_path(relative) {
        Some(path) => path,
        None => return plain(StatusCode::FORBIDDEN, "forbidden path"),
    };

    let path = root.join(relative);
    match tokio::fs::read(&path).await {
        Ok(contents) => {
            debug!(path = %path.display(), bytes = contents.len(), "served schema file");
            let body = if method == Method::HEAD {
                Bytes::new()
            } else {
                Bytes::from(contents)
            };
            let mut response = Response::new(Full::new(body));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type(&path)));
            response
        }
        Err(_) => plain(StatusCode::NOT_FOUND, "not found"),
    }
}

/// Rejects traversal and hidden entries, returning the checked path.
fn checked_path(relative: &str) -> Option<&Path> {
    let path = Path::new(relative);
    for component in path.components() {
        match component {
            Component::Normal(name) if !name.to_string_lossy().starts_with('.') => {}
            _ => return None,
        }
    }
    Some(path)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => "application/json",
        Some("yaml" | "yml") => "application/yaml",
        _ => "text/plain; charset=utf-8",
    }
}

fn plain(status: StatusCode, message: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(message.as_bytes())));
    *response.status_mut() = status;
    response
}

/// Pause after the `failures`-th consecutive accept error, doubling from
/// 10ms up to one second.
fn accept_backoff(failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(7);
    Duration::from_millis(10 << exponent).min(Duration::from_secs(1))
}
