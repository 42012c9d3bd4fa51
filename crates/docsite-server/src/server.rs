//! Preview server lifecycle.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use docsite_config::ServerConfig;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::app;
use crate::error::ServerError;

/// Default number of ports tried, starting at the configured one.
pub const DEFAULT_MAX_PORT_ATTEMPTS: u16 = 10;

/// Serves a build output directory over HTTP.
#[derive(Debug, Clone)]
pub struct PreviewServer {
    root: PathBuf,
    host: String,
    port: u16,
    max_port_attempts: u16,
}

impl PreviewServer {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, host: impl Into<String>, port: u16) -> Self {
        Self {
            root: root.into(),
            host: host.into(),
            port,
            max_port_attempts: DEFAULT_MAX_PORT_ATTEMPTS,
        }
    }

    #[must_use]
    pub fn from_config(config: &ServerConfig, root: impl Into<PathBuf>) -> Self {
        Self::new(root, config.host.clone(), config.port)
            .with_max_port_attempts(config.max_port_attempts)
    }

    /// Number of consecutive ports to try. At least one is always tried.
    #[must_use]
    pub fn with_max_port_attempts(mut self, attempts: u16) -> Self {
        self.max_port_attempts = attempts.max(1);
        self
    }

    /// Bind the first free port and start serving in the background.
    ///
    /// Ports are tried upward from the configured one while they are in use.
    pub async fn start(self) -> Result<RunningServer, ServerError> {
        let listener = self.bind().await?;
        let addr = listener.local_addr()?;
        let router = app::create_router(&self.root);
        let (shutdown, signal) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    // A dropped sender stops the server too.
                    let _ = signal.await;
                })
                .await
        });

        tracing::info!(address = %addr, root = %self.root.display(), "Preview server started");
        Ok(RunningServer {
            addr,
            shutdown: Some(shutdown),
            task,
        })
    }

    async fn bind(&self) -> Result<TcpListener, ServerError> {
        let mut last = self.port;
        for offset in 0..self.max_port_attempts {
            let Some(port) = self.port.checked_add(offset) else {
                break;
            };
            last = port;
            match TcpListener::bind((self.host.as_str(), port)).await {
                Ok(listener) => return Ok(listener),
                Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                    tracing::warn!(port, "Port in use, trying next");
                }
                Err(source) => {
                    return Err(ServerError::Bind {
                        host: self.host.clone(),
                        port,
                        source,
                    });
                }
            }
        }
        Err(ServerError::PortsExhausted {
            host: self.host.clone(),
            first: self.port,
            last,
        })
    }
}

/// Handle to a started preview server.
pub struct RunningServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<io::Result<()>>,
}

impl RunningServer {
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL of the served site.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn stop(mut self) -> Result<(), ServerError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        (&mut self.task).await??;
        tracing::info!(address = %self.addr, "Preview server stopped");
        Ok(())
    }
}
