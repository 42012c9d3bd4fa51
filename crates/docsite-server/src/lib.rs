//! Local preview server for docsite output.
//!
//! Serves a built site directory with `tower-http`'s `ServeDir`. Missing files
//! get a plain-text 404 and every request is logged.
//!
//! ```no_run
//! use docsite_server::PreviewServer;
//!
//! # async fn run() -> Result<(), docsite_server::ServerError> {
//! let server = PreviewServer::new("build/docsite", "127.0.0.1", 9000)
//!     .start()
//!     .await?;
//! let url = server.url();
//! // ...
//! server.stop().await
//! # }
//! ```

mod app;
mod error;
mod server;

pub use error::ServerError;
pub use server::{DEFAULT_MAX_PORT_ATTEMPTS, PreviewServer, RunningServer};
