//! Router construction.

use std::path::Path;

use axum::Router;
use axum::extract::Request;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{StatusCode, Uri, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Body of every 404 response.
pub(crate) const NOT_FOUND_BODY: &str = "Requested resource not found";

/// Create a router serving the files under `root`.
pub(crate) fn create_router(root: &Path) -> Router {
    let files = ServeDir::new(root)
        .append_index_html_on_directories(true)
        .not_found_service(not_found.into_service());

    Router::new()
        .fallback_service(files)
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
}

/// Log one line per request: `HTTP/<version> <method> <path> <user-agent>`.
async fn log_request(request: Request, next: Next) -> Response {
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_owned();
    tracing::info!(
        "{:?} {} {} {user_agent}",
        request.version(),
        request.method(),
        request.uri().path()
    );
    next.run(request).await
}

async fn not_found(uri: Uri) -> (StatusCode, &'static str) {
    tracing::warn!(path = uri.path(), "Requested resource not found");
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}
