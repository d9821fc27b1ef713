//! Request logging middleware.
//!
//! Authentication and rate limiting are both external-collaborator
//! concerns and out of scope here; `tower_http::trace::TraceLayer` in
//! `router.rs` already covers span-per-request tracing, so this keeps
//! only a structured completion log as a second, coarser line suitable
//! for access-log style aggregation.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %duration.as_millis(),
        "request completed"
    );

    response
}
