//! Request timing.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::{Duration, Instant};

/// Requests slower than this are logged at `warn`.
pub const SLOW_REQUEST: Duration = Duration::from_millis(100);

/// Logs method, path, status and duration of every request.
///
/// Requests over [`SLOW_REQUEST`] are reported as warnings, the rest at
/// debug level. Install with `axum::middleware::from_fn(timing_layer)`.
pub async fn timing_layer(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    let elapsed_ms = elapsed.as_millis() as u64;

    if elapsed > SLOW_REQUEST {
        tracing::warn!(%method, %path, status, elapsed_ms, "Slow request");
    } else {
        tracing::debug!(%method, %path, status, elapsed_ms, "Request completed");
    }

    response
}
