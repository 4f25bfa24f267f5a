use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::metrics::RequestSample;
use crate::AppState;

/// Adds three response headers and records the request latency:
///
///   X-Request-Id        : random v4 UUID, also attached to the log line
///   X-Response-Time-Us  : total handler wall time in microseconds
///   Server-Timing       : same value in the standard Server-Timing format
pub async fn timing_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let request_id = uuid::Uuid::new_v4();

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

    // ── Inject response headers ─────────────────────────────────
    let headers = response.headers_mut();
    if let Ok(val) = HeaderValue::from_str(&request_id.to_string()) {
        headers.insert("X-Request-Id", val);
    }
    headers.insert("X-Response-Time-Us", HeaderValue::from(us));
    let server_timing = format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = HeaderValue::from_str(&server_timing) {
        headers.insert("Server-Timing", val);
    }

    let status = response.status().as_u16();

    // Static files and the SSE stream are not API latency
    if !path.starts_with("/api/") || path.ends_with("/stream") {
        debug!(%request_id, %method, %path, status, us, "request");
        return response;
    }

    state.metrics.record_request(RequestSample { status, total_us: us });

    match status {
        500..=599 => warn!(%request_id, %method, %path, status, us, "request failed"),
        _ => info!(%request_id, %method, %path, status, us, "request"),
    }

    response
}
