pub mod series;
pub mod status;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::StoreError;

// ─── Shared response envelope ────────────────────────────────────

/// Every API response carries timing metadata so the dashboard can show
/// where a request spent its time without parsing headers.
#[derive(Debug, Clone, Serialize)]
pub struct TimedResponse<T: Serialize> {
    pub data: T,
    pub timing: RequestTiming,
}

/// Microsecond breakdown of one request.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RequestTiming {
    /// Total handler wall time (μs)
    pub total_us: u64,
    /// Time spent waiting on the store (μs)
    pub store_us: u64,
    /// Handler time outside the store: window resolution, downsampling,
    /// rate derivation and conversion (μs). Response serialization happens
    /// after this is taken and is not included.
    pub transform_us: u64,
}

impl RequestTiming {
    pub fn new(total_us: u64, store_us: u64) -> Self {
        Self {
            total_us,
            store_us,
            transform_us: total_us.saturating_sub(store_us),
        }
    }
}

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Store(StoreError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Store(StoreError::InvalidRow { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = serde_json::json!({
            "error":  self.to_string(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_time_is_the_remainder_after_the_store() {
        let t = RequestTiming::new(1_500, 1_200);
        assert_eq!(t.transform_us, 300);

        // Clocks read separately can disagree by a tick.
        assert_eq!(RequestTiming::new(100, 120).transform_us, 0);
    }

    #[test]
    fn store_errors_map_to_distinct_statuses() {
        let status = |e: StoreError| AppError::from(e).into_response().status();

        assert_eq!(
            status(StoreError::Timeout(std::time::Duration::from_secs(1))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status(StoreError::Unavailable(sqlx::Error::PoolClosed)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(StoreError::InvalidRow {
                row: 3,
                field: "timestamp",
                reason: "bad".into(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
