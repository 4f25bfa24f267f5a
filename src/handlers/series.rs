use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{Interval, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tracing::warn;

use super::{AppError, RequestTiming, TimedResponse};
use crate::metrics::QuerySample;
use crate::series::SeriesReport;
use crate::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesParams {
    /// Window token such as `2h`, `7d`, `1w`
    pub time_range: Option<String>,
}

/// Run `GetSeries` and record the store round-trip.
async fn query(state: &AppState, token: Option<&str>) -> Result<SeriesReport, AppError> {
    let result = state.query.get_series(token).await;

    match &result {
        Ok(report) => state.metrics.record_query(QuerySample {
            store_us: micros(report.store_elapsed),
            rows: report.rows_loaded,
            success: true,
        }),
        Err(e) => {
            warn!(error = %e, "series query failed");
            state.metrics.record_query(QuerySample {
                store_us: 0,
                rows: 0,
                success: false,
            });
        }
    }

    result.map_err(AppError::from)
}

// ─── GET /api/series?time_range=2h ───────────────────────────────

pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeriesParams>,
) -> Result<Json<TimedResponse<SeriesReport>>, AppError> {
    let t0 = Instant::now();

    let report = query(&state, params.time_range.as_deref()).await?;
    let timing = RequestTiming::new(micros(t0.elapsed()), micros(report.store_elapsed));

    Ok(Json(TimedResponse {
        data: report,
        timing,
    }))
}

// ─── GET /api/series/stream?time_range=2h ────────────────────────
/// Server-Sent Events: a fresh series every `stream_interval`.
/// Failed queries become an `error` event; the stream stays open.

pub async fn series_stream(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeriesParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = IntervalStream::new(ticker(state.stream_interval)).then(move |_| {
        let state = state.clone();
        let token = params.time_range.clone();
        async move {
            let event = match query(&state, token.as_deref()).await {
                Ok(report) => Event::default()
                    .event("series")
                    .data(serde_json::to_string(&report).unwrap_or_default()),
                Err(e) => Event::default().event("error").data(e.to_string()),
            };
            Ok(event)
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Push clock for the stream. A query that overruns the period delays the
/// next push instead of triggering a burst of catch-up queries.
fn ticker(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ticker_delays_after_an_overrun() {
        let mut ticks = ticker(Duration::from_millis(10));
        assert_eq!(ticks.missed_tick_behavior(), MissedTickBehavior::Delay);

        ticks.tick().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        // One late tick fires at once, the next waits a full period.
        ticks.tick().await;
        let t0 = Instant::now();
        ticks.tick().await;
        assert!(t0.elapsed() >= Duration::from_millis(9));
    }
}
