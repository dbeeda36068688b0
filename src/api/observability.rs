use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::USER_AGENT},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::api::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied request id that is reused as-is.
const MAX_REQUEST_ID_LEN: usize = 64;

/// `GET /api/metrics`
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Ok,
    Rejected,
    Failed,
}

impl Outcome {
    fn of(status: StatusCode) -> Self {
        if status.is_server_error() {
            Self::Failed
        } else if status.is_client_error() {
            Self::Rejected
        } else {
            Self::Ok
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

/// Reuses the caller's `x-request-id` when it is short printable ASCII.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LEN
                && id.bytes().all(|b| b.is_ascii_graphic())
        })
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string)
}

/// Per-route counters. Unmatched paths share one label so scanners can't
/// blow up the series count.
fn record_request(method: &str, route: Option<&str>, outcome: Outcome, elapsed: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.unwrap_or("unmatched").to_string()),
        ("outcome", outcome.as_str().to_string()),
    ];

    metrics::counter!("tsundoku_api_requests_total", &labels).increment(1);
    metrics::histogram!("tsundoku_api_request_seconds", &labels).record(elapsed.as_secs_f64());
}

/// Wraps each API call in a `request` span (filled in with `user_id` by the
/// auth layer), tags the response with its request id and logs one
/// `api_request` event on completion.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let id = request_id(req.headers());
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned());
    let agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_owned();

    let span = info_span!(
        "request",
        request_id = %id,
        method = %method,
        path = %req.uri().path(),
        route = route.as_deref(),
        user_id = tracing::field::Empty,
    );

    async move {
        let mut response = next.run(req).await;
        let elapsed = started.elapsed();
        let status = response.status();
        let outcome = Outcome::of(status);

        record_request(method.as_str(), route.as_deref(), outcome, elapsed);

        if let Ok(value) = HeaderValue::from_str(&id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        info!(
            event = "api_request",
            status = status.as_u16(),
            outcome = outcome.as_str(),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            user_agent = %agent,
            "{} {}",
            method,
            status
        );

        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http, middleware, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route("/teapot", get(|| async { StatusCode::IM_A_TEAPOT }))
            .layer(middleware::from_fn(logging_middleware))
    }

    #[test]
    fn test_outcome_by_status_class() {
        assert_eq!(Outcome::of(StatusCode::OK), Outcome::Ok);
        assert_eq!(Outcome::of(StatusCode::NOT_MODIFIED), Outcome::Ok);
        assert_eq!(Outcome::of(StatusCode::NOT_FOUND), Outcome::Rejected);
        assert_eq!(Outcome::of(StatusCode::BAD_GATEWAY), Outcome::Failed);
    }

    #[test]
    fn test_request_id_reuse_rules() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("has space"));
        assert_ne!(request_id(&headers), "has space");

        let long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&long).unwrap());
        let generated = request_id(&headers);
        assert!(Uuid::parse_str(&generated).is_ok());
    }

    #[tokio::test]
    async fn test_response_carries_request_id() {
        let response = app()
            .oneshot(
                http::Request::builder()
                    .uri("/ok")
                    .header(REQUEST_ID_HEADER, "trace-me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "trace-me");

        let response = app()
            .oneshot(
                http::Request::builder()
                    .uri("/teapot")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }
}
