//! Prometheus metrics for monitoring API performance and gamification activity.

use std::{sync::LazyLock, time::Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

static UUID_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap_or_else(|e| unreachable!("static regex: {e}"))
});
static NUMBER_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/\d+(/|$)").unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

/// Initialize Prometheus metrics exporter
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let builder = PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("http_request_duration_seconds".to_string()),
        &[
            0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ],
    )?;

    // TTS calls are slow; give them their own buckets
    let builder = builder.set_buckets_for_metric(
        Matcher::Full("tts_request_duration_seconds".to_string()),
        &[0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
    )?;

    Ok(builder.install_recorder()?)
}

/// Middleware to record HTTP request metrics
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    gauge!("http_requests_in_flight", "method" => method.clone(), "path" => path.clone())
        .increment(1.0);

    let response = next.run(req).await;

    gauge!("http_requests_in_flight", "method" => method.clone(), "path" => path.clone())
        .decrement(1.0);

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path,
        "status" => status
    )
    .record(duration);

    response
}

/// Replace ids in a path with `:id` to keep label cardinality bounded.
fn normalize_path(path: &str) -> String {
    let normalized = UUID_SEGMENT.replace_all(path, ":id");
    NUMBER_SEGMENT
        .replace_all(&normalized, "/:id$1")
        .into_owned()
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (StatusCode::OK, handle.render())
}

/// Record authentication events
pub fn record_auth_event(event_type: &str, success: bool) {
    let status = if success { "success" } else { "failure" };

    counter!(
        "auth_events_total",
        "type" => event_type.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record XP granted to a user, labelled by what earned it
pub fn record_xp_awarded(source: &'static str, xp: i64) {
    if xp <= 0 {
        return;
    }
    counter!("xp_awarded_total", "source" => source).increment(xp.unsigned_abs());
}

/// Record one call to the speech provider
pub fn record_tts_call(model: &str, success: bool, duration_secs: f64, characters: usize) {
    let status = if success { "success" } else { "failure" };

    counter!(
        "tts_requests_total",
        "model" => model.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!("tts_request_duration_seconds", "model" => model.to_string()).record(duration_secs);

    if success {
        counter!("tts_characters_total", "model" => model.to_string())
            .increment(characters as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path("/v1/lessons/550e8400-e29b-41d4-a716-446655440000"),
            "/v1/lessons/:id"
        );
        assert_eq!(normalize_path("/v1/items/123"), "/v1/items/:id");
        assert_eq!(
            normalize_path("/v1/lessons/550e8400-e29b-41d4-a716-446655440000/comments"),
            "/v1/lessons/:id/comments"
        );
        assert_eq!(
            normalize_path("/v1/progress/shares/550E8400-E29B-41D4-A716-446655440000/comments/7"),
            "/v1/progress/shares/:id/comments/:id"
        );
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn test_normalize_path_keeps_words_with_digits() {
        assert_eq!(normalize_path("/v1/tts/voices"), "/v1/tts/voices");
        assert_eq!(normalize_path("/v1/lessons_10"), "/v1/lessons_10");
    }
}
