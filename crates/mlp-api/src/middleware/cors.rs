use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// CORS for the configured frontend origins. Unparseable origins are skipped.
///
/// Bearer tokens travel in `Authorization`, so that header is allowed alongside
/// `Content-Type` and `Accept`.
pub fn create_cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let origins = allowed_origins
        .into_iter()
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .expose_headers([header::HeaderName::from_static("x-request-id")])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_preflight_allows_listed_origin() {
        let app = Router::new()
            .route("/lessons", get(|| async { "ok" }))
            .layer(create_cors_layer(vec![
                "http://localhost:3001".to_string(),
                "not a header\n".to_string(),
            ]));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/lessons")
                    .header(header::ORIGIN, "http://localhost:3001")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
                    .body(Body::empty())
                    .expect("valid request"),
            )
            .await
            .expect("infallible");

        let headers = response.headers();
        assert_eq!(
            headers
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .expect("origin echoed"),
            "http://localhost:3001"
        );
        let allowed = headers
            .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        assert!(allowed.contains("authorization"));
    }

    #[tokio::test]
    async fn test_unlisted_origin_not_echoed() {
        let app = Router::new()
            .route("/lessons", get(|| async { "ok" }))
            .layer(create_cors_layer(vec!["http://localhost:3001".to_string()]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/lessons")
                    .header(header::ORIGIN, "https://evil.example")
                    .body(Body::empty())
                    .expect("valid request"),
            )
            .await
            .expect("infallible");

        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
