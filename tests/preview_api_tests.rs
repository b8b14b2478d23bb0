//! End-to-end tests for the link preview endpoint
//!
//! Each test drives the full router in-process and points it at a wiremock
//! server standing in for the linked site.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use linkcard_web::config::FetchConfig;
use linkcard_web::handlers::PREVIEW_PATH;
use linkcard_web::preview::LinkPreviewer;
use linkcard_web::server::router;
use linkcard_web::state::AppState;

fn test_state(timeout_ms: u64) -> Arc<AppState> {
    let previewer = LinkPreviewer::new(FetchConfig::default().with_timeout_ms(timeout_ms))
        .expect("previewer should build");
    Arc::new(AppState::new(previewer))
}

fn test_app() -> Router {
    router(test_state(2000), &[])
}

async fn post_raw(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(PREVIEW_PATH)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn post_json(app: Router, body: Value) -> (StatusCode, Value) {
    post_raw(app, body.to_string()).await
}

async fn mount_html(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(html),
        )
        .mount(server)
        .await;
}

fn assert_all_strings(body: &Value) {
    let obj = body.as_object().expect("preview should be an object");
    assert_eq!(obj.len(), 4);
    for key in ["title", "description", "image", "domain"] {
        assert!(obj[key].is_string(), "{key} should be a string in {body}");
    }
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_missing_url_is_rejected() {
    let (status, body) = post_json(test_app(), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "URL is required"}));
}

#[tokio::test]
async fn test_empty_url_is_rejected() {
    let (status, body) = post_json(test_app(), json!({"url": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "URL is required"}));
}

#[tokio::test]
async fn test_non_json_body_is_rejected() {
    let (status, body) = post_raw(test_app(), "url=https://example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "URL is required"}));
}

#[tokio::test]
async fn test_unparseable_url_is_rejected() {
    let (status, body) = post_json(test_app(), json!({"url": "not a url"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid URL"}));
}

#[tokio::test]
async fn test_validation_happens_before_any_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, _) = post_json(test_app(), json!({"url": "http//missing-colon"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Degraded path
// ============================================================================

#[tokio::test]
async fn test_not_found_yields_hostname_only_preview() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<title>Not Found</title>"))
        .mount(&server)
        .await;

    let (status, body) = post_json(
        test_app(),
        json!({"url": format!("{}/missing", server.uri())}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "title": "127.0.0.1",
            "description": "",
            "image": "",
            "domain": "127.0.0.1"
        })
    );
}

#[tokio::test]
async fn test_server_error_is_also_degraded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (status, body) = post_json(test_app(), json!({"url": server.uri()})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "127.0.0.1");
    assert_all_strings(&body);
}

// ============================================================================
// Extraction
// ============================================================================

#[tokio::test]
async fn test_open_graph_tags_win() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/post",
        r#"<html><head>
            <title>Document Title</title>
            <meta property="og:title" content="Example">
            <meta property="og:site_name" content="Example Site">
            <meta property="og:description" content="All about examples">
            <meta property="og:image" content="https://cdn.example.com/card.png">
            <meta name="description" content="Plain description">
        </head><body></body></html>"#,
    )
    .await;

    let (status, body) =
        post_json(test_app(), json!({"url": format!("{}/post", server.uri())})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "title": "Example",
            "description": "All about examples",
            "image": "https://cdn.example.com/card.png",
            "domain": "Example Site"
        })
    );
}

#[tokio::test]
async fn test_plain_title_fallback() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/plain",
        r#"<html><head><title>Plain Title</title>
            <meta name="description" content="Just a page"></head></html>"#,
    )
    .await;

    let (status, body) =
        post_json(test_app(), json!({"url": format!("{}/plain", server.uri())})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Plain Title");
    assert_eq!(body["description"], "Just a page");
    assert_eq!(body["image"], "");
    assert_eq!(body["domain"], "127.0.0.1");
}

#[tokio::test]
async fn test_no_title_source_falls_back_to_domain() {
    let server = MockServer::start().await;
    mount_html(&server, "/bare", "<html><body><p>hello</p></body></html>").await;

    let (status, body) =
        post_json(test_app(), json!({"url": format!("{}/bare", server.uri())})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "title": "127.0.0.1",
            "description": "",
            "image": "",
            "domain": "127.0.0.1"
        })
    );
}

#[tokio::test]
async fn test_relative_image_is_returned_as_written() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/rel",
        r#"<head><meta property="og:image" content="/images/card.png"></head>"#,
    )
    .await;

    let (_, body) = post_json(test_app(), json!({"url": format!("{}/rel", server.uri())})).await;
    assert_eq!(body["image"], "/images/card.png");
}

#[tokio::test]
async fn test_hostname_comes_from_requested_url_not_redirect() {
    let origin = MockServer::start().await;
    let target = MockServer::start().await;

    mount_html(&target, "/landing", "<html><body>no title</body></html>").await;
    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/landing", target.uri()).as_str()),
        )
        .mount(&origin)
        .await;

    // Address the origin by "localhost" so it differs from the redirect target
    let port = origin.address().port();
    let (status, body) = post_json(
        test_app(),
        json!({"url": format!("http://localhost:{port}/start")}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["domain"], "localhost");
    assert_eq!(body["title"], "localhost");
}

#[tokio::test]
async fn test_identical_requests_are_idempotent() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/stable",
        r#"<head><meta property="og:title" content="Stable"></head>"#,
    )
    .await;

    let url = json!({"url": format!("{}/stable", server.uri())});
    let state = test_state(2000);

    let (_, first) = post_json(router(state.clone(), &[]), url.clone()).await;
    let (_, second) = post_json(router(state, &[]), url).await;

    assert_eq!(first, second);
    assert_all_strings(&first);
}

// ============================================================================
// Internal failure
// ============================================================================

#[tokio::test]
async fn test_timeout_is_internal_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let (status, body) = post_json(router(test_state(50), &[]), json!({"url": server.uri()})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to fetch preview"}));
}

#[tokio::test]
async fn test_unreachable_host_is_internal_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let (status, body) = post_json(
        test_app(),
        json!({"url": format!("http://127.0.0.1:{port}/")}),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to fetch preview"}));
}

#[tokio::test]
async fn test_unsupported_scheme_is_internal_failure() {
    // Parses fine, so it is not a client error; the fetch itself cannot happen
    let (status, body) = post_json(test_app(), json!({"url": "ftp://example.com/file"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to fetch preview"}));
}

// ============================================================================
// Probes and counters
// ============================================================================

#[tokio::test]
async fn test_health_and_ready() {
    for uri in ["/health", "/ready"] {
        let response = test_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "healthy"}));
    }
}

#[tokio::test]
async fn test_status_reflects_counters() {
    let server = MockServer::start().await;
    mount_html(&server, "/ok", "<title>OK</title>").await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let state = test_state(2000);
    post_json(
        router(state.clone(), &[]),
        json!({"url": format!("{}/ok", server.uri())}),
    )
    .await;
    post_json(
        router(state.clone(), &[]),
        json!({"url": format!("{}/gone", server.uri())}),
    )
    .await;
    post_json(router(state.clone(), &[]), json!({})).await;

    let response = router(state, &[])
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["previews_served"], 1);
    assert_eq!(body["degraded_previews"], 1);
    assert_eq!(body["rejected_requests"], 1);
    assert_eq!(body["errors"], 0);
    assert_eq!(body["latency"]["total_requests"], 3);
    assert_eq!(body["status"], "running");
}

#[tokio::test]
async fn test_cors_preflight_for_site_origin() {
    let app = router(test_state(2000), &["https://example.com".to_string()]);
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(PREVIEW_PATH)
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("https://example.com")
    );
}

#[tokio::test]
async fn test_cors_rejects_foreign_origin() {
    let app = router(test_state(2000), &["https://example.com".to_string()]);
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(PREVIEW_PATH)
        .header(header::ORIGIN, "https://evil.example.net")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
