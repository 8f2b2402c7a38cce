//! Integration tests for the HTTP surface: `/api/articles`, CORS and static
//! file hosting.
//!
//! Requests go straight into the router with `oneshot`; only the upstream
//! feed is a real (mock) server.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use habr_relay::api::{create_router, ApiState};
use habr_relay::cache::SentCache;
use habr_relay::feed::FeedFetcher;
use habr_relay::pipeline::Pipeline;

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Habr</title>
    <item>
      <guid>a-1</guid>
      <title>Разбор уязвимости &amp; патч</title>
      <link>https://habr.com/ru/articles/1/</link>
      <description><![CDATA[<p>Первый <em>абзац</em></p>]]></description>
    </item>
    <item>
      <guid>a-2</guid>
      <title>Second</title>
      <link>https://habr.com/ru/articles/2/</link>
      <description>plain</description>
    </item>
  </channel>
</rss>"#;

async fn feed_server(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss"))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body, "application/rss+xml"))
        .mount(&server)
        .await;
    server
}

fn router(server: &MockServer, static_dir: Option<&std::path::Path>) -> Router {
    let url = Url::parse(&format!("{}/rss", server.uri())).unwrap();
    let fetcher = FeedFetcher::new(reqwest::Client::new(), url);
    let pipeline = Arc::new(Pipeline::new(fetcher, Arc::new(SentCache::default())));
    create_router(ApiState::new(pipeline), static_dir)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// /api/articles
// ============================================================================

#[tokio::test]
async fn test_articles_returned_as_json_records() {
    let server = feed_server(200, FEED).await;
    let app = router(&server, None);

    let response = app.oneshot(get("/api/articles")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    assert_eq!(
        body_json(response).await,
        json!([
            {
                "title": "Разбор уязвимости & патч",
                "link": "https://habr.com/ru/articles/1/",
                "summary": "Первый абзац"
            },
            {
                "title": "Second",
                "link": "https://habr.com/ru/articles/2/",
                "summary": "plain"
            }
        ])
    );
}

#[tokio::test]
async fn test_second_request_returns_empty_array() {
    let server = feed_server(200, FEED).await;
    let app = router(&server, None);

    let first = app.clone().oneshot(get("/api/articles")).await.unwrap();
    assert_eq!(body_json(first).await.as_array().unwrap().len(), 2);

    let second = app.oneshot(get("/api/articles")).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(body_json(second).await, json!([]));
}

#[tokio::test]
async fn test_feed_failure_is_500() {
    let server = feed_server(500, "upstream broke").await;
    let app = router(&server, None);

    let response = app.oneshot(get("/api/articles")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Error fetching articles" })
    );
}

#[tokio::test]
async fn test_unsupported_method_is_405() {
    let server = feed_server(200, FEED).await;
    let app = router(&server, None);

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/articles")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
async fn test_cors_header_on_get() {
    let server = feed_server(200, FEED).await;
    let app = router(&server, None);

    let request = Request::builder()
        .uri("/api/articles")
        .header(header::ORIGIN, "https://example.org")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_preflight_allows_get_post_options() {
    let server = feed_server(200, FEED).await;
    let app = router(&server, None);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/articles")
        .header(header::ORIGIN, "https://example.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .to_string();
    for m in ["GET", "POST", "OPTIONS"] {
        assert!(methods.contains(m), "missing {m} in {methods}");
    }
    // Pre-flight must not run a pipeline cycle
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bare_options_is_ok() {
    let server = feed_server(200, FEED).await;
    let app = router(&server, None);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/articles")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Static hosting
// ============================================================================

fn static_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("habr_relay_static_{name}"));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>habr relay</h1>").unwrap();
    dir
}

#[tokio::test]
async fn test_static_files_served_for_other_paths() {
    let server = feed_server(200, FEED).await;
    let dir = static_dir("served");
    let app = router(&server, Some(dir.as_path()));

    let response = app.clone().oneshot(get("/index.html")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<h1>habr relay</h1>");

    let missing = app.oneshot(get("/nope.css")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_api_route_wins_over_static_dir() {
    let server = feed_server(200, FEED).await;
    let dir = static_dir("api_wins");
    let app = router(&server, Some(dir.as_path()));

    let response = app.oneshot(get("/api/articles")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_no_static_dir_means_404() {
    let server = feed_server(200, FEED).await;
    let app = router(&server, None);

    let response = app.oneshot(get("/index.html")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
