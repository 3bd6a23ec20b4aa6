use crate::{app, config::AppConfig, registry::CodeRegistry, AppState};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const BASE_URL: &str = "http://short.test";

fn test_state() -> Arc<AppState> {
    Arc::new(AppState {
        config: AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            base_url: BASE_URL.into(),
            cors_origin: "http://localhost:3001".into(),
        },
        registry: CodeRegistry::new(),
    })
}

fn router(state: &Arc<AppState>) -> Router {
    app(state.clone()).unwrap()
}

async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };

    let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

async fn encode(state: &Arc<AppState>, url: &str) -> String {
    let (status, body) = send(
        router(state),
        Method::POST,
        "/api/encode",
        Some(json!({ "url": url })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let short_url = json_body(&body)["shortUrl"].as_str().unwrap().to_owned();
    short_url
        .strip_prefix(&format!("{BASE_URL}/"))
        .unwrap()
        .to_owned()
}

#[tokio::test]
async fn encode_returns_short_url() {
    let state = test_state();
    let code = encode(&state, "https://example.com").await;

    assert_eq!(code.len(), 8);
    assert_eq!(state.registry.resolve(&code).unwrap().original_url, "https://example.com");
}

#[tokio::test]
async fn encode_rejects_invalid_url() {
    let state = test_state();

    let (status, body) = send(
        router(&state),
        Method::POST,
        "/api/encode",
        Some(json!({ "url": "invalid-url" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json_body(&body)["error"].is_string());

    let (status, _) = send(router(&state), Method::POST, "/api/encode", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(state.registry.is_empty());
}

#[tokio::test]
async fn encode_rejects_embedded_control_characters() {
    let state = test_state();

    for url in ["https://example.com/a\nb", "https://example.com/a\tb\nc"] {
        let (status, _) = send(
            router(&state),
            Method::POST,
            "/api/encode",
            Some(json!({ "url": url })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{url:?}");
    }

    assert!(state.registry.is_empty());
}

#[tokio::test]
async fn every_accepted_url_redirects_with_location() {
    let state = test_state();

    for target in [
        "https://example.com/search?q=a b",
        "ftp://files.example.com/pub/a.txt",
        "http://example.com/p%C3%A4th#frag",
    ] {
        let code = encode(&state, target).await;
        let response = router(&state)
            .oneshot(
                Request::builder()
                    .uri(format!("/{code}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response
            .headers()
            .get(header::LOCATION)
            .expect("redirect must carry a Location header");
        assert_eq!(location, target);
        assert!(url::Url::parse(location.to_str().unwrap()).is_ok());
    }
}

#[tokio::test]
async fn decode_known_and_unknown_codes() {
    let state = test_state();
    let code = encode(&state, "https://example.com/page").await;

    let (status, body) = send(router(&state), Method::GET, &format!("/api/decode/{code}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({ "originalUrl": "https://example.com/page" }));

    let (status, body) = send(router(&state), Method::GET, "/api/decode/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body), json!({ "error": "URL not found" }));
}

#[tokio::test]
async fn redirect_counts_visit() {
    let state = test_state();
    let code = encode(&state, "https://example.com").await;

    let response = router(&state)
        .oneshot(
            Request::builder()
                .uri(format!("/{code}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://example.com"
    );

    let (status, body) = send(router(&state), Method::GET, &format!("/api/statistic/{code}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let stats = json_body(&body);
    assert_eq!(stats["visits"], 1);
    assert!(stats["createdAt"].is_string());
    assert!(stats["lastVisited"].is_string());
}

#[tokio::test]
async fn redirect_unknown_code_is_404() {
    let state = test_state();
    let (status, _) = send(router(&state), Method::GET, "/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn statistic_before_any_visit() {
    let state = test_state();
    let code = encode(&state, "https://example.com").await;

    let (status, body) = send(router(&state), Method::GET, &format!("/api/statistic/{code}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let stats = json_body(&body);
    assert_eq!(stats["visits"], 0);
    assert!(stats.get("lastVisited").is_none());

    let (status, _) = send(router(&state), Method::GET, "/api/statistic/missing1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_and_search() {
    let state = test_state();
    encode(&state, "https://example1.com").await;
    encode(&state, "https://test.com").await;

    let (status, body) = send(router(&state), Method::GET, "/api/list", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = json_body(&body);
    assert_eq!(listed.as_array().unwrap().len(), 2);
    assert_eq!(listed[0]["originalUrl"], "https://example1.com");
    assert_eq!(listed[0]["visits"], 0);
    assert!(listed[0].get("lastVisited").is_none());

    let (_, body) = send(router(&state), Method::GET, "/api/search?q=EXAMPLE", None).await;
    let hits = json_body(&body);
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["originalUrl"], "https://example1.com");

    let (_, body) = send(router(&state), Method::GET, "/api/search?q=ex", None).await;
    assert_eq!(json_body(&body), json!([]));

    let (status, body) = send(router(&state), Method::GET, "/api/search", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!([]));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let state = test_state();
    let code = encode(&state, "https://example.com").await;

    let (status, body) = send(router(&state), Method::DELETE, &format!("/{code}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!(true));

    let (status, body) = send(router(&state), Method::DELETE, &format!("/{code}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!(false));

    let (status, _) = send(router(&state), Method::GET, &format!("/{code}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_link_count() {
    let state = test_state();
    encode(&state, "https://example.com").await;

    let (status, body) = send(router(&state), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({ "status": "ok", "links": 1 }));
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let state = test_state();
    let response = router(&state)
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/encode")
                .header(header::ORIGIN, "http://localhost:3001")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:3001"
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}
