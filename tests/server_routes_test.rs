use httpmock::prelude::*;
use reqwest::StatusCode;
use serde_json::{json, Value};
use wearsearch_edge::{build_router, AppState, EdgeConfig};

async fn spawn_edge(backend_url: String, csrf_enabled: bool) -> String {
    let config = EdgeConfig {
        backend_url,
        csrf_enabled,
        ..EdgeConfig::default()
    };
    let state = AppState::from_config(&config).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn json_of(response: reqwest::Response) -> Value {
    response.json::<Value>().await.unwrap()
}

#[tokio::test]
async fn test_health() {
    let backend = MockServer::start_async().await;
    let edge = spawn_edge(backend.base_url(), false).await;

    let response = reqwest::get(format!("{}/health", edge)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_translate_is_forwarded_with_upstream_status() {
    let backend = MockServer::start_async().await;
    let translate = backend
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/translate")
                .json_body(json!({"text": "Привіт", "targetLang": "en"}));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"translatedText": "Hello"}));
        })
        .await;
    let edge = spawn_edge(backend.base_url(), false).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/translate", edge))
        .json(&json!({"text": "Привіт", "targetLang": "EN"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_of(response).await, json!({"translatedText": "Hello"}));
    translate.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_translate_upstream_error_status_propagates() {
    let backend = MockServer::start_async().await;
    backend
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/translate");
            then.status(503).json_body(json!({"error": "quota exceeded"}));
        })
        .await;
    let edge = spawn_edge(backend.base_url(), false).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/translate", edge))
        .json(&json!({"text": "hello", "targetLang": "uk", "sourceLang": "en"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_of(response).await, json!({"error": "quota exceeded"}));
}

#[tokio::test]
async fn test_translate_validation_never_reaches_backend() {
    let backend = MockServer::start_async().await;
    let translate = backend
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200);
        })
        .await;
    let edge = spawn_edge(backend.base_url(), false).await;
    let client = reqwest::Client::new();

    let cases = [
        (json!({"targetLang": "en"}), "text is required"),
        (json!({"text": "   ", "targetLang": "en"}), "text is required"),
        (json!({"text": "hi"}), "targetLang is required"),
    ];
    for (body, message) in cases {
        let response = client
            .post(format!("{}/api/translate", edge))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_of(response).await, json!({"error": message}));
    }

    let too_long = "a".repeat(5001);
    let response = client
        .post(format!("{}/api/translate", edge))
        .json(&json!({"text": too_long, "targetLang": "en"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/translate", edge))
        .json(&json!({"text": "hi", "targetLang": "fr"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/translate", edge))
        .header("Content-Type", "application/json")
        .body("{oops")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_of(response).await, json!({"error": "Invalid JSON body"}));

    translate.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_unreachable_backend_is_internal_error() {
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead_backend = format!("http://{}", closed.local_addr().unwrap());
    drop(closed);

    let edge = spawn_edge(dead_backend, false).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/translate", edge))
        .json(&json!({"text": "hi", "targetLang": "en"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_of(response).await, json!({"error": "Internal server error"}));
}

#[tokio::test]
async fn test_currency_cookie_round() {
    let backend = MockServer::start_async().await;
    let edge = spawn_edge(backend.base_url(), false).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{}/api/currency", edge)).send().await.unwrap();
    assert_eq!(json_of(response).await, json!({"currency": "UAH"}));

    let response = client
        .get(format!("{}/api/currency", edge))
        .header("Cookie", "preferred_currency=EUR")
        .send()
        .await
        .unwrap();
    assert_eq!(json_of(response).await, json!({"currency": "EUR"}));

    let response = client
        .post(format!("{}/api/currency", edge))
        .json(&json!({"currency": "usd"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(cookie.starts_with("preferred_currency=USD; Path=/"));
    assert!(cookie.contains("Max-Age=31536000"));
    assert!(cookie.contains("SameSite=Lax"));
    assert_eq!(
        json_of(response).await,
        json!({"success": true, "currency": "USD"})
    );

    let response = client
        .post(format!("{}/api/currency", edge))
        .json(&json!({"currency": "GBP"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_language_cookie() {
    let backend = MockServer::start_async().await;
    let edge = spawn_edge(backend.base_url(), false).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{}/api/language", edge)).send().await.unwrap();
    assert_eq!(json_of(response).await, json!({"language": "uk"}));

    let response = client
        .post(format!("{}/api/language", edge))
        .json(&json!({"language": "en"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["set-cookie"]
        .to_str()
        .unwrap()
        .starts_with("wearsearch_language=en;"));

    let response = client
        .post(format!("{}/api/language", edge))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_of(response).await, json!({"error": "language is required"}));
}

#[tokio::test]
async fn test_affiliate_click_forwards_client_headers() {
    let backend = MockServer::start_async().await;
    let click = backend
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/affiliate/click")
                .header("user-agent", "TestAgent/1.0")
                .header("referer", "https://wearsearch.com/products/42")
                .json_body_partial(
                    r#"{"productId": "42", "storeId": "store-7", "url": "https://shop.example/p/42"}"#,
                );
            then.status(201).json_body(json!({"tracked": true}));
        })
        .await;
    let edge = spawn_edge(backend.base_url(), false).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/affiliate/click", edge))
        .header("User-Agent", "TestAgent/1.0")
        .header("Referer", "https://wearsearch.com/products/42")
        .json(&json!({"productId": 42, "storeId": "store-7", "url": "https://shop.example/p/42"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    click.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_affiliate_click_rejects_bad_input() {
    let backend = MockServer::start_async().await;
    let edge = spawn_edge(backend.base_url(), false).await;
    let client = reqwest::Client::new();

    let bodies = [
        json!({"storeId": "s"}),
        json!({"productId": "p"}),
        json!({"productId": "x".repeat(129), "storeId": "s"}),
        json!({"productId": "p", "storeId": "s", "url": "javascript:alert(1)"}),
    ];
    for body in bodies {
        let response = client
            .post(format!("{}/api/affiliate/click", edge))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
}

#[tokio::test]
async fn test_og_card_is_svg() {
    let backend = MockServer::start_async().await;
    let edge = spawn_edge(backend.base_url(), false).await;

    let response = reqwest::get(format!(
        "{}/api/og?title=Nike%20%26%20Co&subtitle=Air%20Max&price=4999%20UAH",
        edge
    ))
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/svg+xml");
    let svg = response.text().await.unwrap();
    assert!(svg.contains("Nike &amp; Co"));
    assert!(svg.contains("Air Max"));
    assert!(svg.contains("4999 UAH"));
}

#[tokio::test]
async fn test_image_resolve_routes() {
    let backend = MockServer::start_async().await;
    let presign = backend
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/images/presigned-url")
                .query_param("key", "products/abc.jpg");
            then.status(200)
                .json_body(json!({"url": "https://signed/x", "expiresIn": 60}));
        })
        .await;
    let edge = spawn_edge(backend.base_url(), false).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/images/resolve?key=products/abc.jpg", edge))
        .send()
        .await
        .unwrap();
    assert_eq!(json_of(response).await, json!({"url": "https://signed/x"}));

    let response = client
        .post(format!("{}/api/images/resolve", edge))
        .json(&json!({"keys": ["products/abc.jpg", "https://cdn.example/a.png", ""]}))
        .send()
        .await
        .unwrap();
    assert_eq!(
        json_of(response).await,
        json!({"urls": ["https://signed/x", "https://cdn.example/a.png", ""]})
    );
    presign.assert_hits_async(1).await;

    let response = client
        .get(format!("{}/api/images/resolve", edge))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let too_many: Vec<String> = (0..101).map(|i| format!("products/{}.jpg", i)).collect();
    let response = client
        .post(format!("{}/api/images/resolve", edge))
        .json(&json!({ "keys": too_many }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_csrf_double_submit() {
    let backend = MockServer::start_async().await;
    let edge = spawn_edge(backend.base_url(), true).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/currency", edge))
        .json(&json!({"currency": "USD"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_of(response).await, json!({"error": "Invalid CSRF token"}));

    let response = client
        .get(format!("{}/api/csrf-token", edge))
        .send()
        .await
        .unwrap();
    let cookie = response.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(cookie.contains("SameSite=Strict"));
    let token = json_of(response).await["csrfToken"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(token.len(), 36);
    assert!(cookie.starts_with(&format!("csrf_token={};", token)));

    let response = client
        .post(format!("{}/api/currency", edge))
        .header("Cookie", format!("csrf_token={}", token))
        .header("x-csrf-token", "something-else")
        .json(&json!({"currency": "USD"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .post(format!("{}/api/currency", edge))
        .header("Cookie", format!("csrf_token={}", token))
        .header("x-csrf-token", &token)
        .json(&json!({"currency": "USD"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // GET routes are not guarded
    let response = client
        .get(format!("{}/api/currency", edge))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
