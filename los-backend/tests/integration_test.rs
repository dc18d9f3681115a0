mod common;

use common::TestApp;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn ping_echoes_upstream_json_verbatim() {
    let upstream = MockServer::start().await;
    let payload = json!({ "ok": true, "service": "integration", "checks": [1, 2.5, null] });
    Mock::given(method("GET"))
        .and(path("/int/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = TestApp::spawn_with_integration(Some(upstream.uri())).await;

    let response = app
        .client()
        .get(app.url("/api/integration/ping"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "integration": payload }));
}

#[tokio::test]
async fn ping_forwards_request_id() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/int/ping"))
        .and(header("x-request-id", "corr-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("pong")))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = TestApp::spawn_with_integration(Some(format!("{}/", upstream.uri()))).await;

    let response = app
        .client()
        .get(app.url("/api/integration/ping"))
        .header("x-request-id", "corr-7")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "integration": "pong" }));
}

#[tokio::test]
async fn non_json_upstream_body_is_echoed_as_string() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/int/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&upstream)
        .await;

    let app = TestApp::spawn_with_integration(Some(upstream.uri())).await;

    let body: Value = app
        .client()
        .get(app.url("/api/integration/ping"))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    assert_eq!(body, json!({ "integration": "pong" }));
}

#[tokio::test]
async fn upstream_error_status_is_a_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/int/ping"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&upstream)
        .await;

    let app = TestApp::spawn_with_integration(Some(upstream.uri())).await;

    let response = app
        .client()
        .get(app.url("/api/integration/ping"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 502);
}

#[tokio::test]
async fn slow_upstream_hits_the_deadline() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/int/ping"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "late": true }))
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&upstream)
        .await;

    let app = TestApp::spawn_with_integration(Some(upstream.uri())).await;

    let response = app
        .client()
        .get(app.url("/api/integration/ping"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 504);
}

#[tokio::test]
async fn unconfigured_integration_fails_per_call() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .get(app.url("/api/integration/ping"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Configuration error");
}
