mod common;

use common::TestApp;
use serde_json::Value;

async fn incr(app: &TestApp, key: &str) -> reqwest::Response {
    app.client()
        .get(app.url(&format!("/api/redis/incr/{}", key)))
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn first_increment_of_unseen_key_is_one() {
    let app = TestApp::spawn().await;

    let response = incr(&app, "visits").await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, serde_json::json!({ "key": "visits", "value": 1 }));
}

#[tokio::test]
async fn increments_are_monotonic_by_one() {
    let app = TestApp::spawn().await;

    for expected in 1..=5 {
        let body: Value = incr(&app, "loans").await.json().await.unwrap();
        assert_eq!(body["value"], expected);
    }

    let body: Value = incr(&app, "other").await.json().await.unwrap();
    assert_eq!(body["value"], 1);
}

#[tokio::test]
async fn concurrent_increments_yield_distinct_values() {
    let app = TestApp::spawn().await;

    let calls = (0..20).map(|_| incr(&app, "burst"));
    let responses = futures::future::join_all(calls).await;

    let mut values = Vec::new();
    for response in responses {
        let body: Value = response.json().await.unwrap();
        values.push(body["value"].as_i64().unwrap());
    }
    values.sort_unstable();
    assert_eq!(values, (1..=20).collect::<Vec<i64>>());
}

#[tokio::test]
async fn oversized_key_is_rejected() {
    let app = TestApp::spawn().await;
    let key = "k".repeat(600);

    let response = incr(&app, &key).await;
    assert_eq!(response.status(), 400);
}
