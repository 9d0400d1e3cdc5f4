use crate::e2e::helpers;

use helpers::TestContext;
use hyper::StatusCode;
use serde_json::json;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_ok_for_health_check(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.body, Some(json!({ "status": "ok" })));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_providers_breaker_and_workers(ctx: &TestContext) {
    let response = ctx.client.get("/health/ready").await.unwrap();

    response.assert_status(StatusCode::OK);

    let body = response.body.as_ref().unwrap();
    assert_eq!(body.get("status").and_then(|v| v.as_str()), Some("ready"));
    assert_eq!(body.get("providers"), Some(&json!(["openai", "piper"])));
    assert_eq!(body.get("workers").and_then(|v| v.as_u64()), Some(2));

    let breaker = body.get("circuit_breaker").expect("Missing circuit_breaker field");
    assert_eq!(breaker.get("threshold").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(breaker.get("open"), Some(&json!([])));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_count_provider_failures_in_readiness(ctx: &TestContext) {
    let response = ctx
        .client
        .post(
            "/generate_audio",
            &json!({
                "text": format!("Hello {}", helpers::PRIMARY_FAILS),
                "audio_filename": "breaker_1.mp3"
            }),
        )
        .await
        .unwrap();
    let task_id = response.body.as_ref().unwrap()["task_id"].as_str().unwrap().to_string();
    ctx.wait_for_task(&task_id).await.unwrap();

    let response = ctx.client.get("/health/ready").await.unwrap();
    let body = response.body.as_ref().unwrap();

    assert_eq!(body["circuit_breaker"]["failures"]["piper"], json!(1));
    assert_eq!(body["circuit_breaker"]["failures"]["openai"].as_u64().unwrap_or(0), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_include_request_id_in_responses(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();
    response.assert_header_exists("x-request-id");

    let response = ctx.client.get("/api/article/missing_article").await.unwrap();
    response.assert_header_exists("x-request-id");
}
