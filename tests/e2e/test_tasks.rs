use crate::e2e::helpers;

use helpers::{TestContext, ALL_FAIL, PRIMARY_FAILS};
use hyper::StatusCode;
use serde_json::json;
use test_context::test_context;

async fn queue_job(ctx: &TestContext, body: serde_json::Value) -> String {
    let response = ctx.client.post("/generate_audio", &body).await.unwrap();
    response.assert_status(StatusCode::ACCEPTED);

    let body = response.body.as_ref().unwrap();
    assert_eq!(body["status"].as_str(), Some("queued"));
    body["task_id"].as_str().expect("Missing task_id").to_string()
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_run_a_single_job(ctx: &TestContext) {
    let task_id = queue_job(
        ctx,
        json!({
            "text": "Hello there.",
            "audio_filename": "greeting.wav",
            "article_title": "Greetings"
        }),
    )
    .await;

    let status = ctx.wait_for_task(&task_id).await.unwrap();

    assert_eq!(status["task_id"].as_str(), Some(task_id.as_str()));
    assert_eq!(status["status"].as_str(), Some("succeeded"));
    assert!(status["result"].as_str().unwrap().ends_with("greeting.mp3"));
    assert_eq!(ctx.primary.calls(), 1);
    assert_eq!(ctx.backup.calls(), 0);

    ctx.client
        .get("/static/greeting.mp3")
        .await
        .unwrap()
        .assert_status(StatusCode::OK);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_fall_back_to_the_next_provider(ctx: &TestContext) {
    let task_id = queue_job(
        ctx,
        json!({
            "text": format!("Fallback {}", PRIMARY_FAILS),
            "audio_filename": "fallback_1.mp3"
        }),
    )
    .await;

    let status = ctx.wait_for_task(&task_id).await.unwrap();

    assert_eq!(status["status"].as_str(), Some("succeeded"));
    // one retry on the primary, then the backup
    assert_eq!(ctx.primary.calls(), 2);
    assert_eq!(ctx.backup.calls(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_honor_the_provider_override(ctx: &TestContext) {
    let task_id = queue_job(
        ctx,
        json!({
            "text": format!("Pinned {}", PRIMARY_FAILS),
            "audio_filename": "pinned_1.mp3",
            "provider": "piper"
        }),
    )
    .await;

    let status = ctx.wait_for_task(&task_id).await.unwrap();

    assert_eq!(status["status"].as_str(), Some("failed"));
    assert!(status["result"].as_str().unwrap().contains("all providers failed"));
    assert_eq!(ctx.backup.calls(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_fail_when_every_provider_fails(ctx: &TestContext) {
    let task_id = queue_job(
        ctx,
        json!({
            "text": format!("Doomed {}", ALL_FAIL),
            "audio_filename": "doomed_1.mp3",
            "gender": "Female"
        }),
    )
    .await;

    let status = ctx.wait_for_task(&task_id).await.unwrap();

    assert_eq!(status["status"].as_str(), Some("failed"));
    assert!(status["result"].as_str().unwrap().contains("engine unavailable"));
    assert_eq!(ctx.primary.calls(), 2);
    assert_eq!(ctx.backup.calls(), 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_resynthesize_existing_audio(ctx: &TestContext) {
    let body = json!({ "text": "Once.", "audio_filename": "once_1.mp3" });

    let first = queue_job(ctx, body.clone()).await;
    ctx.wait_for_task(&first).await.unwrap();
    let second = queue_job(ctx, body).await;
    let status = ctx.wait_for_task(&second).await.unwrap();

    assert_eq!(status["status"].as_str(), Some("succeeded"));
    assert_eq!(ctx.primary.calls(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_validate_generate_audio_requests(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/generate_audio", &json!({ "text": "  ", "audio_filename": "x.mp3" }))
        .await
        .unwrap();
    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("text must not be empty");

    let response = ctx
        .client
        .post("/generate_audio", &json!({ "audio_filename": "x.mp3" }))
        .await
        .unwrap();
    assert!(response.status.is_client_error());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_404_for_unknown_tasks(ctx: &TestContext) {
    let response = ctx.client.get("/task_status/not-a-task").await.unwrap();

    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_message("Task not found");
}
