use crate::e2e::helpers;

use helpers::{TestContext, ALL_FAIL};
use hyper::StatusCode;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_articles_newest_first(ctx: &TestContext) {
    let response = ctx.client.get("/api/articles").await.unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.body, Some(serde_json::json!([])));

    let first = ctx.upload_text("a.txt", "Alpha Title\n\nBody one.").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let second = ctx.upload_text("b.txt", "Beta Title\n\nBody two.").await.unwrap();

    let response = ctx.client.get("/api/articles").await.unwrap();
    response.assert_status(StatusCode::OK);

    let list = response.body.as_ref().unwrap().as_array().unwrap().clone();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], second["id"]);
    assert_eq!(list[0]["title"].as_str(), Some("Beta Title"));
    assert_eq!(list[1]["id"], first["id"]);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_get_an_article(ctx: &TestContext) {
    let created = ctx.upload_text("a.txt", "Alpha Title\n\nBody one.").await.unwrap();
    let id = created["id"].as_str().unwrap();

    let response = ctx.client.get(&format!("/api/article/{}", id)).await.unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_eq!(body["id"].as_str(), Some(id));
    assert_eq!(body["paragraphs"], created["paragraphs"]);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_404_for_unknown_articles(ctx: &TestContext) {
    let response = ctx.client.get("/api/article/article_0_ffffff").await.unwrap();
    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_message("Article not found");

    let response = ctx.client.get("/api/article/..%2F..%2Fetc").await.unwrap();
    response.assert_status(StatusCode::NOT_FOUND);

    let response = ctx.client.get("/api/article/article_0_ffffff/progress").await.unwrap();
    response.assert_status(StatusCode::NOT_FOUND);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_delete_article_and_audio(ctx: &TestContext) {
    let created = ctx.upload_text("a.txt", "Only sentence.").await.unwrap();
    let id = created["id"].as_str().unwrap();
    ctx.wait_for_article(id).await.unwrap();

    let audio = created["paragraphs"][0]["audio"].as_str().unwrap();
    ctx.client
        .get(&format!("/static/{}", audio))
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    let response = ctx.client.delete(&format!("/api/article/{}", id)).await.unwrap();
    response.assert_status(StatusCode::NO_CONTENT);

    ctx.client
        .get(&format!("/api/article/{}", id))
        .await
        .unwrap()
        .assert_status(StatusCode::NOT_FOUND);
    ctx.client
        .get(&format!("/static/{}", audio))
        .await
        .unwrap()
        .assert_status(StatusCode::NOT_FOUND);

    let response = ctx.client.delete(&format!("/api/article/{}", id)).await.unwrap();
    response.assert_status(StatusCode::NOT_FOUND);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_complete_progress(ctx: &TestContext) {
    let created = ctx
        .upload_text("a.txt", "First paragraph.\n\nSecond paragraph.")
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    let progress = ctx.wait_for_article(id).await.unwrap();

    assert_eq!(progress["status"].as_str(), Some("complete"));
    assert_eq!(progress["total"].as_u64(), Some(2));
    assert_eq!(progress["succeeded"].as_u64(), Some(2));
    for paragraph in progress["paragraphs"].as_array().unwrap() {
        assert_eq!(paragraph["status"].as_str(), Some("succeeded"));
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_partial_progress(ctx: &TestContext) {
    let text = format!("Good paragraph.\n\nBad paragraph {}.", ALL_FAIL);
    let created = ctx.upload_text("a.txt", &text).await.unwrap();
    let id = created["id"].as_str().unwrap();

    let progress = ctx.wait_for_article(id).await.unwrap();

    assert_eq!(progress["status"].as_str(), Some("partial"));
    assert_eq!(progress["succeeded"].as_u64(), Some(1));
    assert_eq!(progress["failed"].as_u64(), Some(1));

    let failed = &progress["paragraphs"][1];
    assert_eq!(failed["index"].as_u64(), Some(2));
    assert_eq!(failed["status"].as_str(), Some("failed"));
    assert!(failed["result"]
        .as_str()
        .unwrap()
        .contains("all providers failed"));
}
