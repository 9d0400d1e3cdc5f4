use crate::e2e::helpers;

use helpers::{TestContext, ENCODED_AUDIO, MAX_UPLOAD_BYTES};
use hyper::StatusCode;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_create_article_from_text_upload(ctx: &TestContext) {
    let response = ctx
        .client
        .post_file(
            "/upload",
            "notes.txt",
            b"Weekly Notes\n\nThe first line\nwraps here.\n\n- one item\n- two item",
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();

    let id = body["id"].as_str().expect("Missing id field");
    assert!(id.starts_with("article_"), "unexpected id {}", id);
    assert_eq!(body["title"].as_str(), Some("Weekly Notes"));

    let paragraphs = body["paragraphs"].as_array().expect("Missing paragraphs");
    let texts: Vec<&str> = paragraphs.iter().filter_map(|p| p["text"].as_str()).collect();
    assert_eq!(
        texts,
        vec!["Weekly Notes", "The first line wraps here.", "- one item", "- two item"]
    );

    for (i, paragraph) in paragraphs.iter().enumerate() {
        assert_eq!(
            paragraph["audio"].as_str(),
            Some(format!("{}_{}.mp3", id, i + 1).as_str())
        );
        assert!(paragraph["task_id"].as_str().is_some(), "Missing task id");
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_publish_audio_under_static(ctx: &TestContext) {
    let article = ctx.upload_text("short.txt", "Just one sentence.").await.unwrap();
    let id = article["id"].as_str().unwrap();

    let progress = ctx.wait_for_article(id).await.unwrap();
    assert_eq!(progress["status"].as_str(), Some("complete"));

    let audio = article["paragraphs"][0]["audio"].as_str().unwrap();
    let response = ctx.client.get(&format!("/static/{}", audio)).await.unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.body_bytes, ENCODED_AUDIO);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_split_long_paragraphs_with_chunk_limit(ctx: &TestContext) {
    let response = ctx
        .client
        .post_file(
            "/upload?chunk_limit=25",
            "long.txt",
            b"First sentence is here. Second sentence is here. Third one.",
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let paragraphs = response.body.as_ref().unwrap()["paragraphs"].as_array().unwrap().clone();
    let texts: Vec<&str> = paragraphs.iter().filter_map(|p| p["text"].as_str()).collect();
    assert_eq!(
        texts,
        vec!["First sentence is here.", "Second sentence is here.", "Third one."]
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_extract_text_from_pdf(ctx: &TestContext) {
    let response = ctx
        .client
        .post_file("/upload", "report.pdf", b"%PDF-fake content")
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_eq!(body["title"].as_str(), Some("Quarterly Report"));
    assert_eq!(body["paragraphs"][1]["text"].as_str(), Some("Revenue grew. Costs fell."));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_unreadable_pdf(ctx: &TestContext) {
    let response = ctx
        .client
        .post_file("/upload", "report.pdf", b"not really a pdf")
        .await
        .unwrap();

    response
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_error_message("could not read PDF");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_unsupported_file_types(ctx: &TestContext) {
    let response = ctx
        .client
        .post_file("/upload", "slides.pptx", b"binary")
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("only .txt and .pdf");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_empty_documents(ctx: &TestContext) {
    let response = ctx
        .client
        .post_file("/upload", "empty.txt", b"   \n\n\t ")
        .await
        .unwrap();

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_oversized_uploads(ctx: &TestContext) {
    let contents = vec![b'a'; MAX_UPLOAD_BYTES + 1];
    let response = ctx
        .client
        .post_file("/upload", "big.txt", &contents)
        .await
        .unwrap();

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_require_the_file_field(ctx: &TestContext) {
    let response = ctx
        .client
        .post_multipart("/upload", "document", Some("notes.txt"), b"Hello.")
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("missing multipart field 'file'");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_zero_chunk_limit(ctx: &TestContext) {
    let response = ctx
        .client
        .post_file("/upload?chunk_limit=0", "notes.txt", b"Hello.")
        .await
        .unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
}
