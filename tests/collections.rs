//! Document, question and configuration mirrors against a mocked service.

mod common;

use common::*;
use rag_evaluator::models::{ChunkingStrategy, DocumentUpload, Entity, NewConfiguration};
use rag_evaluator::RagEvalError;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ids<T: Entity>(items: &[T]) -> Vec<String> {
    items.iter().map(|item| item.id().to_string()).collect()
}

#[tokio::test]
async fn test_create_question_appends_server_copy() {
    let server = MockServer::start().await;
    let (bench, _dir) = populated_workbench(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/create/question"))
        .and(body_json(json!({"question_string": "Which chunking wins?", "session_id": "s1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "q-server",
            "question_string": "Which chunking wins?",
            "session_id": "s1",
            "created_at": "2024-05-02T08:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let changes = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&changes);
    bench.questions.on_change(move |items| {
        assert_eq!(items.len(), 3);
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let question = assert_ok!(bench.questions.create("Which chunking wins?", "s1").await);
    assert_eq!(question.id, "q-server");
    assert_eq!(question.created_at.as_deref(), Some("2024-05-02T08:00:00Z"));

    let items = bench.questions.items().await;
    assert_eq!(ids(&items), vec!["q1", "q2", "q-server"]);
    assert_eq!(changes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_create_then_delete_restores_mirror() {
    let server = MockServer::start().await;
    let (bench, _dir) = populated_workbench(&server).await;
    let before = bench.configurations.items().await;

    Mock::given(method("POST"))
        .and(path("/api/create/configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(configuration_json(
            "c3", "s1", "tokens", 256, "bert",
        )))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/delete/configuration"))
        .and(query_param("configuration_id", "c3"))
        .and(query_param("session_id", "s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Configuration deleted!"})))
        .expect(1)
        .mount(&server)
        .await;

    let draft = NewConfiguration::new(ChunkingStrategy::Tokens { token_size: 256 }, "bert", "cosine", 3);
    let created = assert_ok!(bench.configurations.create(&draft, "s1").await);
    assert_eq!(bench.configurations.len().await, 3);

    assert_ok!(bench.configurations.delete(&created.id, "s1").await);
    assert_eq!(bench.configurations.items().await, before);
}

#[tokio::test]
async fn test_delete_keeps_order_of_remaining() {
    let server = MockServer::start().await;
    let (bench, _dir) = populated_workbench(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/api/delete/question"))
        .and(query_param("question_id", "q1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert_ok!(bench.questions.delete("q1", "s1").await);
    assert_eq!(ids(&bench.questions.items().await), vec!["q2"]);
}

#[tokio::test]
async fn test_configuration_body_carries_only_active_size() {
    let server = MockServer::start().await;
    let (bench, _dir) = populated_workbench(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/create/configuration"))
        .and(body_json(json!({
            "name": "paragraphs",
            "session_id": "s1",
            "chunking_strategy": "paragraph",
            "paragraph_size": 2,
            "embedding_model": "roberta",
            "similarity_metric": "jaccard",
            "num_chunks": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(configuration_json(
            "c-par", "s1", "paragraph", 2, "roberta",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let draft = NewConfiguration::new(
        ChunkingStrategy::Paragraph { paragraph_size: 2 },
        "roberta",
        "jaccard",
        5,
    )
    .with_name("paragraphs");
    let created = assert_ok!(bench.configurations.create(&draft, "s1").await);
    assert_eq!(
        created.strategy,
        ChunkingStrategy::Paragraph { paragraph_size: 2 }
    );
}

#[tokio::test]
async fn test_create_without_session_makes_no_request() {
    let server = MockServer::start().await;
    let (bench, _dir) = populated_workbench(&server).await;
    let requests_before = request_count(&server).await;

    let err = assert_err!(bench.questions.create("Anything?", "").await);
    assert!(matches!(err, RagEvalError::Validation(_)));

    let draft = NewConfiguration::new(ChunkingStrategy::Fixed { chunk_size: 0 }, "ada-002", "cosine", 3);
    let err = assert_err!(bench.configurations.create(&draft, "s1").await);
    assert!(matches!(err, RagEvalError::Validation(_)));

    let err = assert_err!(bench.documents.delete("", "s1").await);
    assert!(matches!(err, RagEvalError::Validation(_)));

    assert_eq!(request_count(&server).await, requests_before);
    assert_eq!(bench.questions.len().await, 2);
}

#[tokio::test]
async fn test_non_pdf_upload_is_rejected_locally() {
    let server = MockServer::start().await;
    let (bench, _dir) = populated_workbench(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/upload/document"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_json("d-bad", "s1")))
        .expect(0)
        .mount(&server)
        .await;

    let upload = DocumentUpload::new("notes.txt", b"plain text".to_vec());
    let err = assert_err!(bench.documents.create(&upload, "s1").await);
    assert!(matches!(err, RagEvalError::UploadRejected(_)));
    assert_eq!(ids(&bench.documents.items().await), vec!["d1"]);
}

#[tokio::test]
async fn test_pdf_upload_appends_document() {
    let server = MockServer::start().await;
    let (bench, _dir) = populated_workbench(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/upload/document"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_json("d2", "s1")))
        .expect(1)
        .mount(&server)
        .await;

    let upload = DocumentUpload::new("annual-report.pdf", PDF_BYTES.to_vec());
    let document = assert_ok!(bench.documents.create(&upload, "s1").await);
    assert_eq!(document.file_type, "application/pdf");
    assert_eq!(ids(&bench.documents.items().await), vec!["d1", "d2"]);
}

#[tokio::test]
async fn test_failed_delete_leaves_mirror_unchanged() {
    let server = MockServer::start().await;
    let (bench, _dir) = populated_workbench(&server).await;
    let before = bench.configurations.items().await;

    Mock::given(method("DELETE"))
        .and(path("/api/delete/configuration"))
        .and(query_param("configuration_id", "missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "detail": "Configuration missing not found in session s1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let changes = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&changes);
    bench.configurations.on_change(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let err = assert_err!(bench.configurations.delete("missing", "s1").await);
    assert!(matches!(err, RagEvalError::NotFound(ref msg) if msg.contains("missing")));
    assert_eq!(bench.configurations.items().await, before);
    assert_eq!(changes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_create_is_not_mirrored() {
    let server = MockServer::start().await;
    let (bench, _dir) = populated_workbench(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/create/question"))
        .and(body_partial_json(json!({"session_id": "s1"})))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "detail": "Server error: Failed to add question"
        })))
        .mount(&server)
        .await;

    let err = assert_err!(bench.questions.create("Will this stick?", "s1").await);
    assert!(matches!(
        err,
        RagEvalError::Service { status: 500, ref message } if message == "Server error: Failed to add question"
    ));
    assert_eq!(bench.questions.len().await, 2);
}

#[tokio::test]
async fn test_echo_from_other_session_is_refused() {
    let server = MockServer::start().await;
    let (bench, _dir) = populated_workbench(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/create/question"))
        .respond_with(ResponseTemplate::new(200).set_body_json(question_json("q-x", "other")))
        .mount(&server)
        .await;

    let err = assert_err!(bench.questions.create("Whose is this?", "s1").await);
    assert!(matches!(err, RagEvalError::InvalidResponse(_)));
    assert!(bench.questions.get("q-x").await.is_none());
}
