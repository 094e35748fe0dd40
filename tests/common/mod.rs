//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use rag_evaluator::{Config, Workbench};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\ntrailer\n%%EOF";

/// A workbench talking to `server`, with its session file in a temp dir.
pub fn workbench(server: &MockServer) -> (Workbench, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let config = Config::with_service(
        format!("{}/api", server.uri()),
        dir.path().join("session.json"),
    );
    let bench = Workbench::from_config(&config).expect("failed to build workbench");
    (bench, dir)
}

pub fn document_json(id: &str, session_id: &str) -> Value {
    json!({
        "id": id,
        "file_name": format!("{}.pdf", id),
        "file_path": format!("data/documents/{}.pdf", id),
        "file_type": "application/pdf",
        "file_size": 2048,
        "file_extension": "pdf",
        "session_id": session_id,
        "created_at": "2024-05-01T10:00:00Z",
        "processed": false
    })
}

pub fn question_json(id: &str, session_id: &str) -> Value {
    json!({
        "id": id,
        "question_string": format!("What does {} ask?", id),
        "session_id": session_id,
        "created_at": "2024-05-01T10:00:00Z"
    })
}

pub fn configuration_json(id: &str, session_id: &str, strategy: &str, size: u32, model: &str) -> Value {
    let size_field = match strategy {
        "fixed" => "chunk_size",
        "sentence" => "sentence_size",
        "paragraph" => "paragraph_size",
        "page" => "page_size",
        _ => "token_size",
    };
    let mut value = json!({
        "id": id,
        "session_id": session_id,
        "chunking_strategy": strategy,
        "token_size": null,
        "sentence_size": null,
        "paragraph_size": null,
        "page_size": null,
        "embedding_model": model,
        "similarity_metric": "cosine",
        "num_chunks": 3
    });
    value[size_field] = json!(size);
    value
}

pub fn answer_json(question: &str, rus: f64) -> Value {
    json!({
        "question": question,
        "answer": format!("Answer to {}", question),
        "chunks": [
            {"chunk_number": 1, "text": "first chunk", "relevance_score": 0.9, "similarity_score": 0.7},
            {"chunk_number": 4, "text": "fourth chunk", "relevance_score": 0.1, "similarity_score": 0.5}
        ],
        "visualization_plot": null,
        "rus_metrics": {
            "rus": rus,
            "normalized_dcr": 0.5,
            "scaled_correlation": 0.4,
            "wasted_similarity_penalty": 0.1
        }
    })
}

pub fn session_json(
    id: &str,
    documents: Vec<Value>,
    questions: Vec<Value>,
    configurations: Vec<Value>,
) -> Value {
    json!({
        "id": id,
        "documents": documents,
        "questions": questions,
        "configurations": configurations
    })
}

/// Serve `body` for loads of `session_id`.
pub async fn mount_session(server: &MockServer, session_id: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/get/session"))
        .and(query_param("session_id", session_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Load a session "s1" holding one document, two questions and two
/// configurations (fixed/500/ada-002 and sentence/3/sentence-transformer).
pub async fn populated_workbench(server: &MockServer) -> (Workbench, TempDir) {
    let body = session_json(
        "s1",
        vec![document_json("d1", "s1")],
        vec![question_json("q1", "s1"), question_json("q2", "s1")],
        vec![
            configuration_json("c1", "s1", "fixed", 500, "ada-002"),
            configuration_json("c2", "s1", "sentence", 3, "sentence-transformer"),
        ],
    );
    mount_session(server, "s1", body).await;

    let (bench, dir) = workbench(server);
    bench
        .session
        .load_session("s1")
        .await
        .expect("failed to load fixture session");
    (bench, dir)
}

/// Number of requests the server has seen so far.
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default()
}
