use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use inquiry_backend::core::clock::SystemClock;
use inquiry_backend::core::config::{AnswerMode, AppConfig};
use inquiry_backend::core::db;
use inquiry_backend::core::errors::ApiError;
use inquiry_backend::llm::{ChatRequest, LlmProvider};
use inquiry_backend::server;
use inquiry_backend::state::AppState;

const DIMENSION: usize = 64;

/// Offline provider: bag-of-words embeddings and a canned JSON chat reply.
struct OfflineProvider {
    chats: AtomicUsize,
}

fn vectorize(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; DIMENSION];
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let slot = token
            .to_lowercase()
            .bytes()
            .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
            % DIMENSION;
        vector[slot] += 1.0;
    }
    vector
}

#[async_trait]
impl LlmProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
        self.chats.fetch_add(1, Ordering::SeqCst);
        let context = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let answer = if context.contains("Go to settings > security") {
            "Open settings and choose security to reset it."
        } else {
            "I do not know."
        };
        Ok(format!("```json\n{}\n```", json!({ "answer": answer })))
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        Ok(inputs.iter().map(|text| vectorize(text)).collect())
    }
}

struct TestServer {
    base_url: String,
    provider: Arc<OfflineProvider>,
    client: reqwest::Client,
    _dir: tempfile::TempDir,
}

async fn start(answer_mode: AnswerMode) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("data_set.csv");
    std::fs::write(
        &source_path,
        "flags,instruction,category,intent,response\n\
         B,reset password,ACCOUNT,recover_password,Go to settings > security\n\
         B,track my order,ORDER,track_order,Open the orders page\n\
         B,,ORDER,broken_row,This row has no instruction\n",
    )
    .unwrap();

    let mut config = AppConfig::default();
    config.database.path = dir.path().join("inquiry.db");
    config.embedding.dimension = DIMENSION;
    config.ingestion.source_path = source_path;
    config.inquiry.answer_mode = answer_mode;

    let pool = db::connect(&config.database.path, 2).await.unwrap();
    let provider = Arc::new(OfflineProvider {
        chats: AtomicUsize::new(0),
    });
    let state = AppState::from_parts(
        config,
        pool,
        provider.clone(),
        Arc::new(SystemClock),
        CancellationToken::new(),
    )
    .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = server::router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        provider,
        client: reqwest::Client::new(),
        _dir: dir,
    }
}

impl TestServer {
    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let res = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status().as_u16();
        (status, res.json().await.unwrap())
    }

    async fn get(&self, path: &str) -> (u16, Value, Option<String>) {
        let res = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = res.status().as_u16();
        let trid = res
            .headers()
            .get("x-trid")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        (status, res.json().await.unwrap(), trid)
    }
}

#[tokio::test]
async fn ingest_then_ask_returns_refined_answer() {
    let server = start(AnswerMode::Refine).await;

    let (status, body) = server.post("/inquiries/embed-origins", json!({})).await;
    assert_eq!(status, 201);
    assert_eq!(body["code"], "0201");
    assert_eq!(body["result"]["rows_read"], 3);
    assert_eq!(body["result"]["rows_skipped"], 1);
    assert_eq!(body["result"]["entries_saved"], 2);

    let (status, body) = server
        .post("/inquiries/ask", json!({ "msg": "how do I reset my password" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["code"], "0200");
    assert_eq!(
        body["result"]["response"],
        "Open settings and choose security to reset it."
    );
    assert_eq!(body["trid"].as_str().map(str::len), Some(22));
    assert_eq!(server.provider.chats.load(Ordering::SeqCst), 1);

    let (status, body, _) = server.get("/healthz").await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["knowledge_entries"], 2);
}

#[tokio::test]
async fn direct_mode_answers_with_stored_response() {
    let server = start(AnswerMode::Direct).await;
    server.post("/inquiries/embed-origins", json!({})).await;

    let (status, body) = server
        .post("/inquiries/ask", json!({ "msg": "reset my password" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["response"], "Go to settings > security");
    assert_eq!(server.provider.chats.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ask_errors_use_the_error_envelope() {
    let server = start(AnswerMode::Refine).await;

    let (status, body) = server.post("/inquiries/ask", json!({ "msg": "   " })).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "InvalidParameter");
    assert_eq!(body["result"]["msg"], "question cannot be empty");

    let (status, body) = server.post("/inquiries/ask", json!({ "msg": "anything" })).await;
    assert_eq!(status, 500);
    assert_eq!(body["code"], "InternalError");
    assert_eq!(
        body["result"]["msg"],
        "failed to find similar inquiry knowledge: no similar inquiry knowledge found"
    );
}

#[tokio::test]
async fn user_endpoints_round_trip() {
    let server = start(AnswerMode::Direct).await;

    let (status, body) = server
        .post("/users", json!({ "name": " Ada  Lovelace ", "email": "Ada@Example.com" }))
        .await;
    assert_eq!(status, 201);
    assert_eq!(body["result"]["email"], "ada@example.com");
    let id = body["result"]["id"].as_i64().unwrap();

    let (status, body) = server
        .post("/users", json!({ "name": "Ada", "email": "ada@example.com" }))
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["code"], "ConstraintError");

    let (status, body, trid) = server.get(&format!("/users/{}", id)).await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["name"], "Ada Lovelace");
    assert_eq!(trid.as_deref(), body["trid"].as_str());

    let (status, body, _) = server.get("/users/9999").await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "NotFound");

    let (status, body, _) = server.get("/users/abc").await;
    assert_eq!(status, 400);
    assert_eq!(body["result"]["msg"], "invalid user id format");

    let (status, body, _) = server.get("/users?offset=-5&limit=1000").await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["offset"], 0);
    assert_eq!(body["result"]["limit"], 50);
    assert_eq!(body["result"]["total"], 1);

    let (status, body, _) = server.get("/healthz").await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["status"], "ok");
    assert_eq!(body["result"]["knowledge_entries"], 0);
}

#[tokio::test]
async fn basic_chat_talks_to_the_model_without_retrieval() {
    let server = start(AnswerMode::Refine).await;

    let (status, body) = server.post("/basic-chat/ask", json!({ "msg": "hello" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["code"], "0200");
    let raw = body["result"]["response"].as_str().unwrap();
    assert!(raw.starts_with("```json"));
    assert!(raw.contains("I do not know."));

    let (status, body) = server
        .post(
            "/basic-chat/ask-structured",
            json!({ "msg": "Go to settings > security, then what?" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(
        body["result"]["response"],
        "Open settings and choose security to reset it."
    );
    assert_eq!(server.provider.chats.load(Ordering::SeqCst), 2);

    let (status, body) = server.post("/basic-chat/ask", json!({ "msg": "  " })).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "InvalidParameter");
    assert_eq!(body["result"]["msg"], "message cannot be empty");

    let (status, body) = server.post("/basic-chat/ask", json!({ "text": "hi" })).await;
    assert_eq!(status, 400);
    assert!(body["result"]["msg"]
        .as_str()
        .unwrap()
        .starts_with("invalid json"));
    assert_eq!(server.provider.chats.load(Ordering::SeqCst), 2);
}
