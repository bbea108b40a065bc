// ABOUTME: Integration tests for the HTTP surface
// ABOUTME: Turn, streaming, session, history, chatbot, query, and health endpoints

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;
mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use serde_json::json;
use uuid::Uuid;

use common::{create_test_resources, MockLlm, MockRetriever};
use helpers::axum_test::AxumTestRequest;
use ragserve::llm::LlmProvider;
use ragserve::resources::ServerResources;
use ragserve::retrieval::ContextAssembler;
use ragserve::routes;

async fn test_app(llm: MockLlm, retriever: MockRetriever) -> (Arc<ServerResources>, Router) {
    let resources = create_test_resources(
        Arc::new(llm) as Arc<dyn LlmProvider>,
        Arc::new(retriever) as Arc<dyn ContextAssembler>,
    )
    .await;
    let app = routes::router(Arc::clone(&resources));
    (resources, app)
}

fn turn_body(chatbot_id: &str, query: &str) -> serde_json::Value {
    json!({ "chatbot_id": chatbot_id, "query": query })
}

#[tokio::test]
async fn test_chat_turn_and_follow_up_sequence() {
    let (_resources, app) = test_app(
        MockLlm::replying(&["Hi ", "there"]),
        MockRetriever::with_documents(&[("guide.md", "facts")]),
    )
    .await;
    let chatbot_id = Uuid::new_v4().to_string();

    // First turn with no session/chat gets fresh identifiers.
    let response = AxumTestRequest::post("/chat")
        .json(&turn_body(&chatbot_id, "hello"))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.json();
    assert_eq!(body["success"], json!(true));
    let data = &body["data"];
    assert_eq!(data["user_query"], json!("hello"));
    assert_eq!(data["bot_response"], json!("Hi there"));
    assert_eq!(data["context_used"], json!(["guide.md"]));

    let session_id = data["session_id"].as_str().unwrap().to_owned();
    let chat_id = data["chat_id"].as_str().unwrap().to_owned();
    assert!(Uuid::parse_str(&session_id).is_ok());
    assert!(Uuid::parse_str(&chat_id).is_ok());

    // Follow-up turn in the same chat.
    let response = AxumTestRequest::post("/chat")
        .json(&json!({
            "chatbot_id": chatbot_id,
            "query": "more",
            "session_id": session_id,
            "chat_id": chat_id,
        }))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json()["data"]["chat_id"], json!(chat_id));

    // History shows both turns ordered by sequence number.
    let response = AxumTestRequest::get(&format!("/chat/history?chat_id={chat_id}"))
        .send(app)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.json();
    assert_eq!(body["data"]["count"], json!(2));
    let conversations = body["data"]["conversations"].as_array().unwrap();
    assert_eq!(conversations[0]["sequence_number"], json!(1));
    assert_eq!(conversations[0]["user_query"], json!("hello"));
    assert_eq!(conversations[1]["sequence_number"], json!(2));
    assert_eq!(conversations[1]["user_query"], json!("more"));
}

#[tokio::test]
async fn test_chat_validation_errors_are_bad_request() {
    let (_resources, app) = test_app(MockLlm::replying(&["x"]), MockRetriever::empty()).await;

    let response = AxumTestRequest::post("/chat")
        .json(&turn_body(&Uuid::new_v4().to_string(), "  "))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["success"], json!(false));

    let response = AxumTestRequest::post("/chat")
        .json(&turn_body("  ", "hello"))
        .send(app)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_accepts_opaque_chatbot_id() {
    let (_resources, app) = test_app(
        MockLlm::replying(&["ok"]),
        MockRetriever::with_documents(&[("guide.md", "facts")]),
    )
    .await;

    // chatbot_id only names a document index; it need not be a UUID.
    let response = AxumTestRequest::post("/chat")
        .json(&turn_body("b1", "hello"))
        .send(app)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.json();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["bot_response"], json!("ok"));
}

#[tokio::test]
async fn test_chat_with_unknown_session_is_not_found() {
    let (_resources, app) = test_app(MockLlm::replying(&["x"]), MockRetriever::empty()).await;

    let response = AxumTestRequest::post("/chat")
        .json(&json!({
            "chatbot_id": Uuid::new_v4().to_string(),
            "query": "hello",
            "session_id": "missing-session",
        }))
        .send(app)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.json()["success"], json!(false));
}

#[tokio::test]
async fn test_chat_with_mismatched_session_is_conflict() {
    let (resources, app) = test_app(MockLlm::replying(&["x"]), MockRetriever::empty()).await;

    let store = resources.database.conversations();
    let owning_session = store.create_session().await.unwrap();
    let other_session = store.create_session().await.unwrap();
    let chat = store
        .create_chat(&owning_session.id, "New Chat")
        .await
        .unwrap();

    let response = AxumTestRequest::post("/chat")
        .json(&json!({
            "chatbot_id": Uuid::new_v4().to_string(),
            "query": "hello",
            "session_id": other_session.id,
            "chat_id": chat.id,
        }))
        .send(app)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_chat_generation_failure_is_server_error() {
    let (_resources, app) = test_app(MockLlm::failing(), MockRetriever::empty()).await;

    let response = AxumTestRequest::post("/chat")
        .json(&turn_body(&Uuid::new_v4().to_string(), "hello"))
        .send(app)
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["success"], json!(false));
}

#[tokio::test]
async fn test_chat_stream_emits_fragments_and_terminal_event() {
    let (_resources, app) = test_app(
        MockLlm::replying(&["str", "eam", "ing"]),
        MockRetriever::empty(),
    )
    .await;

    let response = AxumTestRequest::post("/chat/stream")
        .json(&turn_body(&Uuid::new_v4().to_string(), "hello"))
        .send(app)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let events = response.sse_events();
    assert!(events.len() >= 2);

    let finals: Vec<_> = events
        .iter()
        .filter(|e| e["is_final"] == json!(true))
        .collect();
    assert_eq!(finals.len(), 1);
    let terminal = events.last().unwrap();
    assert_eq!(terminal["is_final"], json!(true));
    assert_eq!(terminal["text"], json!(""));

    let streamed: String = events
        .iter()
        .filter(|e| e["is_final"] == json!(false))
        .map(|e| e["text"].as_str().unwrap())
        .collect();
    assert_eq!(streamed, "streaming");

    for event in &events {
        assert!(event["session_id"].is_string());
        assert!(event["chat_id"].is_string());
        assert!(event["conversation_id"].is_string());
    }
}

#[tokio::test]
async fn test_chat_stream_mid_failure_sends_error_event_in_band() {
    let (_resources, app) = test_app(
        MockLlm::failing_after(&["partial"], 1),
        MockRetriever::empty(),
    )
    .await;

    let response = AxumTestRequest::post("/chat/stream")
        .json(&turn_body(&Uuid::new_v4().to_string(), "hello"))
        .send(app)
        .await;

    // Headers are committed before the failure, so the status stays OK.
    assert_eq!(response.status(), StatusCode::OK);

    let events = response.sse_events();
    let terminal = events.last().unwrap();
    assert_eq!(terminal["is_final"], json!(true));
    assert!(terminal["error"].is_string());
}

#[tokio::test]
async fn test_chat_stream_validation_failure_is_http_error() {
    let (_resources, app) = test_app(MockLlm::replying(&["x"]), MockRetriever::empty()).await;

    let response = AxumTestRequest::post("/chat/stream")
        .json(&turn_body(&Uuid::new_v4().to_string(), ""))
        .send(app)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_session_endpoint() {
    let (_resources, app) = test_app(MockLlm::replying(&["x"]), MockRetriever::empty()).await;

    let response = AxumTestRequest::post("/chat/session").send(app).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.json();
    assert_eq!(body["success"], json!(true));
    let session_id = body["data"]["session_id"].as_str().unwrap();
    assert!(Uuid::parse_str(session_id).is_ok());
    assert!(body["data"]["created_at"].is_string());
}

#[tokio::test]
async fn test_history_of_unknown_chat_is_not_found() {
    let (_resources, app) = test_app(MockLlm::replying(&["x"]), MockRetriever::empty()).await;

    let response = AxumTestRequest::get("/chat/history?chat_id=missing")
        .send(app)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chatbot_registry_create_and_list() {
    let (_resources, app) = test_app(MockLlm::replying(&["x"]), MockRetriever::empty()).await;

    let response = AxumTestRequest::post("/chatbots")
        .json(&json!({ "name": "Support Bot" }))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let created = response.json();
    assert_eq!(created["data"]["name"], json!("Support Bot"));

    let response = AxumTestRequest::post("/chatbots")
        .json(&json!({ "name": "  " }))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = AxumTestRequest::get("/chatbots").send(app).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.json();
    assert_eq!(body["total"], json!(1));
    assert_eq!(body["data"][0]["name"], json!("Support Bot"));
}

#[tokio::test]
async fn test_query_endpoint_returns_ranked_results() {
    let (_resources, app) = test_app(
        MockLlm::replying(&["x"]),
        MockRetriever::with_documents(&[("a.md", "alpha"), ("b.md", "beta")]),
    )
    .await;
    let chatbot_id = Uuid::new_v4().to_string();

    let response =
        AxumTestRequest::get(&format!("/query?chatbot_id={chatbot_id}&query=alpha&limit=1"))
            .send(app.clone())
            .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.json();
    assert_eq!(body["data"]["total_results"], json!(1));
    assert_eq!(body["data"]["results"][0]["file_path"], json!("a.md"));

    let response = AxumTestRequest::get("/query?chatbot_id=&query=alpha")
        .send(app)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_query_failure_surfaces_as_service_unavailable() {
    let (_resources, app) = test_app(MockLlm::replying(&["x"]), MockRetriever::failing()).await;

    let response = AxumTestRequest::get(&format!(
        "/query?chatbot_id={}&query=alpha",
        Uuid::new_v4()
    ))
    .send(app)
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_health_endpoints() {
    let (_resources, app) = test_app(MockLlm::replying(&["x"]), MockRetriever::empty()).await;

    for path in ["/health", "/chat/health", "/query/health"] {
        let response = AxumTestRequest::get(path).send(app.clone()).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");

        let body = response.json();
        assert_eq!(body["status"], json!("ok"));
        assert!(body["message"].is_string());
        assert!(body["timestamp"].is_string());
    }
}
