// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: In-memory database setup plus scripted LLM and retrieval mocks

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

//! Shared test utilities for `ragserve` integration tests.

use std::sync::{Arc, Once};

use async_trait::async_trait;

use ragserve::{
    config::{LlmConfig, RetrievalConfig, ServerConfig},
    database::Database,
    errors::{AppError, AppResult},
    llm::{ChatRequest, ChatResponse, ChatStream, LlmProvider, StreamChunk},
    resources::ServerResources,
    retrieval::{ContextAssembler, RetrievedChunk},
};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard in-memory test database
pub async fn create_test_database() -> Arc<Database> {
    init_test_logging();
    Arc::new(
        Database::new("sqlite::memory:")
            .await
            .expect("Failed to create test database"),
    )
}

/// Configuration used by tests
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        database_url: "sqlite::memory:".to_owned(),
        retrieval: RetrievalConfig {
            elasticsearch_url: "http://localhost:9200".to_owned(),
            context_limit: 5,
        },
        llm: LlmConfig {
            api_key: None,
            model: "mock-model".to_owned(),
        },
    }
}

/// Build server resources over a fresh in-memory database and the given mocks
pub async fn create_test_resources(
    llm: Arc<dyn LlmProvider>,
    retriever: Arc<dyn ContextAssembler>,
) -> Arc<ServerResources> {
    let database = create_test_database().await;
    Arc::new(ServerResources::new(database, retriever, llm, test_config()))
}

// ============================================================================
// Mock LLM
// ============================================================================

/// Scripted generation backend
///
/// Streams the configured fragments in order, then a terminal chunk. When
/// `fail_after` is set, the stream yields that many fragments and then an
/// error instead of completing.
pub struct MockLlm {
    fragments: Vec<String>,
    fail: bool,
    fail_after: Option<usize>,
}

impl MockLlm {
    /// Succeeds, producing the given fragments
    pub fn replying(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|s| (*s).to_owned()).collect(),
            fail: false,
            fail_after: None,
        }
    }

    /// Fails immediately on any generation call
    pub fn failing() -> Self {
        Self {
            fragments: Vec::new(),
            fail: true,
            fail_after: None,
        }
    }

    /// Streams `count` fragments and then fails mid-stream
    pub fn failing_after(fragments: &[&str], count: usize) -> Self {
        Self {
            fragments: fragments.iter().map(|s| (*s).to_owned()).collect(),
            fail: false,
            fail_after: Some(count),
        }
    }

    fn full_text(&self) -> String {
        self.fragments.concat()
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        if self.fail {
            return Err(AppError::generation("mock generation failure"));
        }
        Ok(ChatResponse {
            content: self.full_text(),
            model: "mock-model".to_owned(),
            finish_reason: Some("stop".to_owned()),
        })
    }

    async fn complete_stream(&self, _request: &ChatRequest) -> Result<ChatStream, AppError> {
        if self.fail {
            return Err(AppError::generation("mock generation failure"));
        }

        let mut items: Vec<Result<StreamChunk, AppError>> = Vec::new();
        let emit = self.fail_after.unwrap_or(self.fragments.len());

        for fragment in self.fragments.iter().take(emit) {
            items.push(Ok(StreamChunk {
                delta: fragment.clone(),
                is_final: false,
                finish_reason: None,
            }));
        }

        if self.fail_after.is_some() {
            items.push(Err(AppError::generation("mock mid-stream failure")));
        } else {
            items.push(Ok(StreamChunk {
                delta: String::new(),
                is_final: true,
                finish_reason: Some("stop".to_owned()),
            }));
        }

        Ok(Box::pin(tokio_stream::iter(items)))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(!self.fail)
    }
}

// ============================================================================
// Mock Retriever
// ============================================================================

/// Scripted retrieval backend
pub struct MockRetriever {
    chunks: Vec<RetrievedChunk>,
    fail: bool,
}

impl MockRetriever {
    /// Returns the given `(file_path, text)` pairs with descending scores
    pub fn with_documents(documents: &[(&str, &str)]) -> Self {
        let chunks = documents
            .iter()
            .enumerate()
            .map(|(i, (file_path, text))| RetrievedChunk {
                file_path: (*file_path).to_owned(),
                text: (*text).to_owned(),
                score: 10.0 - i as f32,
            })
            .collect();
        Self {
            chunks,
            fail: false,
        }
    }

    /// Returns no documents
    pub fn empty() -> Self {
        Self {
            chunks: Vec::new(),
            fail: false,
        }
    }

    /// Fails every retrieval call
    pub fn failing() -> Self {
        Self {
            chunks: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl ContextAssembler for MockRetriever {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn gather(
        &self,
        _chatbot_id: &str,
        _query: &str,
        limit: usize,
    ) -> AppResult<Vec<RetrievedChunk>> {
        if self.fail {
            return Err(AppError::retrieval_unavailable("mock retrieval failure"));
        }
        Ok(self.chunks.iter().take(limit).cloned().collect())
    }

    async fn ping(&self) -> AppResult<()> {
        if self.fail {
            return Err(AppError::retrieval_unavailable("mock retrieval failure"));
        }
        Ok(())
    }
}
