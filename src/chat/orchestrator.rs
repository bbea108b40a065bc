// ABOUTME: Turn orchestrator driving one exchange from request to persisted response
// ABOUTME: Reserve, gather context, generate, finalize; retrieval failures degrade
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

//! # Turn Orchestrator
//!
//! The per-turn state machine: validate the request, resolve the session
//! and chat, reserve a conversation row with the next sequence number,
//! gather grounding context, generate a response, and finalize the row with
//! the full text in a single write.
//!
//! Failure policy: validation, resolution, and reservation errors surface
//! immediately with no partial state beyond the reservation itself; a
//! retrieval failure is absorbed and the turn proceeds with empty context;
//! a generation failure aborts the turn and leaves the reserved row with a
//! null `bot_response`.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

use super::resolver::SessionChatResolver;
use super::stream::{TurnEmitter, TurnEvent};
use crate::database::ConversationStore;
use crate::errors::{AppError, AppResult};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::models::ConversationRecord;
use crate::retrieval::{ContextAssembler, RetrievedChunk};

/// Prior turns of the chat included as conversational memory
const HISTORY_WINDOW: i64 = 5;

/// A validated inbound turn request
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Chatbot whose document index grounds the turn
    pub chatbot_id: String,
    /// User query text
    pub query: String,
    /// Existing session to run under, if any
    pub session_id: Option<String>,
    /// Existing chat to run under, if any
    pub chat_id: Option<String>,
}

/// Result of a completed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Session the turn ran under
    pub session_id: String,
    /// Chat the turn ran under
    pub chat_id: String,
    /// Finalized conversation row
    pub conversation_id: String,
    /// The user query as persisted
    pub user_query: String,
    /// Full generated response text
    pub bot_response: String,
    /// Source files of the context chunks that grounded the response
    pub context_used: Vec<String>,
}

/// A turn that has been reserved and context-gathered, ready to generate
struct PreparedTurn {
    session_id: String,
    chat_id: String,
    conversation: ConversationRecord,
    chat_request: ChatRequest,
    context_used: Vec<String>,
}

/// Drives the lifecycle of one chat turn
pub struct TurnOrchestrator {
    store: ConversationStore,
    resolver: SessionChatResolver,
    retriever: Arc<dyn ContextAssembler>,
    llm: Arc<dyn LlmProvider>,
    context_limit: usize,
}

impl TurnOrchestrator {
    /// Create an orchestrator over the given collaborators
    #[must_use]
    pub fn new(
        store: ConversationStore,
        retriever: Arc<dyn ContextAssembler>,
        llm: Arc<dyn LlmProvider>,
        context_limit: usize,
    ) -> Self {
        Self {
            resolver: SessionChatResolver::new(store.clone()),
            store,
            retriever,
            llm,
            context_limit,
        }
    }

    /// Run a single-shot turn to completion
    ///
    /// # Errors
    ///
    /// Returns validation, not-found, or conflict errors before any
    /// generation starts; a generation failure leaves the reserved
    /// conversation row with a null `bot_response` and surfaces the error.
    pub async fn run(&self, request: TurnRequest) -> AppResult<TurnOutcome> {
        let prepared = self.prepare(request).await?;

        let response = match self.llm.complete(&prepared.chat_request).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    conversation_id = %prepared.conversation.id,
                    error = %e,
                    "Generation failed, aborting turn"
                );
                return Err(e);
            }
        };

        let finalized = self
            .store
            .finalize_conversation(&prepared.conversation.id, &response.content)
            .await?;

        info!(
            conversation_id = %finalized.id,
            sequence_number = finalized.sequence_number,
            "Turn completed"
        );

        Ok(TurnOutcome {
            session_id: prepared.session_id,
            chat_id: prepared.chat_id,
            conversation_id: finalized.id,
            user_query: finalized.user_query,
            bot_response: response.content,
            context_used: prepared.context_used,
        })
    }

    /// Start a streaming turn, returning the event receiver
    ///
    /// Validation, resolution, and reservation run before this returns, so
    /// a failure there surfaces as an error with no events ever emitted.
    /// Generation runs on a detached task: the turn is finalized even if
    /// the receiver is dropped mid-stream.
    ///
    /// # Errors
    ///
    /// Returns validation, not-found, or conflict errors from the
    /// preparation phase.
    pub async fn run_stream(
        self: Arc<Self>,
        request: TurnRequest,
    ) -> AppResult<mpsc::Receiver<TurnEvent>> {
        let prepared = self.prepare(request).await?;

        let (emitter, receiver) = TurnEmitter::channel(
            prepared.session_id.clone(),
            prepared.chat_id.clone(),
            prepared.conversation.id.clone(),
        );

        tokio::spawn(async move {
            self.generate_streaming(prepared, emitter).await;
        });

        Ok(receiver)
    }

    /// Validate, resolve, reserve, and gather context for a turn
    async fn prepare(&self, request: TurnRequest) -> AppResult<PreparedTurn> {
        Self::validate(&request)?;

        let target = self
            .resolver
            .resolve(request.session_id.as_deref(), request.chat_id.as_deref())
            .await?;

        let conversation = self
            .store
            .reserve_conversation(&target.session_id, &target.chat_id, &request.query)
            .await?;

        let chunks = self.gather_context(&request.chatbot_id, &request.query).await;
        let context_used = chunks.iter().map(|c| c.file_path.clone()).collect();

        let history = self.gather_history(&target.chat_id, &conversation.id).await?;
        let chat_request = Self::build_chat_request(&request.query, &history, &chunks);

        Ok(PreparedTurn {
            session_id: target.session_id,
            chat_id: target.chat_id,
            conversation,
            chat_request,
            context_used,
        })
    }

    /// Streaming generation phase: emit fragments, finalize, send terminal
    async fn generate_streaming(&self, prepared: PreparedTurn, emitter: TurnEmitter) {
        let conversation_id = prepared.conversation.id.clone();

        let mut stream = match self.llm.complete_stream(&prepared.chat_request).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(%conversation_id, error = %e, "Failed to start generation stream");
                emitter.fail(e.to_string()).await;
                return;
            }
        };

        let mut accumulated = String::new();

        while let Some(result) = stream.next().await {
            match result {
                Ok(chunk) => {
                    if !chunk.delta.is_empty() {
                        accumulated.push_str(&chunk.delta);
                        emitter.fragment(chunk.delta).await;
                    }
                    if chunk.is_final {
                        break;
                    }
                }
                Err(e) => {
                    // Partial text is discarded; the row keeps its null
                    // bot_response like any other aborted turn.
                    error!(%conversation_id, error = %e, "Generation failed mid-stream");
                    emitter.fail(e.to_string()).await;
                    return;
                }
            }
        }

        match self
            .store
            .finalize_conversation(&conversation_id, &accumulated)
            .await
        {
            Ok(finalized) => {
                info!(
                    %conversation_id,
                    sequence_number = finalized.sequence_number,
                    "Streaming turn completed"
                );
                emitter.finish().await;
            }
            Err(e) => {
                error!(%conversation_id, error = %e, "Failed to finalize streaming turn");
                emitter.fail(e.to_string()).await;
            }
        }
    }

    /// Validate the inbound request fields
    ///
    /// `chatbot_id` is an opaque identifier here: it only selects a document
    /// index, so any non-empty value is accepted.
    fn validate(request: &TurnRequest) -> AppResult<()> {
        if request.chatbot_id.trim().is_empty() {
            return Err(AppError::missing_field("chatbot_id"));
        }
        if request.query.trim().is_empty() {
            return Err(AppError::missing_field("query"));
        }
        Ok(())
    }

    /// Best-effort context retrieval; failures degrade to empty context
    async fn gather_context(&self, chatbot_id: &str, query: &str) -> Vec<RetrievedChunk> {
        match self
            .retriever
            .gather(chatbot_id, query, self.context_limit)
            .await
        {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(chatbot_id, error = %e, "Retrieval unavailable, proceeding with empty context");
                Vec::new()
            }
        }
    }

    /// Prior completed turns of the chat, excluding the current reservation
    async fn gather_history(
        &self,
        chat_id: &str,
        current_conversation_id: &str,
    ) -> AppResult<Vec<ConversationRecord>> {
        let recent = self
            .store
            .list_recent_conversations(chat_id, HISTORY_WINDOW + 1)
            .await?;

        let mut history: Vec<ConversationRecord> = recent
            .into_iter()
            .filter(|c| c.id != current_conversation_id)
            .collect();
        history.truncate(usize::try_from(HISTORY_WINDOW).unwrap_or(usize::MAX));
        Ok(history)
    }

    /// Assemble the generation request from query, history, and context
    fn build_chat_request(
        query: &str,
        history: &[ConversationRecord],
        chunks: &[RetrievedChunk],
    ) -> ChatRequest {
        let documents = chunks
            .iter()
            .map(|chunk| format!("Document: {}\nContent: {}", chunk.file_path, chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n");

        let conversation_history = history
            .iter()
            .map(|conv| {
                format!(
                    "User: {}\nBot: {}",
                    conv.user_query,
                    conv.bot_response.as_deref().unwrap_or("")
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let context = if conversation_history.is_empty() {
            format!("Relevant documents:\n{documents}")
        } else {
            format!(
                "Previous conversation:\n{conversation_history}\n\nRelevant documents:\n{documents}"
            )
        };

        ChatRequest::new(vec![
            ChatMessage::system(
                "You are a helpful AI assistant. Based on the following context, \
                 please answer the user's question. If the context doesn't contain \
                 enough information to answer the question, please say so.",
            ),
            ChatMessage::user(format!("Context:\n{context}\n\nUser Question: {query}")),
        ])
    }
}
