// ABOUTME: Streaming turn events and the channel-backed emitter
// ABOUTME: Guarantees exactly one terminal event and tolerates consumer disconnects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

//! # Streaming Emitter
//!
//! A streaming turn produces an ordered sequence of [`TurnEvent`]s over a
//! one-way channel: zero or more text fragments followed by exactly one
//! terminal event (`is_final = true`). A generation failure is carried
//! in-band as an error-marked terminal event, never as a silent close.
//! The consumer dropping its end (client disconnect) does not interrupt
//! the producer: sends become no-ops and the turn runs to completion.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// One event of a streaming turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnEvent {
    /// Text fragment. Always empty on the terminal event: the full response
    /// is the concatenation of the non-terminal fragments, and consumers
    /// must not wait for content on the final event.
    pub text: String,
    /// Whether this is the last event of the turn
    pub is_final: bool,
    /// Session the turn ran under
    pub session_id: String,
    /// Chat the turn ran under
    pub chat_id: String,
    /// Reserved conversation row, present once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Error message, set only on a failed terminal event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Event producer for one streaming turn
///
/// Wraps the channel sender with the turn's resolved identifiers so every
/// event carries them. Exactly one of [`TurnEmitter::finish`] or
/// [`TurnEmitter::fail`] must be called, after which the emitter is consumed.
#[derive(Debug)]
pub struct TurnEmitter {
    sender: mpsc::Sender<TurnEvent>,
    session_id: String,
    chat_id: String,
    conversation_id: String,
}

impl TurnEmitter {
    /// Channel capacity for one streaming turn
    const CHANNEL_CAPACITY: usize = 64;

    /// Create an emitter and the receiver end for the consumer
    #[must_use]
    pub fn channel(
        session_id: String,
        chat_id: String,
        conversation_id: String,
    ) -> (Self, mpsc::Receiver<TurnEvent>) {
        let (sender, receiver) = mpsc::channel(Self::CHANNEL_CAPACITY);
        (
            Self {
                sender,
                session_id,
                chat_id,
                conversation_id,
            },
            receiver,
        )
    }

    /// Emit a non-terminal text fragment
    pub async fn fragment(&self, text: impl Into<String>) {
        self.send(TurnEvent {
            text: text.into(),
            is_final: false,
            session_id: self.session_id.clone(),
            chat_id: self.chat_id.clone(),
            conversation_id: Some(self.conversation_id.clone()),
            error: None,
        })
        .await;
    }

    /// Emit the successful terminal event and close the stream
    pub async fn finish(self) {
        self.send(TurnEvent {
            text: String::new(),
            is_final: true,
            session_id: self.session_id.clone(),
            chat_id: self.chat_id.clone(),
            conversation_id: Some(self.conversation_id.clone()),
            error: None,
        })
        .await;
    }

    /// Emit an error-carrying terminal event and close the stream
    pub async fn fail(self, message: impl Into<String>) {
        self.send(TurnEvent {
            text: String::new(),
            is_final: true,
            session_id: self.session_id.clone(),
            chat_id: self.chat_id.clone(),
            conversation_id: Some(self.conversation_id.clone()),
            error: Some(message.into()),
        })
        .await;
    }

    /// Send an event; a dropped receiver means the client disconnected and
    /// the event is discarded
    async fn send(&self, event: TurnEvent) {
        let _ = self.sender.send(event).await;
    }
}
