// ABOUTME: Chat turn domain: resolution, orchestration, and streaming events
// ABOUTME: Drives one user-bot exchange from request to persisted response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

//! # Chat Turn Domain
//!
//! One turn walks through: resolve the session/chat pair, reserve a
//! conversation row with the next sequence number, gather grounding context
//! (best-effort), generate a response, and finalize the row with the full
//! text. The [`TurnOrchestrator`] owns that state machine; the
//! [`SessionChatResolver`] handles the identifier resolution rules; the
//! stream types carry the emitted events of a streaming turn.

pub mod orchestrator;
pub mod resolver;
pub mod stream;

pub use orchestrator::{TurnOrchestrator, TurnOutcome, TurnRequest};
pub use resolver::SessionChatResolver;
pub use stream::{TurnEmitter, TurnEvent};
