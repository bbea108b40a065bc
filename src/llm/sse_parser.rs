// ABOUTME: Line-buffering SSE parser for LLM streaming responses
// ABOUTME: Handles partial lines across TCP boundaries and multiple events per chunk
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

//! # SSE Stream Parser
//!
//! Server-sent-event framing for provider byte streams. TCP does not align
//! network chunks with SSE event boundaries, so a chunk may carry several
//! events or cut a JSON payload in half. The [`SseLineBuffer`] accumulates
//! bytes until complete lines are available and emits one event per
//! `data:` line; [`into_chat_stream`] wraps a raw byte stream with that
//! buffering and a provider-specific payload parser.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::mem;

use super::{ChatStream, StreamChunk};
use crate::errors::AppError;

/// A parsed SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload with the prefix stripped
    Data(String),
    /// The `[DONE]` termination signal
    Done,
}

/// Line-buffering SSE parser
///
/// Complete lines (terminated by `\n`) are parsed into events; a trailing
/// partial line stays buffered for the next [`SseLineBuffer::feed`] call.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: String,
}

impl SseLineBuffer {
    /// Create a new empty line buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes from a TCP chunk, returning any complete events
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));

        let mut events = Vec::new();
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line = self.buffer[..newline_pos].trim_end_matches('\r').to_owned();
            self.buffer = self.buffer[newline_pos + 1..].to_owned();

            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing partial line when the byte stream ends
    pub fn flush(&mut self) -> Option<SseEvent> {
        let remaining = mem::take(&mut self.buffer);
        parse_line(&remaining)
    }
}

/// Parse one SSE line into an event, ignoring separators and non-data fields
fn parse_line(line: &str) -> Option<SseEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "data: [DONE]" {
        return Some(SseEvent::Done);
    }
    // Non-data SSE fields (event:, id:, retry:, comments) are ignored.
    let data = trimmed.strip_prefix("data: ")?;
    if data.trim().is_empty() {
        None
    } else {
        Some(SseEvent::Data(data.to_owned()))
    }
}

/// Wrap a raw byte stream as a buffered [`ChatStream`]
///
/// `parse_data` converts one provider JSON payload into an optional
/// [`StreamChunk`]; return `None` to skip metadata-only events. A `[DONE]`
/// signal becomes an empty terminal chunk.
pub fn into_chat_stream<S, F>(
    byte_stream: S,
    parse_data: F,
    provider_name: &'static str,
) -> ChatStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    F: Fn(&str) -> Option<Result<StreamChunk, AppError>> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut parser = SseLineBuffer::new();
        let mut byte_stream = Box::pin(byte_stream);

        while let Some(result) = byte_stream.next().await {
            match result {
                Ok(bytes) => {
                    for event in parser.feed(&bytes) {
                        if let Some(item) = event_to_chunk(event, &parse_data) {
                            let is_err = item.is_err();
                            yield item;
                            if is_err {
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    yield Err(AppError::generation(format!(
                        "{provider_name} stream read error: {e}"
                    )));
                    return;
                }
            }
        }

        if let Some(event) = parser.flush() {
            if let Some(item) = event_to_chunk(event, &parse_data) {
                yield item;
            }
        }
    };

    // Empty deltas carry nothing for the consumer unless they are terminal.
    let filtered = stream.filter(|result| {
        futures_util::future::ready(
            result
                .as_ref()
                .map_or(true, |chunk| !chunk.delta.is_empty() || chunk.is_final),
        )
    });

    Box::pin(filtered)
}

fn event_to_chunk<F>(event: SseEvent, parse_data: &F) -> Option<Result<StreamChunk, AppError>>
where
    F: Fn(&str) -> Option<Result<StreamChunk, AppError>>,
{
    match event {
        SseEvent::Data(json_str) => parse_data(&json_str),
        SseEvent::Done => Some(Ok(StreamChunk {
            delta: String::new(),
            is_final: true,
            finish_reason: Some("stop".to_owned()),
        })),
    }
}
