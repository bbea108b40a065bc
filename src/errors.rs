// ABOUTME: Unified error handling with standard error codes and HTTP envelopes
// ABOUTME: Maps domain errors (validation, not-found, conflict, generation) to responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

//! # Unified Error Handling
//!
//! Central error type for the server. Every fallible operation returns
//! [`AppResult`]; route handlers convert [`AppError`] into the standard
//! `{ success: false, message }` envelope via `IntoResponse`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Missing or empty required request field
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    /// Required field absent from the request
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField,
    /// Referenced session/chat/chatbot does not exist or is soft-deleted
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound,
    /// Supplied identifiers disagree (chat belongs to a different session),
    /// or a sequence-number race lost after retries were exhausted
    #[serde(rename = "RESOURCE_CONFLICT")]
    ResourceConflict,
    /// Context retrieval collaborator failed; absorbed internally, the turn
    /// proceeds with empty context
    #[serde(rename = "RETRIEVAL_UNAVAILABLE")]
    RetrievalUnavailable,
    /// Generation collaborator failed or timed out; fatal to the turn
    #[serde(rename = "GENERATION_FAILED")]
    GenerationFailed,
    /// Database operation failed
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    /// Required configuration is missing or invalid
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError,
    /// Unclassified internal error
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidInput | Self::MissingRequiredField => StatusCode::BAD_REQUEST,
            Self::ResourceNotFound => StatusCode::NOT_FOUND,
            Self::ResourceConflict => StatusCode::CONFLICT,
            Self::RetrievalUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::GenerationFailed
            | Self::DatabaseError
            | Self::ConfigError
            | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ResourceConflict => "The request conflicts with existing state",
            Self::RetrievalUnavailable => "Context retrieval is temporarily unavailable",
            Self::GenerationFailed => "Response generation failed",
            Self::DatabaseError => "Database operation failed",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal server error occurred",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a source error for chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Invalid input (empty or malformed request field)
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Missing required field
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("Required field '{field}' is missing or empty"),
        )
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Conflicting identifiers or lost sequence race
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceConflict, message)
    }

    /// Retrieval collaborator failure (absorbed by the orchestrator)
    pub fn retrieval_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RetrievalUnavailable, message)
    }

    /// Generation collaborator failure (fatal to the turn)
    pub fn generation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GenerationFailed, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let body = Json(json!({
            "success": false,
            "message": self.message,
            "code": self.code,
        }));
        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}
