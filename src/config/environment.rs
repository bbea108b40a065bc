// ABOUTME: Environment-based server configuration with sensible defaults
// ABOUTME: Covers HTTP port, database URL, retrieval endpoint, and LLM settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

//! # Environment Configuration
//!
//! All runtime configuration comes from environment variables; there is no
//! configuration file. Every variable has a development-friendly default
//! except the LLM API key, which is validated lazily when the provider is
//! constructed (the server can start and serve history reads without it).

use crate::errors::{AppError, AppResult};
use std::env;

/// Default HTTP port
const DEFAULT_HTTP_PORT: u16 = 8000;

/// Default SQLite database location
const DEFAULT_DATABASE_URL: &str = "sqlite:data/ragserve.db";

/// Default Elasticsearch endpoint
const DEFAULT_ELASTICSEARCH_URL: &str = "http://localhost:9200";

/// Default generation model
const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash";

/// Retrieval collaborator configuration
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Base URL of the Elasticsearch cluster
    pub elasticsearch_url: String,
    /// Number of document fragments fetched per turn
    pub context_limit: usize,
}

/// Generation collaborator configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Gemini API key (`GEMINI_API_KEY`), absent until the provider needs it
    pub api_key: Option<String>,
    /// Model identifier (`RAGSERVE_LLM_MODEL`)
    pub model: String,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database connection URL
    pub database_url: String,
    /// Retrieval settings
    pub retrieval: RetrievalConfig,
    /// LLM settings
    pub llm: LlmConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `HTTP_PORT` is set but not a valid port number.
    pub fn from_env() -> AppResult<Self> {
        let http_port = match env::var("HTTP_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|e| AppError::config(format!("Invalid HTTP_PORT '{value}': {e}")))?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        let context_limit = match env::var("RAGSERVE_CONTEXT_LIMIT") {
            Ok(value) => value.parse::<usize>().map_err(|e| {
                AppError::config(format!("Invalid RAGSERVE_CONTEXT_LIMIT '{value}': {e}"))
            })?,
            Err(_) => 5,
        };

        Ok(Self {
            http_port,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned()),
            retrieval: RetrievalConfig {
                elasticsearch_url: env::var("ELASTICSEARCH_URL")
                    .unwrap_or_else(|_| DEFAULT_ELASTICSEARCH_URL.to_owned()),
                context_limit,
            },
            llm: LlmConfig {
                api_key: env::var("GEMINI_API_KEY").ok(),
                model: env::var("RAGSERVE_LLM_MODEL")
                    .unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_owned()),
            },
        })
    }

    /// One-line configuration summary with secrets redacted
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "http_port={} database={} elasticsearch={} model={} api_key={}",
            self.http_port,
            self.database_url,
            self.retrieval.elasticsearch_url,
            self.llm.model,
            if self.llm.api_key.is_some() {
                "[set]"
            } else {
                "[missing]"
            }
        )
    }
}
