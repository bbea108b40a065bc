// ABOUTME: Configuration management for the server
// ABOUTME: Environment-only configuration, no config files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

//! Server configuration loaded from environment variables

pub mod environment;

pub use environment::{LlmConfig, RetrievalConfig, ServerConfig};
