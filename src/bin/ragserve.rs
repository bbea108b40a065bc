// ABOUTME: Server binary entry point
// ABOUTME: Wires config, database, retrieval, and generation into the HTTP server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

#![deny(unsafe_code)]

//! Ragserve server binary
//!
//! Loads configuration from the environment, connects the database and
//! external collaborators, and serves the HTTP API. A missing Gemini API
//! key or unreachable Elasticsearch cluster degrades the relevant feature
//! instead of preventing startup, so history reads stay available.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use ragserve::{
    config::ServerConfig,
    database::Database,
    llm::GeminiProvider,
    logging,
    resources::ServerResources,
    retrieval::{ContextAssembler, ElasticsearchRetriever},
    routes,
};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "ragserve", about = "Retrieval-augmented chat backend")]
struct Args {
    /// HTTP port to listen on (overrides HTTP_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env().context("Failed to initialize logging")?;

    let mut config = ServerConfig::from_env().context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    info!("Configuration: {}", config.summary());

    let database = Arc::new(
        Database::new(&config.database_url)
            .await
            .context("Failed to initialize database")?,
    );

    let retriever = Arc::new(ElasticsearchRetriever::new(
        config.retrieval.elasticsearch_url.clone(),
    ));
    match retriever.ping().await {
        Ok(()) => info!("Elasticsearch reachable"),
        Err(e) => warn!(error = %e, "Elasticsearch unreachable, turns will run without context"),
    }

    let llm = match config.llm.api_key.clone() {
        Some(api_key) => GeminiProvider::new(api_key),
        None => {
            warn!("GEMINI_API_KEY not set, generation requests will fail");
            GeminiProvider::new(String::new())
        }
    }
    .with_default_model(config.llm.model.clone());

    let http_port = config.http_port;
    let resources = Arc::new(ServerResources::new(
        database,
        retriever,
        Arc::new(llm),
        config,
    ));

    let app = routes::router(resources)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", http_port))
        .await
        .with_context(|| format!("Failed to bind port {http_port}"))?;
    info!("Listening on http://0.0.0.0:{http_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

/// Resolve when the process receives a shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
