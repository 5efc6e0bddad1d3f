// ABOUTME: Server binary wiring config, storage, AI capabilities, and routes together
// ABOUTME: Runs the axum application with request tracing and graceful shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! Gymkit server entry point.

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use gymkit::config::environment::ServerConfig;
use gymkit::database::Database;
use gymkit::llm::gemini::GeminiProvider;
use gymkit::llm::AiCapabilities;
use gymkit::resources::ServerResources;
use gymkit::routes;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "gymkit-server", about = "AI-assisted workout routine server")]
struct Args {
    /// Override the HTTP port from the environment
    #[arg(long)]
    port: Option<u16>,

    /// Override the database URL from the environment
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(url) = args.database_url {
        config.database.url = url;
    }

    gymkit::logging::init_from_env(&config.log_level)?;
    info!("{}", config.summary());

    let database = Database::new(&config.database.url)
        .await
        .context("failed to open database")?;

    let ai = match GeminiProvider::from_env() {
        Ok(provider) => {
            let provider = Arc::new(provider);
            AiCapabilities::new(Some(provider.clone()), Some(provider))
        }
        Err(e) => {
            warn!(error = %e, "AI generation disabled, serving reads and deletes only");
            AiCapabilities::disabled()
        }
    };

    let resources = Arc::new(ServerResources::new(database, ai));
    let app = routes::router(resources)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install ctrl-c handler");
        return;
    }
    info!("shutdown signal received");
}
