// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipe API Server
//!
//! Serves recipes, favorites and user profiles, with cookie-based
//! sessions backed by the platform's credential store.

use recipe_api::{
    config::{Config, StoreBackend},
    db::{FavoriteStore, MemoryBackend, PostgrestDb, ProfileStore, RecipeStore},
    services::{CredentialStore, GoTrueClient},
    AppState,
};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Stores = (
    Arc<dyn CredentialStore>,
    Arc<dyn ProfileStore>,
    Arc<dyn RecipeStore>,
    Arc<dyn FavoriteStore>,
);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        port = config.port,
        development = config.is_development(),
        origins = ?config.allowed_origins,
        "Starting Recipe API"
    );

    let (credentials, profiles, recipes, favorites) = connect_stores(&config)?;

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        credentials,
        profiles,
        recipes,
        favorites,
    ));

    // Build router
    let app = recipe_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Instantiate the configured backend for every store trait.
fn connect_stores(config: &Config) -> anyhow::Result<Stores> {
    match &config.backend {
        StoreBackend::Supabase { url, service_key } => {
            let auth = GoTrueClient::new(url, service_key.clone(), config.store_timeout)
                .context("Failed to build auth client")?;
            let db = Arc::new(PostgrestDb::new(
                url,
                service_key.clone(),
                config.store_timeout,
            )
            .context("Failed to build data API client")?);
            tracing::info!(url = %url, "Using hosted backend");
            let stores: Stores = (Arc::new(auth), db.clone(), db.clone(), db);
            Ok(stores)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory backend; data is lost on restart");
            let memory = Arc::new(MemoryBackend::new());
            let stores: Stores = (memory.clone(), memory.clone(), memory.clone(), memory);
            Ok(stores)
        }
    }
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("recipe_api=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
