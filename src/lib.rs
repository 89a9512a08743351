// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipe API: recipes, favorites, user profiles and cookie sessions
//!
//! This crate provides a thin HTTP layer over a backend-as-a-service
//! platform. Authentication is delegated to the platform's credential
//! store; profiles, recipes and favorites live in its data API.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::{FavoriteStore, ProfileStore, RecipeStore};
use error::StoreError;
use services::{CredentialStore, SessionManager};
use std::future::Future;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sessions: SessionManager,
    pub profiles: Arc<dyn ProfileStore>,
    pub recipes: Arc<dyn RecipeStore>,
    pub favorites: Arc<dyn FavoriteStore>,
}

impl AppState {
    /// Wire the stores together. The credential and profile stores are
    /// shared with the session manager.
    pub fn new(
        config: Config,
        credentials: Arc<dyn CredentialStore>,
        profiles: Arc<dyn ProfileStore>,
        recipes: Arc<dyn RecipeStore>,
        favorites: Arc<dyn FavoriteStore>,
    ) -> Self {
        let sessions = SessionManager::new(
            credentials,
            profiles.clone(),
            config.cookie_policy(),
            config.store_timeout,
        );

        Self {
            config,
            sessions,
            profiles,
            recipes,
            favorites,
        }
    }

    /// Run a store call under the configured deadline.
    pub async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        db::bounded(self.config.store_timeout, call).await
    }
}
