// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Profile, ProfileUpdate};
use crate::routes::extract::ValidJson;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Profile routes for the signed-in user (auth applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/users/me", get(get_me).put(update_me))
}

/// Public profile lookup.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/users/{id}", get(get_profile))
}

// ─── Current User ────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProfileStats {
    pub recipes_cooked: u32,
    pub total_cooking_time: u32,
    pub reviews_written: u32,
    pub favorite_recipes: u64,
    pub recipes_saved: u64,
}

#[derive(Serialize)]
pub struct MeProfile {
    pub id: String,
    pub email: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub skill_level: Option<String>,
    pub dietary_restrictions: Vec<String>,
    pub created_at: Option<String>,
    pub stats: ProfileStats,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub profile: MeProfile,
}

/// Get the current user's profile with stats.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let (profile, stats, favorites) = tokio::join!(
        state.bounded(state.profiles.get_profile(&user.id)),
        state.bounded(state.profiles.get_user_stats(&user.id)),
        state.bounded(state.favorites.count_favorites(&user.id)),
    );

    let profile =
        profile?.ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user.id)))?;

    let stats = stats.unwrap_or_else(|err| {
        tracing::warn!(user_id = %user.id, error = %err, "Failed to load user stats");
        None
    });
    let favorites = favorites.unwrap_or_else(|err| {
        tracing::warn!(user_id = %user.id, error = %err, "Failed to count favorites");
        0
    });

    let stats = stats.unwrap_or_default();

    Ok(Json(MeResponse {
        profile: MeProfile {
            id: profile.id,
            email: user.email,
            username: profile.username,
            full_name: profile.full_name,
            avatar_url: profile.avatar_url,
            bio: profile.bio,
            skill_level: profile.skill_level,
            dietary_restrictions: profile.dietary_restrictions.unwrap_or_default(),
            created_at: profile.created_at,
            stats: ProfileStats {
                recipes_cooked: stats.recipes_cooked,
                total_cooking_time: stats.total_cooking_time,
                reviews_written: stats.reviews_written,
                favorite_recipes: favorites,
                recipes_saved: favorites,
            },
        },
    }))
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub profile: Profile,
}

/// Update the current user's profile.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidJson(update): ValidJson<ProfileUpdate>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .bounded(state.profiles.update_profile(&user.id, &update))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user.id)))?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(ProfileResponse { profile }))
}

// ─── Public Profiles ─────────────────────────────────────────

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .bounded(state.profiles.get_profile(&id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))?;

    Ok(Json(ProfileResponse { profile }))
}
