// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favorite recipe routes. A user can only see and change their own list.

use crate::error::{AppError, Result, StoreError};
use crate::middleware::auth::AuthUser;
use crate::models::Favorite;
use crate::routes::extract::ValidJson;
use crate::routes::MessageResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/favorites", post(add_favorite))
        .route("/api/favorites/{user_id}", get(list_favorites))
        .route(
            "/api/favorites/{user_id}/{recipe_id}",
            delete(remove_favorite),
        )
}

/// Reject access to another user's favorites.
fn ensure_owner(user: &AuthUser, user_id: &str) -> Result<()> {
    if user.id == user_id {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %user.id,
            requested = %user_id,
            "Rejected access to another user's favorites"
        );
        Err(AppError::Forbidden)
    }
}

#[derive(Serialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<Favorite>,
}

async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<FavoritesResponse>> {
    ensure_owner(&user, &user_id)?;

    let favorites = state.bounded(state.favorites.list_favorites(&user_id)).await?;
    Ok(Json(FavoritesResponse { favorites }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddFavoriteRequest {
    #[validate(length(min = 1, max = 64))]
    pub recipe_id: String,
    /// Defaults to the signed-in user.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct FavoriteResponse {
    pub favorite: Favorite,
}

async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidJson(body): ValidJson<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<FavoriteResponse>)> {
    let user_id = body.user_id.as_deref().unwrap_or(&user.id);
    ensure_owner(&user, user_id)?;

    let favorite = state
        .bounded(state.favorites.add_favorite(user_id, &body.recipe_id))
        .await
        .map_err(|err| {
            if err.is(StoreError::UNIQUE_VIOLATION) {
                AppError::AlreadyFavorited
            } else {
                AppError::Store(err)
            }
        })?;

    tracing::info!(user_id = %user.id, recipe_id = %body.recipe_id, "Favorite added");

    Ok((StatusCode::CREATED, Json(FavoriteResponse { favorite })))
}

async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((user_id, recipe_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>> {
    ensure_owner(&user, &user_id)?;

    state
        .bounded(state.favorites.remove_favorite(&user_id, &recipe_id))
        .await?;

    Ok(MessageResponse::new("Removed from favorites"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> AuthUser {
        AuthUser {
            id: id.to_string(),
            email: format!("{id}@example.com"),
        }
    }

    #[test]
    fn test_ensure_owner() {
        assert!(ensure_owner(&user("u1"), "u1").is_ok());
        assert!(matches!(
            ensure_owner(&user("u1"), "u2"),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_add_favorite_user_id_is_optional() {
        let body: AddFavoriteRequest =
            serde_json::from_value(serde_json::json!({ "recipe_id": "r1" })).unwrap();
        assert_eq!(body.recipe_id, "r1");
        assert!(body.user_id.is_none());
    }
}
