// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipe browsing and authoring routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{NewRecipe, Recipe, RecipeDetail, RecipeSearch};
use crate::routes::extract::ValidJson;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Read-only recipe routes.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/recipes", get(list_recipes))
        .route("/api/recipes/search", get(search_recipes))
        .route("/api/recipes/{id}", get(get_recipe))
}

/// Authoring routes (auth applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/recipes", post(create_recipe))
}

#[derive(Serialize)]
pub struct RecipesResponse {
    pub recipes: Vec<Recipe>,
}

async fn list_recipes(State(state): State<Arc<AppState>>) -> Result<Json<RecipesResponse>> {
    let recipes = state.bounded(state.recipes.list_recipes()).await?;
    Ok(Json(RecipesResponse { recipes }))
}

/// Search by text, category and difficulty. `all` disables a filter.
async fn search_recipes(
    State(state): State<Arc<AppState>>,
    Query(search): Query<RecipeSearch>,
) -> Result<Json<RecipesResponse>> {
    let recipes = state.bounded(state.recipes.search_recipes(&search)).await?;

    tracing::debug!(
        q = ?search.text(),
        category = ?search.category(),
        difficulty = ?search.difficulty(),
        count = recipes.len(),
        "Recipe search"
    );

    Ok(Json(RecipesResponse { recipes }))
}

#[derive(Serialize)]
pub struct RecipeDetailResponse {
    pub recipe: RecipeDetail,
}

/// Recipe with ingredients, steps, nutrition and reviews.
///
/// Ingredients and steps are required; nutrition and reviews degrade to
/// empty when their lookups fail.
async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RecipeDetailResponse>> {
    let store = &state.recipes;
    let (recipe, ingredients, steps, nutrition, reviews) = tokio::join!(
        state.bounded(store.get_recipe(&id)),
        state.bounded(store.list_ingredients(&id)),
        state.bounded(store.list_steps(&id)),
        state.bounded(store.get_nutrition(&id)),
        state.bounded(store.list_reviews(&id)),
    );

    let recipe = recipe?.ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", id)))?;
    let ingredients = ingredients?;
    let steps = steps?;

    let nutrition = nutrition.unwrap_or_else(|err| {
        tracing::warn!(recipe_id = %id, error = %err, "Failed to load nutrition");
        None
    });
    let reviews = reviews.unwrap_or_else(|err| {
        tracing::warn!(recipe_id = %id, error = %err, "Failed to load reviews");
        Vec::new()
    });

    Ok(Json(RecipeDetailResponse {
        recipe: RecipeDetail {
            recipe,
            ingredients,
            steps,
            nutrition,
            reviews,
        },
    }))
}

#[derive(Serialize)]
pub struct RecipeResponse {
    pub recipe: Recipe,
}

async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidJson(mut recipe): ValidJson<NewRecipe>,
) -> Result<(StatusCode, Json<RecipeResponse>)> {
    recipe.author_id = Some(user.id.clone());

    let recipe = state.bounded(state.recipes.create_recipe(&recipe)).await?;

    tracing::info!(user_id = %user.id, recipe_id = %recipe.id, "Recipe created");

    Ok((StatusCode::CREATED, Json(RecipeResponse { recipe })))
}
