//! Data layer (profiles, recipes, favorites).
//!
//! The stores are traits so the hosted data API and the in-memory backend
//! are interchangeable behind `AppState`.

pub mod memory;
pub mod postgrest;

pub use memory::MemoryBackend;
pub use postgrest::PostgrestDb;

use crate::error::StoreError;
use crate::models::{
    CookingStep, Favorite, Ingredient, NewProfile, NewRecipe, Nutrition, Profile, ProfileUpdate,
    Recipe, RecipeSearch, Review, UserStats,
};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

pub type StoreResult<T> = Result<T, StoreError>;

/// Table names as constants.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const USER_STATS: &str = "user_stats";
    pub const RECIPES: &str = "recipes";
    pub const INGREDIENTS: &str = "ingredients";
    pub const COOKING_STEPS: &str = "cooking_steps";
    pub const NUTRITION: &str = "nutrition";
    pub const REVIEWS: &str = "reviews";
    pub const FAVORITES: &str = "favorites";
}

/// Profile rows and per-user stats.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn insert_profile(&self, profile: &NewProfile) -> StoreResult<Profile>;

    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>>;

    /// Returns `None` when no profile has this id.
    async fn update_profile(&self, id: &str, update: &ProfileUpdate)
        -> StoreResult<Option<Profile>>;

    async fn insert_user_stats(&self, stats: &UserStats) -> StoreResult<()>;

    async fn get_user_stats(&self, user_id: &str) -> StoreResult<Option<UserStats>>;
}

/// Recipes and their detail rows.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// All recipes, newest first.
    async fn list_recipes(&self) -> StoreResult<Vec<Recipe>>;

    /// Filtered recipes, newest first.
    async fn search_recipes(&self, search: &RecipeSearch) -> StoreResult<Vec<Recipe>>;

    async fn get_recipe(&self, id: &str) -> StoreResult<Option<Recipe>>;

    /// Ordered by `order_index`.
    async fn list_ingredients(&self, recipe_id: &str) -> StoreResult<Vec<Ingredient>>;

    /// Ordered by `step_number`.
    async fn list_steps(&self, recipe_id: &str) -> StoreResult<Vec<CookingStep>>;

    async fn get_nutrition(&self, recipe_id: &str) -> StoreResult<Option<Nutrition>>;

    /// Newest first, with the author's public profile embedded.
    async fn list_reviews(&self, recipe_id: &str) -> StoreResult<Vec<Review>>;

    async fn create_recipe(&self, recipe: &NewRecipe) -> StoreResult<Recipe>;
}

/// User favorites.
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Newest first, with the recipe embedded.
    async fn list_favorites(&self, user_id: &str) -> StoreResult<Vec<Favorite>>;

    /// Fails with [`StoreError::UNIQUE_VIOLATION`] if the pair exists.
    async fn add_favorite(&self, user_id: &str, recipe_id: &str) -> StoreResult<Favorite>;

    async fn remove_favorite(&self, user_id: &str, recipe_id: &str) -> StoreResult<()>;

    async fn count_favorites(&self, user_id: &str) -> StoreResult<u64>;
}

/// Run a store call with a deadline.
pub async fn bounded<T, F>(limit: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::new(
            StoreError::TIMEOUT,
            format!("store call exceeded {}ms", limit.as_millis()),
        )),
    }
}
