// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PostgREST client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Profiles and user stats
//! - Recipes (with ingredients, steps, nutrition, reviews)
//! - Favorites

use crate::db::{tables, FavoriteStore, ProfileStore, RecipeStore, StoreResult};
use crate::error::StoreError;
use crate::models::{
    CookingStep, Favorite, Ingredient, NewProfile, NewRecipe, Nutrition, Profile, ProfileUpdate,
    Recipe, RecipeSearch, Review, UserStats,
};
use async_trait::async_trait;
use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

/// Postgres unique_violation.
const PG_UNIQUE_VIOLATION: &str = "23505";
/// PostgREST "no rows" on singular responses.
const PGRST_NO_ROWS: &str = "PGRST116";
/// Postgres invalid_text_representation, e.g. a malformed uuid key.
const PG_INVALID_TEXT: &str = "22P02";

type Filters = Vec<(&'static str, String)>;

/// Data API client.
#[derive(Clone)]
pub struct PostgrestDb {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl PostgrestDb {
    /// Create a client for `{platform_url}/rest/v1`.
    pub fn new(platform_url: &str, service_key: String, timeout: Duration) -> StoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::new(StoreError::TRANSPORT, e.to_string()))?;

        tracing::info!(url = platform_url, "Data API client initialized");

        Ok(Self {
            http,
            base_url: format!("{}/rest/v1", platform_url.trim_end_matches('/')),
            service_key,
        })
    }

    fn request(&self, method: Method, table: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.base_url, table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    /// `GET /{table}?{filters}`
    async fn select<T: DeserializeOwned>(&self, table: &str, filters: Filters) -> StoreResult<Vec<T>> {
        let response = self
            .request(Method::GET, table)
            .query(&filters)
            .send()
            .await
            .map_err(transport_error)?;

        check_response_json(response).await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        mut filters: Filters,
    ) -> StoreResult<Option<T>> {
        filters.push(("limit", "1".to_string()));
        match self.select::<T>(table, filters).await {
            Ok(rows) => Ok(rows.into_iter().next()),
            // A key that cannot exist is a miss, not a failure.
            Err(err) if err.is(StoreError::NOT_FOUND) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// `POST /{table}` returning the inserted row.
    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
    ) -> StoreResult<T> {
        let response = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await
            .map_err(transport_error)?;

        let rows: Vec<T> = check_response_json(response).await?;
        rows.into_iter().next().ok_or_else(|| {
            StoreError::new(StoreError::DECODE, format!("insert into {} returned no rows", table))
        })
    }

    async fn execute(&self, builder: reqwest::RequestBuilder) -> StoreResult<()> {
        let response = builder.send().await.map_err(transport_error)?;
        check_response(response).await
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// `*term*` as a double-quoted PostgREST value so reserved characters in
/// user input cannot break out of the `or=(...)` list.
fn ilike_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"*{}*\"", escaped)
}

fn search_filters(search: &RecipeSearch) -> Filters {
    let mut filters: Filters = vec![
        ("select", "*".to_string()),
        ("order", "created_at.desc".to_string()),
    ];

    if let Some(q) = search.text() {
        let pattern = ilike_pattern(q);
        filters.push((
            "or",
            format!("(title.ilike.{0},description.ilike.{0})", pattern),
        ));
    }
    if let Some(category) = search.category() {
        filters.push(("category", eq(category)));
    }
    if let Some(difficulty) = search.difficulty() {
        filters.push(("difficulty", eq(difficulty)));
    }

    filters
}

#[async_trait]
impl ProfileStore for PostgrestDb {
    async fn insert_profile(&self, profile: &NewProfile) -> StoreResult<Profile> {
        self.insert(tables::PROFILES, &[profile]).await
    }

    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        self.select_one(tables::PROFILES, vec![("select", "*".to_string()), ("id", eq(id))])
            .await
    }

    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<Profile>> {
        if update.is_empty() {
            return self.get_profile(id).await;
        }

        let response = self
            .request(Method::PATCH, tables::PROFILES)
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(update)
            .send()
            .await
            .map_err(transport_error)?;

        let rows: Vec<Profile> = check_response_json(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_user_stats(&self, stats: &UserStats) -> StoreResult<()> {
        self.execute(
            self.request(Method::POST, tables::USER_STATS)
                .header("Prefer", "return=minimal")
                .json(&[stats]),
        )
        .await
    }

    async fn get_user_stats(&self, user_id: &str) -> StoreResult<Option<UserStats>> {
        self.select_one(
            tables::USER_STATS,
            vec![("select", "*".to_string()), ("user_id", eq(user_id))],
        )
        .await
    }
}

#[async_trait]
impl RecipeStore for PostgrestDb {
    async fn list_recipes(&self) -> StoreResult<Vec<Recipe>> {
        self.select(
            tables::RECIPES,
            vec![
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn search_recipes(&self, search: &RecipeSearch) -> StoreResult<Vec<Recipe>> {
        self.select(tables::RECIPES, search_filters(search)).await
    }

    async fn get_recipe(&self, id: &str) -> StoreResult<Option<Recipe>> {
        self.select_one(tables::RECIPES, vec![("select", "*".to_string()), ("id", eq(id))])
            .await
    }

    async fn list_ingredients(&self, recipe_id: &str) -> StoreResult<Vec<Ingredient>> {
        self.select(
            tables::INGREDIENTS,
            vec![
                ("select", "*".to_string()),
                ("recipe_id", eq(recipe_id)),
                ("order", "order_index.asc".to_string()),
            ],
        )
        .await
    }

    async fn list_steps(&self, recipe_id: &str) -> StoreResult<Vec<CookingStep>> {
        self.select(
            tables::COOKING_STEPS,
            vec![
                ("select", "*".to_string()),
                ("recipe_id", eq(recipe_id)),
                ("order", "step_number.asc".to_string()),
            ],
        )
        .await
    }

    async fn get_nutrition(&self, recipe_id: &str) -> StoreResult<Option<Nutrition>> {
        self.select_one(
            tables::NUTRITION,
            vec![("select", "*".to_string()), ("recipe_id", eq(recipe_id))],
        )
        .await
    }

    async fn list_reviews(&self, recipe_id: &str) -> StoreResult<Vec<Review>> {
        self.select(
            tables::REVIEWS,
            vec![
                ("select", "*,profiles:user_id(full_name,avatar_url)".to_string()),
                ("recipe_id", eq(recipe_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn create_recipe(&self, recipe: &NewRecipe) -> StoreResult<Recipe> {
        self.insert(tables::RECIPES, &[recipe]).await
    }
}

#[derive(Serialize)]
struct NewFavorite<'a> {
    user_id: &'a str,
    recipe_id: &'a str,
}

#[async_trait]
impl FavoriteStore for PostgrestDb {
    async fn list_favorites(&self, user_id: &str) -> StoreResult<Vec<Favorite>> {
        self.select(
            tables::FAVORITES,
            vec![
                ("select", "*,recipes(*)".to_string()),
                ("user_id", eq(user_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn add_favorite(&self, user_id: &str, recipe_id: &str) -> StoreResult<Favorite> {
        self.insert(tables::FAVORITES, &[NewFavorite { user_id, recipe_id }])
            .await
    }

    async fn remove_favorite(&self, user_id: &str, recipe_id: &str) -> StoreResult<()> {
        self.execute(
            self.request(Method::DELETE, tables::FAVORITES)
                .query(&[("user_id", eq(user_id)), ("recipe_id", eq(recipe_id))]),
        )
        .await
    }

    async fn count_favorites(&self, user_id: &str) -> StoreResult<u64> {
        let response = self
            .request(Method::HEAD, tables::FAVORITES)
            .query(&[("select", "id".to_string()), ("user_id", eq(user_id))])
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(StoreError::new(
                format!("http_{}", response.status().as_u16()),
                "count request failed",
            ));
        }

        response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| StoreError::new(StoreError::DECODE, "missing Content-Range total"))
    }
}

/// Total from `Content-Range: 0-4/5` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

/// PostgREST error body.
#[derive(Debug, Default, Deserialize)]
struct PostgrestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn classify_error(status: u16, body: PostgrestErrorBody) -> StoreError {
    let message = body.message.unwrap_or_else(|| format!("HTTP {}", status));
    match body.code.as_deref() {
        Some(PG_UNIQUE_VIOLATION) => StoreError::new(StoreError::UNIQUE_VIOLATION, message),
        Some(PGRST_NO_ROWS | PG_INVALID_TEXT) => StoreError::new(StoreError::NOT_FOUND, message),
        Some(code) => StoreError::new(code, message),
        None => StoreError::new(format!("http_{}", status), message),
    }
}

async fn error_from(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str(&text).unwrap_or_else(|_| PostgrestErrorBody {
        code: None,
        message: Some(text),
    });
    classify_error(status, body)
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> StoreResult<()> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(error_from(response).await)
}

/// Check response and parse JSON body.
async fn check_response_json<T: DeserializeOwned>(response: reqwest::Response) -> StoreResult<T> {
    if !response.status().is_success() {
        return Err(error_from(response).await);
    }

    response
        .json()
        .await
        .map_err(|e| StoreError::new(StoreError::DECODE, format!("JSON parse error: {}", e)))
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::new(StoreError::TIMEOUT, err.to_string())
    } else {
        StoreError::new(StoreError::TRANSPORT, err.to_string())
    }
}
