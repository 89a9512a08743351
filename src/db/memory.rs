// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process backend implementing every store trait.
//!
//! Mirrors the platform's observable behavior (unique emails, refresh
//! token rotation, unique favorites) so the router can run without the
//! hosted service. Used by the test suite and `STORE_BACKEND=memory`.

use crate::db::{FavoriteStore, ProfileStore, RecipeStore, StoreResult};
use crate::error::StoreError;
use crate::models::{
    CookingStep, Favorite, Identity, Ingredient, NewProfile, NewRecipe, Nutrition, Profile,
    ProfileUpdate, Recipe, RecipeSearch, Review, Session, UserStats,
};
use crate::services::credentials::{CredentialStore, IdentityMetadata};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

struct Account {
    identity: Identity,
    password: String,
}

/// All the platform's state, keyed the way the platform keys it.
#[derive(Default)]
pub struct MemoryBackend {
    accounts: DashMap<String, Account>,
    ids_by_email: DashMap<String, String>,
    /// access token -> (identity id, refresh token)
    access_tokens: DashMap<String, (String, String)>,
    /// refresh token -> (identity id, access token)
    refresh_tokens: DashMap<String, (String, String)>,
    profiles: DashMap<String, Profile>,
    user_stats: DashMap<String, UserStats>,
    recipes: DashMap<String, Recipe>,
    ingredients: DashMap<String, Vec<Ingredient>>,
    steps: DashMap<String, Vec<CookingStep>>,
    nutrition: DashMap<String, Nutrition>,
    reviews: DashMap<String, Vec<Review>>,
    favorites: DashMap<(String, String), Favorite>,
    fail_profile_inserts: AtomicBool,
    profile_updates: AtomicUsize,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent profile insert fail.
    pub fn fail_profile_inserts(&self, fail: bool) {
        self.fail_profile_inserts.store(fail, Ordering::SeqCst);
    }

    /// Number of profile updates that reached the store.
    pub fn profile_update_count(&self) -> usize {
        self.profile_updates.load(Ordering::SeqCst)
    }

    pub fn identity_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn has_identity(&self, email: &str) -> bool {
        self.ids_by_email.contains_key(&normalize_email(email))
    }

    /// Seed a recipe with its detail rows.
    pub fn insert_recipe(
        &self,
        recipe: Recipe,
        ingredients: Vec<Ingredient>,
        steps: Vec<CookingStep>,
        nutrition: Option<Nutrition>,
        reviews: Vec<Review>,
    ) {
        let id = recipe.id.clone();
        self.ingredients.insert(id.clone(), ingredients);
        self.steps.insert(id.clone(), steps);
        if let Some(nutrition) = nutrition {
            self.nutrition.insert(id.clone(), nutrition);
        }
        self.reviews.insert(id.clone(), reviews);
        self.recipes.insert(id, recipe);
    }

    fn issue_session(&self, identity: Identity) -> Session {
        let access_token = format!("at-{}", Uuid::new_v4().simple());
        let refresh_token = format!("rt-{}", Uuid::new_v4().simple());

        self.access_tokens.insert(
            access_token.clone(),
            (identity.id.clone(), refresh_token.clone()),
        );
        self.refresh_tokens.insert(
            refresh_token.clone(),
            (identity.id.clone(), access_token.clone()),
        );

        Session {
            access_token,
            refresh_token,
            identity,
        }
    }

    fn identity(&self, id: &str) -> Option<Identity> {
        self.accounts.get(id).map(|a| a.identity.clone())
    }

    fn sorted_newest_first(mut recipes: Vec<Recipe>) -> Vec<Recipe> {
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recipes
    }
}

#[async_trait]
impl CredentialStore for MemoryBackend {
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        _metadata: &IdentityMetadata,
    ) -> StoreResult<Identity> {
        let email = normalize_email(email);

        let id = match self.ids_by_email.entry(email.clone()) {
            Entry::Occupied(_) => {
                return Err(StoreError::new(
                    StoreError::DUPLICATE_IDENTITY,
                    "A user with this email address has already been registered",
                ))
            }
            Entry::Vacant(slot) => {
                let id = new_id();
                slot.insert(id.clone());
                id
            }
        };

        let identity = Identity {
            id: id.clone(),
            email,
            created_at: Some(now()),
        };
        self.accounts.insert(
            id,
            Account {
                identity: identity.clone(),
                password: password.to_string(),
            },
        );

        Ok(identity)
    }

    async fn delete_identity(&self, id: &str) -> StoreResult<()> {
        if let Some((_, account)) = self.accounts.remove(id) {
            self.ids_by_email.remove(&account.identity.email);
        }
        // Same cascade as the platform's foreign keys.
        self.profiles.remove(id);
        self.user_stats.remove(id);
        self.favorites.retain(|(user_id, _), _| user_id != id);
        self.access_tokens.retain(|_, entry| entry.0 != id);
        self.refresh_tokens.retain(|_, entry| entry.0 != id);
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> StoreResult<Session> {
        let invalid =
            || StoreError::new(StoreError::INVALID_CREDENTIALS, "Invalid login credentials");

        let id = self
            .ids_by_email
            .get(&normalize_email(email))
            .map(|id| id.value().clone())
            .ok_or_else(invalid)?;

        let identity = match self.accounts.get(&id) {
            Some(account) if account.password == password => account.identity.clone(),
            _ => return Err(invalid()),
        };

        Ok(self.issue_session(identity))
    }

    async fn resolve(&self, access_token: &str) -> StoreResult<Option<Identity>> {
        let owner = self
            .access_tokens
            .get(access_token)
            .map(|entry| entry.value().0.clone());
        Ok(owner.and_then(|id| self.identity(&id)))
    }

    async fn refresh(&self, refresh_token: &str) -> StoreResult<Session> {
        // Rotation: a refresh token is single-use.
        let (id, old_access) = self
            .refresh_tokens
            .remove(refresh_token)
            .map(|(_, value)| value)
            .ok_or_else(|| {
                StoreError::new(
                    StoreError::INVALID_GRANT,
                    "Invalid Refresh Token: Refresh Token Not Found",
                )
            })?;
        self.access_tokens.remove(&old_access);

        let identity = self.identity(&id).ok_or_else(|| {
            StoreError::new(StoreError::INVALID_GRANT, "User from refresh token not found")
        })?;

        Ok(self.issue_session(identity))
    }

    async fn invalidate(&self, access_token: &str) -> StoreResult<()> {
        if let Some((_, (_, refresh_token))) = self.access_tokens.remove(access_token) {
            self.refresh_tokens.remove(&refresh_token);
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryBackend {
    async fn insert_profile(&self, profile: &NewProfile) -> StoreResult<Profile> {
        if self.fail_profile_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::new(
                "http_500",
                "insert or update on table \"profiles\" violates foreign key constraint",
            ));
        }

        match self.profiles.entry(profile.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::new(
                StoreError::UNIQUE_VIOLATION,
                "duplicate key value violates unique constraint \"profiles_pkey\"",
            )),
            Entry::Vacant(slot) => {
                let row = Profile {
                    id: profile.id.clone(),
                    username: Some(profile.username.clone()),
                    full_name: Some(profile.full_name.clone()),
                    bio: None,
                    skill_level: Some(profile.skill_level.clone()),
                    dietary_restrictions: None,
                    avatar_url: None,
                    created_at: Some(now()),
                };
                slot.insert(row.clone());
                Ok(row)
            }
        }
    }

    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        Ok(self.profiles.get(id).map(|p| p.value().clone()))
    }

    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<Profile>> {
        self.profile_updates.fetch_add(1, Ordering::SeqCst);

        Ok(self.profiles.get_mut(id).map(|mut profile| {
            update.apply_to(&mut profile);
            profile.clone()
        }))
    }

    async fn insert_user_stats(&self, stats: &UserStats) -> StoreResult<()> {
        self.user_stats.insert(stats.user_id.clone(), stats.clone());
        Ok(())
    }

    async fn get_user_stats(&self, user_id: &str) -> StoreResult<Option<UserStats>> {
        Ok(self.user_stats.get(user_id).map(|s| s.value().clone()))
    }
}

#[async_trait]
impl RecipeStore for MemoryBackend {
    async fn list_recipes(&self) -> StoreResult<Vec<Recipe>> {
        let recipes = self.recipes.iter().map(|r| r.value().clone()).collect();
        Ok(Self::sorted_newest_first(recipes))
    }

    async fn search_recipes(&self, search: &RecipeSearch) -> StoreResult<Vec<Recipe>> {
        let recipes = self
            .recipes
            .iter()
            .filter(|r| search.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        Ok(Self::sorted_newest_first(recipes))
    }

    async fn get_recipe(&self, id: &str) -> StoreResult<Option<Recipe>> {
        Ok(self.recipes.get(id).map(|r| r.value().clone()))
    }

    async fn list_ingredients(&self, recipe_id: &str) -> StoreResult<Vec<Ingredient>> {
        let mut rows = self
            .ingredients
            .get(recipe_id)
            .map(|rows| rows.value().clone())
            .unwrap_or_default();
        rows.sort_by_key(|i| i.order_index);
        Ok(rows)
    }

    async fn list_steps(&self, recipe_id: &str) -> StoreResult<Vec<CookingStep>> {
        let mut rows = self
            .steps
            .get(recipe_id)
            .map(|rows| rows.value().clone())
            .unwrap_or_default();
        rows.sort_by_key(|s| s.step_number);
        Ok(rows)
    }

    async fn get_nutrition(&self, recipe_id: &str) -> StoreResult<Option<Nutrition>> {
        Ok(self.nutrition.get(recipe_id).map(|n| n.value().clone()))
    }

    async fn list_reviews(&self, recipe_id: &str) -> StoreResult<Vec<Review>> {
        let mut rows = self
            .reviews
            .get(recipe_id)
            .map(|rows| rows.value().clone())
            .unwrap_or_default();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn create_recipe(&self, recipe: &NewRecipe) -> StoreResult<Recipe> {
        let created_at = now();
        let row = Recipe {
            id: new_id(),
            title: recipe.title.clone(),
            description: recipe.description.clone(),
            image_url: recipe.image_url.clone(),
            author_id: recipe.author_id.clone(),
            category: recipe.category.clone(),
            difficulty: recipe.difficulty,
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            servings: recipe.servings,
            created_at: created_at.clone(),
            updated_at: Some(created_at),
        };
        self.recipes.insert(row.id.clone(), row.clone());
        Ok(row)
    }
}

#[async_trait]
impl FavoriteStore for MemoryBackend {
    async fn list_favorites(&self, user_id: &str) -> StoreResult<Vec<Favorite>> {
        let mut rows: Vec<Favorite> = self
            .favorites
            .iter()
            .filter(|f| f.value().user_id == user_id)
            .map(|f| {
                let mut favorite = f.value().clone();
                favorite.recipe = self
                    .recipes
                    .get(&favorite.recipe_id)
                    .map(|r| r.value().clone());
                favorite
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn add_favorite(&self, user_id: &str, recipe_id: &str) -> StoreResult<Favorite> {
        match self
            .favorites
            .entry((user_id.to_string(), recipe_id.to_string()))
        {
            Entry::Occupied(_) => Err(StoreError::new(
                StoreError::UNIQUE_VIOLATION,
                "duplicate key value violates unique constraint \"favorites_user_id_recipe_id_key\"",
            )),
            Entry::Vacant(slot) => {
                let favorite = Favorite {
                    id: new_id(),
                    user_id: user_id.to_string(),
                    recipe_id: recipe_id.to_string(),
                    created_at: now(),
                    recipe: None,
                };
                slot.insert(favorite.clone());
                Ok(favorite)
            }
        }
    }

    async fn remove_favorite(&self, user_id: &str, recipe_id: &str) -> StoreResult<()> {
        self.favorites
            .remove(&(user_id.to_string(), recipe_id.to_string()));
        Ok(())
    }

    async fn count_favorites(&self, user_id: &str) -> StoreResult<u64> {
        Ok(self
            .favorites
            .iter()
            .filter(|f| f.value().user_id == user_id)
            .count() as u64)
    }
}
