// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod favorite;
pub mod recipe;
pub mod user;

pub use favorite::Favorite;
pub use recipe::{
    CookingStep, Difficulty, Ingredient, NewRecipe, Nutrition, Recipe, RecipeDetail, RecipeSearch,
    Review, ReviewAuthor,
};
pub use user::{Identity, NewProfile, Profile, ProfileUpdate, Session, UserStats, UserView};
