//! Favorite model.

use super::Recipe;
use serde::{Deserialize, Serialize};

/// A (user, recipe) bookmark. The pair is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: String,
    pub user_id: String,
    pub recipe_id: String,
    pub created_at: String,
    /// Embedded recipe row on list queries.
    #[serde(default, rename = "recipes", skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,
}
