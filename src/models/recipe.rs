//! Recipe model and its detail rows.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Recipe row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Minutes
    #[serde(default)]
    pub prep_time: Option<u32>,
    /// Minutes
    #[serde(default)]
    pub cook_time: Option<u32>,
    #[serde(default)]
    pub servings: Option<u32>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of `POST /api/recipes`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewRecipe {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    #[validate(range(max = 10_000))]
    pub prep_time: Option<u32>,
    #[serde(default)]
    #[validate(range(max = 10_000))]
    pub cook_time: Option<u32>,
    #[serde(default)]
    #[validate(range(min = 1, max = 1000))]
    pub servings: Option<u32>,
    #[serde(default)]
    #[validate(url)]
    pub image_url: Option<String>,
    /// Filled in from the session, never from the request body.
    #[serde(skip_deserializing)]
    pub author_id: Option<String>,
}

/// Filters for `GET /api/recipes/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeSearch {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl RecipeSearch {
    /// Text query, if non-empty.
    pub fn text(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Category filter; `all` disables it.
    pub fn category(&self) -> Option<&str> {
        Self::filter(self.category.as_deref())
    }

    /// Difficulty filter; `all` disables it.
    pub fn difficulty(&self) -> Option<&str> {
        Self::filter(self.difficulty.as_deref())
    }

    fn filter(value: Option<&str>) -> Option<&str> {
        value.filter(|v| !v.is_empty() && *v != "all")
    }

    /// In-process equivalent of the store-side filter.
    pub fn matches(&self, recipe: &Recipe) -> bool {
        if let Some(q) = self.text() {
            let q = q.to_lowercase();
            let in_title = recipe.title.to_lowercase().contains(&q);
            let in_description = recipe
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&q));
            if !in_title && !in_description {
                return false;
            }
        }
        if let Some(category) = self.category() {
            if recipe.category.as_deref() != Some(category) {
                return false;
            }
        }
        if let Some(difficulty) = self.difficulty() {
            if recipe.difficulty.map(|d| d.as_str()) != Some(difficulty) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub recipe_id: String,
    pub name: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    pub order_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookingStep {
    pub id: String,
    pub recipe_id: String,
    pub step_number: i32,
    pub instruction: String,
    /// Minutes
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub id: String,
    pub recipe_id: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub fiber: Option<f64>,
    #[serde(default)]
    pub sugar: Option<f64>,
}

/// Public profile fields embedded in a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewAuthor {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub recipe_id: String,
    pub user_id: String,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: String,
    #[serde(default, rename = "profiles")]
    pub author: Option<ReviewAuthor>,
}

/// Recipe with every detail row, as served by `GET /api/recipes/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<CookingStep>,
    pub nutrition: Option<Nutrition>,
    pub reviews: Vec<Review>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(title: &str, category: &str, difficulty: Difficulty) -> Recipe {
        Recipe {
            id: "r1".to_string(),
            title: title.to_string(),
            description: Some("A weeknight classic".to_string()),
            image_url: None,
            author_id: None,
            category: Some(category.to_string()),
            difficulty: Some(difficulty),
            prep_time: Some(10),
            cook_time: Some(20),
            servings: Some(2),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: None,
        }
    }

    #[test]
    fn test_search_all_disables_filters() {
        let search = RecipeSearch {
            q: Some("  ".to_string()),
            category: Some("all".to_string()),
            difficulty: Some("all".to_string()),
        };
        assert_eq!(search.text(), None);
        assert_eq!(search.category(), None);
        assert_eq!(search.difficulty(), None);
        assert!(search.matches(&recipe("Pasta", "dinner", Difficulty::Easy)));
    }

    #[test]
    fn test_search_matches_title_or_description() {
        let pasta = recipe("Pasta", "dinner", Difficulty::Easy);

        let by_title = RecipeSearch {
            q: Some("PAST".to_string()),
            ..RecipeSearch::default()
        };
        assert!(by_title.matches(&pasta));

        let by_description = RecipeSearch {
            q: Some("weeknight".to_string()),
            ..RecipeSearch::default()
        };
        assert!(by_description.matches(&pasta));

        let miss = RecipeSearch {
            q: Some("curry".to_string()),
            ..RecipeSearch::default()
        };
        assert!(!miss.matches(&pasta));
    }

    #[test]
    fn test_search_category_and_difficulty() {
        let pasta = recipe("Pasta", "dinner", Difficulty::Easy);
        let search = RecipeSearch {
            q: None,
            category: Some("dinner".to_string()),
            difficulty: Some("hard".to_string()),
        };
        assert!(!search.matches(&pasta));

        let search = RecipeSearch {
            difficulty: Some("easy".to_string()),
            ..search
        };
        assert!(search.matches(&pasta));
    }

    #[test]
    fn test_review_author_uses_embed_name() {
        let review: Review = serde_json::from_value(serde_json::json!({
            "id": "rev1",
            "recipe_id": "r1",
            "user_id": "u1",
            "rating": 5,
            "comment": "Great",
            "created_at": "2026-01-01T00:00:00Z",
            "profiles": { "full_name": "Ann", "avatar_url": null }
        }))
        .unwrap();

        assert_eq!(
            review.author.and_then(|a| a.full_name),
            Some("Ann".to_string())
        );
    }
}
