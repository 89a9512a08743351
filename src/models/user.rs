//! Identity, session and profile models.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Skill levels accepted on profile updates.
pub const SKILL_LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];

/// Skill level assigned to every new profile.
pub const DEFAULT_SKILL_LEVEL: &str = "beginner";

/// Account record owned by the credential store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Access/refresh token pair for an identity.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub identity: Identity,
}

/// Profile row, keyed by identity id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skill_level: Option<String>,
    #[serde(default)]
    pub dietary_restrictions: Option<Vec<String>>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Row inserted right after an identity is created.
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub skill_level: String,
}

impl NewProfile {
    /// Defaults for a fresh signup: username is the local part of the email.
    pub fn for_signup(identity: &Identity, full_name: &str) -> Self {
        let username = identity
            .email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string();

        Self {
            id: identity.id.clone(),
            username,
            full_name: full_name.to_string(),
            skill_level: DEFAULT_SKILL_LEVEL.to_string(),
        }
    }
}

/// Partial profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000))]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_skill_level"))]
    pub skill_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20))]
    pub dietary_restrictions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.bio.is_none()
            && self.skill_level.is_none()
            && self.dietary_restrictions.is_none()
            && self.avatar_url.is_none()
    }

    /// Apply the present fields to an existing profile.
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(full_name) = &self.full_name {
            profile.full_name = Some(full_name.clone());
        }
        if let Some(bio) = &self.bio {
            profile.bio = Some(bio.clone());
        }
        if let Some(skill_level) = &self.skill_level {
            profile.skill_level = Some(skill_level.clone());
        }
        if let Some(restrictions) = &self.dietary_restrictions {
            profile.dietary_restrictions = Some(restrictions.clone());
        }
        if let Some(avatar_url) = &self.avatar_url {
            profile.avatar_url = Some(avatar_url.clone());
        }
    }
}

fn validate_skill_level(level: &str) -> Result<(), ValidationError> {
    if SKILL_LEVELS.contains(&level) {
        Ok(())
    } else {
        Err(ValidationError::new("skill_level"))
    }
}

/// Per-user cooking counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: String,
    #[serde(default)]
    pub recipes_cooked: u32,
    #[serde(default)]
    pub total_cooking_time: u32,
    #[serde(default)]
    pub reviews_written: u32,
}

impl UserStats {
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Self::default()
        }
    }
}

/// Identity merged with its (optional) profile for display.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_restrictions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl UserView {
    pub fn merge(identity: &Identity, profile: Option<Profile>) -> Self {
        let profile = profile.unwrap_or_else(|| Profile {
            id: identity.id.clone(),
            username: None,
            full_name: None,
            bio: None,
            skill_level: None,
            dietary_restrictions: None,
            avatar_url: None,
            created_at: None,
        });

        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            username: profile.username,
            full_name: profile.full_name,
            bio: profile.bio,
            skill_level: profile.skill_level,
            dietary_restrictions: profile.dietary_restrictions,
            avatar_url: profile.avatar_url,
            created_at: profile.created_at,
        }
    }
}
