//! Favorite models.
//!
//! A favorite is a user's saved reference to an external recipe (title plus
//! image), not the recipe data itself. Dedupe on (user_id, recipe_title) is
//! a handler-level pre-check, so concurrent saves can race.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub id: i64,
    pub user_id: String,
    pub recipe_title: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveRecipeRequest {
    pub title: String,
    pub image: Option<String>,
}
