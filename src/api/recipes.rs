//! Ingredient search endpoints.

use axum::{extract::State, Form, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::auth::CurrentUser;
use crate::api::error::ApiError;
use crate::api::flash;
use crate::api::PageContext;
use crate::db::UserResponse;
use crate::search::RecipeResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub ingredients: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub recipes: Vec<RecipeResult>,
    pub total: usize,
}

/// Search page context
///
/// GET /search
pub async fn search_page(
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Json<PageContext>) {
    let (jar, flash) = flash::take(jar);
    (
        jar,
        Json(PageContext {
            user: Some(UserResponse::from(user)),
            flash,
        }),
    )
}

/// Query the external recipe API by ingredient list
///
/// POST /search
pub async fn search(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Form(request): Form<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    if request.ingredients.trim().is_empty() {
        return Err(ApiError::validation("Ingredients are required"));
    }

    let limit = state.config.recipe_api.result_limit;
    let recipes = state
        .recipes
        .search_by_ingredients(&request.ingredients, limit)
        .await;

    info!(
        username = %user.username,
        ingredients = %request.ingredients,
        results = recipes.len(),
        "Recipe search"
    );

    let total = recipes.len();
    Ok(Json(SearchResponse { recipes, total }))
}
