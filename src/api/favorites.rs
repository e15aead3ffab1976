//! Saved favorites: save, list, remove.

use axum::{
    extract::{Path, State},
    response::Redirect,
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::api::auth::CurrentUser;
use crate::api::error::ApiError;
use crate::api::flash::{self, Category, FlashMessage};
use crate::db::{Favorite, SaveRecipeRequest, UserResponse};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub user: UserResponse,
    pub favorites: Vec<Favorite>,
    pub total: usize,
    pub flash: Vec<FlashMessage>,
}

/// Save a recipe to the current user's favorites
///
/// POST /save_recipe
pub async fn save_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Form(request): Form<SaveRecipeRequest>,
) -> Result<(CookieJar, Redirect), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }

    // Dedupe pre-check; not atomic with the insert, concurrent saves can
    // slip through.
    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM favorites WHERE user_id = ? AND recipe_title = ?")
            .bind(&user.id)
            .bind(&request.title)
            .fetch_optional(&state.db)
            .await?;

    let jar = if existing.is_some() {
        flash::push(jar, Category::Warning, "Recipe already in favorites!")
    } else {
        sqlx::query("INSERT INTO favorites (user_id, recipe_title, image_url) VALUES (?, ?, ?)")
            .bind(&user.id)
            .bind(&request.title)
            .bind(&request.image)
            .execute(&state.db)
            .await?;

        info!(username = %user.username, title = %request.title, "Recipe saved to favorites");
        flash::push(jar, Category::Success, "Recipe saved to favorites!")
    };

    Ok((jar, Redirect::to("/favorites")))
}

/// List the current user's favorites
///
/// GET /favorites
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<FavoritesResponse>), ApiError> {
    let favorites: Vec<Favorite> = sqlx::query_as("SELECT * FROM favorites WHERE user_id = ?")
        .bind(&user.id)
        .fetch_all(&state.db)
        .await?;

    let (jar, flash) = flash::take(jar);
    let total = favorites.len();
    Ok((
        jar,
        Json(FavoritesResponse {
            user: UserResponse::from(user),
            favorites,
            total,
            flash,
        }),
    ))
}

/// Remove a favorite by id
///
/// GET /remove_favorite/:id
///
/// A favorite owned by someone else is left in place, but the caller still
/// gets the success redirect. Kept as-is; see DESIGN.md.
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let favorite: Option<Favorite> = sqlx::query_as("SELECT * FROM favorites WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;

    let favorite = favorite.ok_or_else(|| ApiError::not_found("Favorite not found"))?;

    let jar = if favorite.user_id == user.id {
        sqlx::query("DELETE FROM favorites WHERE id = ?")
            .bind(id)
            .execute(&state.db)
            .await?;

        info!(username = %user.username, title = %favorite.recipe_title, "Favorite removed");
        flash::push(jar, Category::Info, "Removed from favorites.")
    } else {
        jar
    };

    Ok((jar, Redirect::to("/favorites")))
}
