//! Client for the external ingredient-search API.
//!
//! The upstream endpoint takes a comma-separated ingredient list and returns
//! a JSON array of candidate recipes. A non-200 response degrades to an
//! empty result list rather than failing the request.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::RecipeApiConfig;

/// One candidate recipe returned by the search API.
///
/// The upstream response carries more fields (ingredient counts, likes);
/// only the ones the service stores are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeResult {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Error)]
enum SearchError {
    #[error("search API returned status {0}")]
    Status(u16),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct RecipeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RecipeClient {
    pub fn new(config: &RecipeApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Search recipes matching a comma-separated ingredient list.
    ///
    /// Any upstream failure (non-200 status, connection error, bad JSON)
    /// yields an empty list; callers never see the error.
    pub async fn search_by_ingredients(&self, ingredients: &str, limit: u32) -> Vec<RecipeResult> {
        match self.fetch(ingredients, limit).await {
            Ok(recipes) => recipes,
            Err(e) => {
                warn!(error = %e, ingredients, "Recipe search degraded to empty results");
                Vec::new()
            }
        }
    }

    async fn fetch(&self, ingredients: &str, limit: u32) -> Result<Vec<RecipeResult>, SearchError> {
        let url = format!("{}/recipes/findByIngredients", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("ingredients", ingredients),
                ("number", &limit.to_string()),
                ("apiKey", &self.api_key),
            ])
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};

    fn client_for(base_url: &str) -> RecipeClient {
        RecipeClient::new(&RecipeApiConfig {
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            result_limit: 5,
        })
    }

    async fn spawn_stub(status: StatusCode, body: &'static str) -> String {
        let app = Router::new().route(
            "/recipes/findByIngredients",
            get(move || async move { (status, body) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_parses_results_on_200() {
        let base = spawn_stub(
            StatusCode::OK,
            r#"[{"id":7,"title":"Omelette","image":"img1","usedIngredientCount":2}]"#,
        )
        .await;

        let recipes = client_for(&base).search_by_ingredients("egg,milk", 5).await;
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].title, "Omelette");
        assert_eq!(recipes[0].image, "img1");
        assert_eq!(recipes[0].id, Some(7));
    }

    #[tokio::test]
    async fn test_non_200_yields_empty_list() {
        let base = spawn_stub(StatusCode::INTERNAL_SERVER_ERROR, "upstream broke").await;

        let recipes = client_for(&base).search_by_ingredients("egg", 5).await;
        assert!(recipes.is_empty());
    }

    #[tokio::test]
    async fn test_connection_error_yields_empty_list() {
        // Nothing is listening on this port
        let recipes = client_for("http://127.0.0.1:1")
            .search_by_ingredients("egg", 5)
            .await;
        assert!(recipes.is_empty());
    }

    #[tokio::test]
    async fn test_missing_image_defaults_to_empty() {
        let base = spawn_stub(StatusCode::OK, r#"[{"title":"Toast"}]"#).await;

        let recipes = client_for(&base).search_by_ingredients("bread", 5).await;
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].image, "");
        assert_eq!(recipes[0].id, None);
    }
}
