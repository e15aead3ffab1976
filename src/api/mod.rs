pub mod auth;
mod error;
mod favorites;
pub mod flash;
mod recipes;

pub use error::ApiError;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::db::UserResponse;
use crate::AppState;
use flash::FlashMessage;

/// Context handed to page renders: who is logged in, plus any pending flash
/// messages.
#[derive(Debug, Serialize)]
pub struct PageContext {
    pub user: Option<UserResponse>,
    pub flash: Vec<FlashMessage>,
}

#[derive(Debug, Serialize)]
struct HomeResponse {
    service: &'static str,
    version: &'static str,
    user: Option<UserResponse>,
    flash: Vec<FlashMessage>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.server.static_dir.clone();

    // Public routes: landing, register, login. Everything else resolves the
    // session in the handler and turns anonymous callers away to /login.
    let app_routes = Router::new()
        .route("/", get(home))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/search", get(recipes::search_page).post(recipes::search))
        .route("/save_recipe", post(favorites::save_recipe))
        .route("/favorites", get(favorites::list_favorites))
        .route("/remove_favorite/:id", get(favorites::remove_favorite))
        .route("/health", get(health_check))
        .with_state(state);

    // Frontend assets are a replaceable collaborator served from disk
    Router::new()
        .merge(app_routes)
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
}

/// Landing page context
///
/// GET /
async fn home(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<HomeResponse>) {
    let user = auth::maybe_user(&state.db, &jar)
        .await
        .map(UserResponse::from);
    let (jar, flash) = flash::take(jar);
    (
        jar,
        Json(HomeResponse {
            service: "ladle",
            version: env!("CARGO_PKG_VERSION"),
            user,
            flash,
        }),
    )
}

async fn health_check() -> &'static str {
    "OK"
}


#[cfg(test)]
mod tests {
    use super::test_util::*;
    use crate::config::Config;
    use axum::http::StatusCode;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let state = test_state().await;
        let router = super::create_router(state);

        let response = router
            .clone()
            .oneshot(get_request("/health", &[]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_home_is_public() {
        let state = test_state().await;
        let router = super::create_router(state);

        let response = router.clone().oneshot(get_request("/", &[])).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["service"], "ladle");
        assert!(json["user"].is_null());
    }

    // The whole journey: register, login, search against a stub, save the
    // result, list it, remove it, list again.
    #[tokio::test]
    async fn test_full_user_journey() {
        let stub = Router::new().route(
            "/recipes/findByIngredients",
            get(|| async { r#"[{"title":"Omelette","image":"img1"}]"# }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, stub).await.unwrap();
        });

        let mut config = Config::default();
        config.recipe_api.base_url = format!("http://{addr}");
        let state = test_state_with(config).await;
        let router = super::create_router(state);

        let cookie = register_and_login(&router, "alice", "a@x.com", "pw1").await;

        // Search
        let response = router
            .clone()
            .oneshot(form_request(
                "POST",
                "/search",
                "ingredients=egg,milk",
                &[cookie.clone()],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["recipes"][0]["title"], "Omelette");

        // Save the found recipe
        let response = router
            .clone()
            .oneshot(form_request(
                "POST",
                "/save_recipe",
                "title=Omelette&image=img1",
                &[cookie.clone()],
            ))
            .await
            .unwrap();
        assert_eq!(location(&response), "/favorites");

        // Exactly one favorite listed
        let response = router
            .clone()
            .oneshot(get_request("/favorites", &[cookie.clone()]))
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["total"], 1);
        let id = json["favorites"][0]["id"].as_i64().unwrap();

        // Remove it, list is empty again
        router
            .clone()
            .oneshot(get_request(
                &format!("/remove_favorite/{id}"),
                &[cookie.clone()],
            ))
            .await
            .unwrap();
        let response = router
            .clone()
            .oneshot(get_request("/favorites", &[cookie]))
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["total"], 0);
    }
}
