//! Registration, login, and session handling.
//!
//! Sessions are random 256-bit tokens handed to the browser in a cookie.
//! Only the SHA-256 hash of a token is stored, so a leaked database does not
//! leak live sessions, and a forged or expired cookie never resolves to a
//! user.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    response::Redirect,
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;

use crate::api::error::ApiError;
use crate::api::flash::{self, Category};
use crate::api::PageContext;
use crate::db::{DbPool, LoginRequest, RegisterRequest, Session, User, UserResponse};
use crate::AppState;

pub const SESSION_COOKIE: &str = "ladle_session";

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random session token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn login_redirect() -> ApiError {
    ApiError::unauthorized("Please log in to continue").with_redirect("/login")
}

/// Timestamps stored for SQL comparison must use the same format as
/// SQLite's `datetime('now')`; RFC 3339 would not compare correctly.
fn sqlite_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Create a session row for a user and return the raw token.
async fn create_session(pool: &DbPool, user_id: &str, ttl_days: i64) -> Result<String, ApiError> {
    let token = generate_token();
    let token_hash = hash_token(&token);
    let expires_at = sqlite_timestamp(chrono::Utc::now() + chrono::Duration::days(ttl_days));

    let session_id = uuid::Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES (?, ?, ?, ?)")
        .bind(&session_id)
        .bind(user_id)
        .bind(&token_hash)
        .bind(&expires_at)
        .execute(pool)
        .await?;

    Ok(token)
}

/// Resolve a session token to its user. Unknown, forged, and expired tokens
/// all come back as the same login redirect.
async fn resolve_token(pool: &DbPool, token: &str) -> Result<User, ApiError> {
    let token_hash = hash_token(token);
    let session: Option<Session> = sqlx::query_as(
        "SELECT * FROM sessions WHERE token_hash = ? AND expires_at > datetime('now')",
    )
    .bind(&token_hash)
    .fetch_optional(pool)
    .await?;

    let session = session.ok_or_else(login_redirect)?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&session.user_id)
        .fetch_optional(pool)
        .await?;

    user.ok_or_else(login_redirect)
}

/// Current user for pages that render for anonymous visitors too.
pub async fn maybe_user(pool: &DbPool, jar: &CookieJar) -> Option<User> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    resolve_token(pool, &token).await.ok()
}

/// The authenticated user for the current request.
///
/// Protected handlers take this as an argument; requests without a valid
/// session cookie are rejected with a login redirect before the handler runs.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(login_redirect)?;

        let user = resolve_token(&state.db, &token).await?;
        Ok(CurrentUser(user))
    }
}

/// Registration page context
///
/// GET /register
pub async fn register_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<PageContext>) {
    let user = maybe_user(&state.db, &jar).await.map(UserResponse::from);
    let (jar, flash) = flash::take(jar);
    (jar, Json(PageContext { user, flash }))
}

/// Create an account
///
/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(request): Form<RegisterRequest>,
) -> Result<(CookieJar, Redirect), ApiError> {
    if request.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if request.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if request.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    // Combined username-or-email pre-check, case-sensitive. Not atomic with
    // the insert below, so concurrent registrations can race.
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT id FROM users WHERE username = ? OR email = ?")
            .bind(&request.username)
            .bind(&request.email)
            .fetch_optional(&state.db)
            .await?;

    if existing.is_some() {
        let jar = flash::push(jar, Category::Danger, "User already exists! Try logging in.");
        return Ok((jar, Redirect::to("/login")));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    sqlx::query("INSERT INTO users (id, username, email, password_hash) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(&request.username)
        .bind(&request.email)
        .bind(&password_hash)
        .execute(&state.db)
        .await?;

    info!(username = %request.username, "New user registered");

    let jar = flash::push(
        jar,
        Category::Success,
        "Registration successful! Please login.",
    );
    Ok((jar, Redirect::to("/login")))
}

/// Login page context
///
/// GET /login
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<PageContext>) {
    let user = maybe_user(&state.db, &jar).await.map(UserResponse::from);
    let (jar, flash) = flash::take(jar);
    (jar, Json(PageContext { user, flash }))
}

/// Authenticate and establish a session
///
/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(request): Form<LoginRequest>,
) -> Result<(CookieJar, Redirect), ApiError> {
    if request.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if request.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;

    // Same generic message whether the email is unknown or the password is
    // wrong.
    let verified = user
        .as_ref()
        .map(|u| verify_password(&request.password, &u.password_hash))
        .unwrap_or(false);

    let Some(user) = user.filter(|_| verified) else {
        let jar = flash::push(jar, Category::Danger, "Invalid email or password!");
        return Ok((jar, Redirect::to("/login")));
    };

    let token = create_session(&state.db, &user.id, state.config.auth.session_ttl_days).await?;

    info!(username = %user.username, "User logged in");

    let jar = jar.add(session_cookie(token));
    let jar = flash::push(
        jar,
        Category::Success,
        format!("Welcome back, {}!", user.username),
    );
    Ok((jar, Redirect::to("/search")))
}

/// End the session
///
/// GET /logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token_hash = hash_token(cookie.value());
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(&token_hash)
            .execute(&state.db)
            .await?;
    }

    info!(username = %user.username, "User logged out");

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    let jar = flash::push(jar, Category::Info, "You have been logged out.");
    Ok((jar, Redirect::to("/")))
}
