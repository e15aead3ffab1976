//! One-shot flash messages carried in a cookie.
//!
//! Mutating flows set a message on their redirect response; the next
//! page-context request drains the cookie and hands the messages to the
//! frontend. The cookie value is base64 so the JSON survives cookie
//! value rules.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

const FLASH_COOKIE: &str = "ladle_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Success,
    Danger,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashMessage {
    pub category: Category,
    pub message: String,
}

/// Append a flash message for the next page-context request.
pub fn push(jar: CookieJar, category: Category, message: impl Into<String>) -> CookieJar {
    let mut messages = peek(&jar);
    messages.push(FlashMessage {
        category,
        message: message.into(),
    });

    let encoded = match serde_json::to_vec(&messages) {
        Ok(json) => URL_SAFE_NO_PAD.encode(json),
        Err(_) => return jar,
    };

    jar.add(
        Cookie::build((FLASH_COOKIE, encoded))
            .path("/")
            .http_only(true)
            .build(),
    )
}

/// Drain all pending flash messages, clearing the cookie.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<FlashMessage>) {
    let messages = peek(&jar);
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/").build());
    (jar, messages)
}

fn peek(jar: &CookieJar) -> Vec<FlashMessage> {
    jar.get(FLASH_COOKIE)
        .and_then(|c| URL_SAFE_NO_PAD.decode(c.value()).ok())
        .and_then(|json| serde_json::from_slice(&json).ok())
        .unwrap_or_default()
}
