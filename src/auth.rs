//! Access token handling.
//!
//! The lab API issues a JWT bearer token. This frontend never verifies it;
//! it keeps the token in an HttpOnly cookie, forwards it on every API call,
//! and reads the `sub` claim to look up the current user.

use crate::api::ApiClient;
use crate::models::User;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use base64::{
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
    Engine,
};
use serde::Deserialize;

/// Cookie holding the API access token
pub const TOKEN_COOKIE: &str = "labbook_token";

#[derive(Debug, Deserialize)]
struct Claims {
    sub: serde_json::Value,
}

/// The stored access token, if any.
pub fn access_token(jar: &CookieJar) -> Option<String> {
    jar.get(TOKEN_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|t| !t.is_empty())
}

pub fn is_logged_in(jar: &CookieJar) -> bool {
    access_token(jar).is_some()
}

pub fn token_cookie(token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_token(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(TOKEN_COOKIE).path("/"))
}

/// Decode the payload segment of a JWT and return its `sub` claim.
///
/// Any malformed token yields `None`.
pub fn token_subject(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .or_else(|_| URL_SAFE.decode(payload))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    match claims.sub {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolve the user the token belongs to. Failures mean "no user".
pub async fn current_user(api: &ApiClient, token: &str) -> Option<User> {
    let sub = token_subject(token)?;
    match api.get_user(token, &sub).await {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!(error = %e, "could not resolve current user");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_subject_from_string_claim() {
        let token = make_token(r#"{"sub":"user-42","exp":1700000000}"#);
        assert_eq!(token_subject(&token).as_deref(), Some("user-42"));
    }

    #[test]
    fn test_subject_from_numeric_claim() {
        let token = make_token(r#"{"sub":7}"#);
        assert_eq!(token_subject(&token).as_deref(), Some("7"));
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let token = format!(
            "h.{}.s",
            URL_SAFE.encode(r#"{"sub":"padded"}"#)
        );
        assert_eq!(token_subject(&token).as_deref(), Some("padded"));
    }

    #[test]
    fn test_malformed_tokens_mean_no_user() {
        assert_eq!(token_subject("not-a-jwt"), None);
        assert_eq!(token_subject("a.!!!.c"), None);
        assert_eq!(token_subject(&make_token("not json")), None);
        assert_eq!(token_subject(&make_token(r#"{"iat":1}"#)), None);
        assert_eq!(token_subject(&make_token(r#"{"sub":""}"#)), None);
    }

    #[test]
    fn test_access_token_ignores_blank_cookie() {
        let jar = CookieJar::new().add(Cookie::new(TOKEN_COOKIE, "  "));
        assert!(access_token(&jar).is_none());

        let jar = CookieJar::new().add(token_cookie("abc".to_string()));
        assert_eq!(access_token(&jar).as_deref(), Some("abc"));
        assert!(!is_logged_in(&clear_token(jar)));
    }
}
