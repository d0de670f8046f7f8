//! Session credential checking.
//!
//! The relay only *verifies* an already-issued session token; issuing and
//! revoking them is the authentication system's job. Handlers reject a
//! request before any upstream call when the token is missing or unknown.

use std::collections::HashSet;

use actix_web::HttpRequest;

/// Validates opaque session tokens.
pub trait SessionStore: Send + Sync {
    fn validate(&self, token: &str) -> bool;
}

/// Fixed set of accepted tokens, loaded from configuration.
#[derive(Debug, Default)]
pub struct StaticSessionStore {
    tokens: HashSet<String>,
}

impl StaticSessionStore {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }
}

impl SessionStore for StaticSessionStore {
    fn validate(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }
}

/// Extract the bearer token from the `Authorization` header.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
