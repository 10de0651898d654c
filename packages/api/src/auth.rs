// ABOUTME: Authentication context for API requests
// ABOUTME: Resolves the bearer token to an active user record

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use taskhive_core::{DomainError, User};

use crate::response::ApiError;
use crate::state::AppState;

/// Current authenticated user, resolved from the Authorization header.
/// A resolved username that no longer exists, or points at a deactivated
/// account, is reported as not-found; the two cases are deliberately
/// indistinguishable.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| DomainError::unauthenticated("Not authenticated"))?;

        let claims = state
            .tokens
            .resolve(token)
            .map_err(|_| DomainError::unauthenticated("Could not validate credentials"))?;

        match state.db.users.find_by_username(&claims.sub).await? {
            Some(user) if user.is_active => Ok(CurrentUser(user)),
            _ => Err(DomainError::not_found("User not found or inactive").into()),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    if header.len() > 7 && header[..7].eq_ignore_ascii_case("bearer ") {
        let token = header[7..].trim();
        if !token.is_empty() {
            return Some(token);
        }
    }
    None
}
