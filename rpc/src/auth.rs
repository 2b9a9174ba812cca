//! Bearer-token session extraction.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use sigver_verification::{ServiceError, Session};

use crate::error::ApiError;
use crate::handlers::blocking;
use crate::server::AppState;

/// The caller's session, resolved from `Authorization: Bearer <token>`.
pub struct AuthSession(pub Session);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or(ServiceError::MissingCredential)?
            .to_string();
        let accounts = state.accounts.clone();
        let session = blocking(move || accounts.authenticate(&token)).await?;
        Ok(AuthSession(session))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
