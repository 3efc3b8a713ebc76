use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use super::jwt::{JwtKeys, SESSION_COOKIE};
use crate::{accounts::repo_types::AccountSnapshot, error::AccountError};

/// Verified session: the account snapshot carried by the session token.
///
/// The token comes from the `jwt` cookie, or from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthAccount(pub AccountSnapshot);

fn token_from_parts(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthAccount
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AccountError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or(AccountError::Unauthenticated)?;
        let keys = JwtKeys::from_ref(state);
        match keys.verify(&token) {
            Ok(account) => Ok(AuthAccount(account)),
            Err(_) => {
                warn!("invalid or expired session token");
                Err(AccountError::Unauthenticated)
            }
        }
    }
}
