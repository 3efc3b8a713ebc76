use axum::extract::FromRef;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{
    accounts::repo_types::AccountSnapshot, auth::claims::Claims, config::JwtConfig,
    state::AppState,
};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "jwt";

/// Every verification failure ends up here, whatever the cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid session token")]
pub struct InvalidToken;

/// Signing and verification keys with the claim settings.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::seconds(config.ttl_seconds),
        }
    }

    pub fn sign(&self, account: &AccountSnapshot) -> Result<String, jsonwebtoken::errors::Error> {
        self.sign_at(account, OffsetDateTime::now_utc())
    }

    /// Signs with an explicit issuance time. Expiry is `issued_at + ttl`.
    pub fn sign_at(
        &self,
        account: &AccountSnapshot,
        issued_at: OffsetDateTime,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let exp = issued_at + self.ttl;
        let claims = Claims {
            account: account.clone(),
            iat: issued_at.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(account_id = account.account_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<AccountSnapshot, InvalidToken> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            InvalidToken
        })?;
        debug!(account_id = data.claims.account.account_id, "jwt verified");
        Ok(data.claims.account)
    }

    /// Adds the session cookie for `token` to the jar.
    pub fn session_cookie(&self, jar: CookieJar, token: String, secure: bool) -> CookieJar {
        jar.add(
            Cookie::build((SESSION_COOKIE, token))
                .http_only(true)
                .secure(secure)
                .same_site(SameSite::Lax)
                .path("/")
                .max_age(self.ttl),
        )
    }
}

/// Removes the session cookie.
pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"))
}
