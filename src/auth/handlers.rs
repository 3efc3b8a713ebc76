use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument};

use crate::{
    accounts::{
        dto::{MessageResponse, SessionResponse},
        validation,
    },
    auth::{
        dto::{LoginRequest, RegisterRequest},
        jwt::clear_session_cookie,
        services,
    },
    error::AccountError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/account/register", post(register))
        .route("/account/login", post(login))
        .route("/account/logout", get(logout))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AccountError> {
    let firstname = validation::name(&payload.firstname, "first name")?;
    let lastname = validation::name(&payload.lastname, "last name")?;
    let email = validation::email(&payload.email)?;
    validation::password(&payload.password)?;

    let account = services::register(&state, firstname, lastname, email, payload.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok(format!(
            "Congratulations, you're registered {}. Please log in.",
            account.firstname
        ))),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AccountError> {
    // A malformed address cannot match any account.
    let email = validation::email(&payload.email).map_err(|_| AccountError::InvalidCredentials)?;
    if payload.password.is_empty() {
        return Err(AccountError::InvalidCredentials);
    }

    let (account, token) = services::login(&state, &email, payload.password).await?;
    let jar = state
        .jwt
        .session_cookie(jar, token.clone(), state.config.cookie_secure);

    Ok((
        jar,
        Json(SessionResponse {
            ok: true,
            message: format!("Welcome back {}.", account.firstname),
            token,
            account,
        }),
    ))
}

/// Tokens are stateless: logging out only drops the client's copy.
#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    info!("session cookie cleared");
    (
        clear_session_cookie(jar),
        Json(MessageResponse::ok("You have been logged out.")),
    )
}
