use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{instrument, warn};

use super::{
    dto::{AccountResponse, ChangePasswordRequest, MessageResponse, SessionResponse, UpdateProfileRequest},
    repo_types::ProfileUpdate,
    services, validation,
};
use crate::{auth::extractors::AuthAccount, error::AccountError, state::AppState};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account/", get(management))
        .route("/account/update/:id", get(edit_view))
        .route("/account/update", post(update_profile))
        .route("/account/password", post(change_password))
}

/// GET /account/ returns the session's own snapshot.
pub async fn management(AuthAccount(account): AuthAccount) -> Json<AccountResponse> {
    Json(AccountResponse { ok: true, account })
}

/// GET /account/update/:id
#[instrument(skip(state, session))]
pub async fn edit_view(
    State(state): State<AppState>,
    AuthAccount(session): AuthAccount,
    Path(id): Path<i32>,
) -> Result<Json<AccountResponse>, AccountError> {
    if id != session.account_id {
        warn!(session_id = session.account_id, id, "edit view for another account");
        return Err(AccountError::Forbidden);
    }
    let account = services::get_account(&state, id).await?;
    Ok(Json(AccountResponse { ok: true, account }))
}

#[instrument(skip(state, session, jar, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthAccount(session): AuthAccount,
    jar: CookieJar,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AccountError> {
    let update = ProfileUpdate {
        firstname: validation::name(&payload.firstname, "first name")?,
        lastname: validation::name(&payload.lastname, "last name")?,
        email: validation::email(&payload.email)?,
    };

    let (account, token) = services::update_profile(&state, session.account_id, update).await?;
    let jar = state
        .jwt
        .session_cookie(jar, token.clone(), state.config.cookie_secure);

    Ok((
        jar,
        Json(SessionResponse {
            ok: true,
            message: "Your account information has been updated.".into(),
            token,
            account,
        }),
    ))
}

#[instrument(skip(state, session, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthAccount(session): AuthAccount,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AccountError> {
    validation::password(&payload.password)?;
    services::change_password(&state, session.account_id, payload.password).await?;
    Ok(Json(MessageResponse::ok(
        "Password updated. Please logout and login to verify.",
    )))
}
