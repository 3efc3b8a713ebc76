use axum::{
    extract::{
        multipart::{Field, MultipartError},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use bytes::BytesMut;
use serde::Serialize;
use tracing::{instrument, warn};

use super::{
    intake::{IncomingFile, UploadRejection, PROFILE_FIELD},
    services::{read_profile_image, upload_profile_image},
};
use crate::{
    accounts::repo_types::AccountSnapshot, auth::extractors::AuthAccount, error::AccountError,
    state::AppState,
};

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub message: String,
    pub filename: String,
    pub account: AccountSnapshot,
}

fn body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes.saturating_add(MULTIPART_OVERHEAD)
}

pub fn image_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/account/upload",
            post(upload_profile_picture).layer(DefaultBodyLimit::max(body_limit(max_upload_bytes))),
        )
        .route("/account/profile-image/:filename", get(serve_profile_image))
}

/// POST /account/upload (multipart, one file in field `profile`)
#[instrument(skip(state, session, jar, mp), fields(account_id = session.account_id))]
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    AuthAccount(session): AuthAccount,
    jar: CookieJar,
    mut mp: Multipart,
) -> Result<(CookieJar, Json<UploadResponse>), AccountError> {
    let file = read_single_file(&mut mp, state.intake.max_bytes()).await?;
    let (filename, account, token) =
        upload_profile_image(&state, session.account_id, file).await?;

    let jar = state
        .jwt
        .session_cookie(jar, token, state.config.cookie_secure);
    Ok((
        jar,
        Json(UploadResponse {
            ok: true,
            message: "Profile picture updated successfully!".into(),
            filename,
            account,
        }),
    ))
}

/// GET /account/profile-image/:filename
#[instrument(skip(state))]
pub async fn serve_profile_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AccountError> {
    match read_profile_image(&state, &filename).await? {
        Some((body, content_type)) => {
            Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
        }
        None => Ok((StatusCode::NOT_FOUND, "Image not found").into_response()),
    }
}

/// Reads the one file field of the request. Non-file fields are ignored; a second
/// file, or a file under another field name, rejects the request.
async fn read_single_file(mp: &mut Multipart, max_bytes: usize) -> Result<IncomingFile, AccountError> {
    let mut found: Option<IncomingFile> = None;
    loop {
        let field = mp
            .next_field()
            .await
            .map_err(|e| multipart_rejection(e, max_bytes))?;
        let Some(field) = field else { break };

        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if file_name.is_empty() {
            // browsers send an empty file part when nothing was picked
            continue;
        }
        if field.name() != Some(PROFILE_FIELD) || found.is_some() {
            return Err(UploadRejection::UnexpectedField.into());
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = read_limited(field, max_bytes).await?;
        found = Some(IncomingFile {
            file_name,
            content_type,
            body,
        });
    }
    found.ok_or_else(|| UploadRejection::Missing.into())
}

/// A body cut off by the route's body limit is an oversized file, anything else is malformed.
fn multipart_rejection(e: MultipartError, max_bytes: usize) -> UploadRejection {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(error = %e, "multipart body over limit");
        UploadRejection::TooLarge { max_bytes }
    } else {
        warn!(error = %e, "multipart read failed");
        UploadRejection::Malformed
    }
}

/// Stops reading as soon as the limit is crossed.
async fn read_limited(mut field: Field<'_>, max_bytes: usize) -> Result<bytes::Bytes, AccountError> {
    let mut body = BytesMut::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_rejection(e, max_bytes))?
    {
        if body.len() + chunk.len() > max_bytes {
            return Err(UploadRejection::TooLarge { max_bytes }.into());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}
