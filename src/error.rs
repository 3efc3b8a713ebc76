//! Error type returned at the boundary of every account operation.
//!
//! Handlers turn it into `{ "ok": false, "message": ... }`. Messages are generic;
//! the underlying cause only goes to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::{accounts::repo::StoreError, images::intake::UploadRejection};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing or invalid session")]
    Unauthenticated,

    #[error("session does not own the requested account")]
    Forbidden,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("account not found")]
    NotFound,

    #[error("upload rejected: {0}")]
    Upload(#[from] UploadRejection),

    #[error("password hashing failed: {0:#}")]
    Hashing(anyhow::Error),

    #[error("file storage failed: {0:#}")]
    Storage(anyhow::Error),

    #[error("account store failed: {0}")]
    Store(sqlx::Error),

    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AccountError::DuplicateEmail,
            StoreError::NotFound => AccountError::NotFound,
            StoreError::Database(e) => AccountError::Store(e),
        }
    }
}

/// Failure body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub message: String,
}

impl AccountError {
    pub fn status(&self) -> StatusCode {
        match self {
            AccountError::Validation(_) => StatusCode::BAD_REQUEST,
            AccountError::InvalidCredentials | AccountError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            AccountError::Forbidden => StatusCode::FORBIDDEN,
            AccountError::DuplicateEmail => StatusCode::CONFLICT,
            AccountError::NotFound => StatusCode::NOT_FOUND,
            AccountError::Upload(UploadRejection::TooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            AccountError::Upload(_) => StatusCode::BAD_REQUEST,
            AccountError::Hashing(_)
            | AccountError::Storage(_)
            | AccountError::Store(_)
            | AccountError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// What the client is told. Never includes the internal cause.
    pub fn user_message(&self) -> String {
        match self {
            AccountError::Validation(msg) => msg.clone(),
            AccountError::InvalidCredentials => {
                "Please check your credentials and try again.".into()
            }
            AccountError::Unauthenticated => "Please log in.".into(),
            AccountError::Forbidden => "You may only manage your own account.".into(),
            AccountError::DuplicateEmail => {
                "Email exists. Please log in or use a different email.".into()
            }
            AccountError::NotFound => "Account not found.".into(),
            AccountError::Upload(rejection) => rejection.to_string(),
            AccountError::Hashing(_) => {
                "Sorry, there was an error processing the request.".into()
            }
            AccountError::Storage(_) => {
                "An error occurred while uploading. Please try again.".into()
            }
            AccountError::Store(_) | AccountError::Token(_) => {
                "Sorry, the request failed. Please try again.".into()
            }
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "account operation failed");
        } else {
            warn!(error = %self, "account operation rejected");
        }
        let body = ErrorBody {
            ok: false,
            message: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}
