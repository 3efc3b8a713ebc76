use serde::{Deserialize, Serialize};

use crate::accounts::repo_types::AccountSnapshot;

/// Request body for a profile update. The account is the one in the session.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(alias = "account_firstname")]
    pub firstname: String,
    #[serde(alias = "account_lastname")]
    pub lastname: String,
    #[serde(alias = "account_email")]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(alias = "account_password")]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub ok: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }
}

/// Returned whenever a (re-)issued session token accompanies the response.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub ok: bool,
    pub message: String,
    pub token: String,
    pub account: AccountSnapshot,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub ok: bool,
    pub account: AccountSnapshot,
}
