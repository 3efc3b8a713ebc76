use serde::Deserialize;

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(alias = "account_firstname")]
    pub firstname: String,
    #[serde(alias = "account_lastname")]
    pub lastname: String,
    #[serde(alias = "account_email")]
    pub email: String,
    #[serde(alias = "account_password")]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "account_email")]
    pub email: String,
    #[serde(alias = "account_password")]
    pub password: String,
}
