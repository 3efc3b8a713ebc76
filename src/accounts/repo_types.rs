use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account classification. Not changed by any account operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_type")]
pub enum AccountType {
    #[default]
    Client,
    Employee,
    Admin,
}

/// Account record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    #[sqlx(rename = "account_id")]
    pub id: i32,
    #[sqlx(rename = "account_firstname")]
    pub firstname: String,
    #[sqlx(rename = "account_lastname")]
    pub lastname: String,
    #[sqlx(rename = "account_email")]
    pub email: String,
    #[sqlx(rename = "account_password")]
    pub password_hash: String, // argon2 PHC string, never leaves the store boundary
    pub account_type: AccountType,
    #[sqlx(rename = "account_profile_image")]
    pub profile_image: Option<String>,
}

/// Account fields without the password hash. This is what goes into session tokens
/// and what clients get to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: i32,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub account_type: AccountType,
    pub profile_image: Option<String>,
}

impl From<Account> for AccountSnapshot {
    fn from(a: Account) -> Self {
        Self {
            account_id: a.id,
            firstname: a.firstname,
            lastname: a.lastname,
            email: a.email,
            account_type: a.account_type,
            profile_image: a.profile_image,
        }
    }
}

/// Fields needed to create an account. `password_hash` must already be hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}
