use tracing::{info, warn};

use crate::{
    accounts::repo_types::{Account, AccountSnapshot, NewAccount},
    auth::password::{hash_password_blocking, verify_password_blocking},
    error::AccountError,
    state::AppState,
};

/// Creates a Client account. `email` must already be normalized.
pub async fn register(
    st: &AppState,
    firstname: String,
    lastname: String,
    email: String,
    password: String,
) -> Result<Account, AccountError> {
    if st.accounts.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AccountError::DuplicateEmail);
    }

    let password_hash = hash_password_blocking(password).await?;
    let account = st
        .accounts
        .create(NewAccount {
            firstname,
            lastname,
            email,
            password_hash,
        })
        .await?;

    info!(account_id = account.id, email = %account.email, "account registered");
    Ok(account)
}

/// Checks the credentials and issues a session token for the account.
pub async fn login(
    st: &AppState,
    email: &str,
    password: String,
) -> Result<(AccountSnapshot, String), AccountError> {
    let Some(account) = st.accounts.find_by_email(email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AccountError::InvalidCredentials);
    };

    if !verify_password_blocking(password, account.password_hash.clone()).await? {
        warn!(account_id = account.id, "login invalid password");
        return Err(AccountError::InvalidCredentials);
    }

    let snapshot = AccountSnapshot::from(account);
    let token = st.jwt.sign(&snapshot)?;
    info!(account_id = snapshot.account_id, "account logged in");
    Ok((snapshot, token))
}
