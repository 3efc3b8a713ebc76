use tracing::info;

use crate::{
    accounts::repo_types::{AccountSnapshot, ProfileUpdate},
    auth::password::hash_password_blocking,
    error::AccountError,
    state::AppState,
};

pub async fn get_account(st: &AppState, id: i32) -> Result<AccountSnapshot, AccountError> {
    st.accounts
        .find_by_id(id)
        .await?
        .map(AccountSnapshot::from)
        .ok_or(AccountError::NotFound)
}

/// Writes the new names and email, then re-issues the session token so it
/// carries the updated snapshot.
pub async fn update_profile(
    st: &AppState,
    id: i32,
    update: ProfileUpdate,
) -> Result<(AccountSnapshot, String), AccountError> {
    let account = st.accounts.update_profile(id, &update).await?;
    let snapshot = AccountSnapshot::from(account);
    let token = st.jwt.sign(&snapshot)?;
    info!(account_id = id, "account profile updated");
    Ok((snapshot, token))
}

pub async fn change_password(st: &AppState, id: i32, password: String) -> Result<(), AccountError> {
    let password_hash = hash_password_blocking(password).await?;
    st.accounts.update_password(id, &password_hash).await?;
    info!(account_id = id, "account password changed");
    Ok(())
}
