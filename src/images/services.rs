use bytes::Bytes;
use tracing::{debug, error, info, warn};

use super::intake::{content_type_for, IncomingFile, StoredFile};
use crate::{
    accounts::repo_types::{Account, AccountSnapshot},
    error::AccountError,
    state::AppState,
    storage::{is_valid_key, StorageClient},
};

/// Replacement of an account's profile image by a freshly stored file.
///
/// `commit` points the account at the new file and then drops the previous one;
/// `rollback` deletes the new file. One of the two always runs once the swap is
/// prepared, so a failed attempt leaves no file behind.
struct ImageSwap<'a> {
    storage: &'a dyn StorageClient,
    account_id: i32,
    new_file: StoredFile,
    previous: Option<String>,
}

impl<'a> ImageSwap<'a> {
    async fn prepare(
        st: &'a AppState,
        account_id: i32,
        new_file: StoredFile,
    ) -> Result<ImageSwap<'a>, AccountError> {
        let mut swap = ImageSwap {
            storage: st.storage.as_ref(),
            account_id,
            new_file,
            previous: None,
        };

        let present = swap.storage.exists(&swap.new_file.name).await;
        match present {
            Ok(true) => {}
            Ok(false) => {
                let missing = anyhow::anyhow!("uploaded file {} not found", swap.new_file.name);
                return Err(swap.rollback(AccountError::Storage(missing)).await);
            }
            Err(e) => return Err(swap.rollback(AccountError::Storage(e)).await),
        }

        match st.accounts.find_by_id(account_id).await {
            Ok(Some(account)) => {
                swap.previous = account.profile_image;
                Ok(swap)
            }
            Ok(None) => Err(swap.rollback(AccountError::NotFound).await),
            Err(e) => Err(swap.rollback(e.into()).await),
        }
    }

    async fn commit(self, st: &AppState) -> Result<Account, AccountError> {
        let updated = st
            .accounts
            .update_image_ref(self.account_id, &self.new_file.name)
            .await;
        let account = match updated {
            Ok(account) => account,
            Err(e) => return Err(self.rollback(e.into()).await),
        };

        if let Some(old) = self.previous.as_deref().filter(|old| *old != self.new_file.name) {
            // A stray old file is acceptable; failing the request is not.
            match self.storage.delete_object(old).await {
                Ok(()) => info!(account_id = self.account_id, file = %old, "old profile image deleted"),
                Err(e) => warn!(account_id = self.account_id, file = %old, error = %e, "could not delete old profile image"),
            }
        }
        Ok(account)
    }

    async fn rollback(self, cause: AccountError) -> AccountError {
        if let Err(e) = self.storage.delete_object(&self.new_file.name).await {
            error!(
                account_id = self.account_id,
                file = %self.new_file.name,
                error = %e,
                "rollback could not delete uploaded file"
            );
        } else {
            info!(account_id = self.account_id, file = %self.new_file.name, "uploaded file rolled back");
        }
        cause
    }
}

/// Makes `stored` the account's profile image, deleting whichever file it replaces.
pub async fn replace_profile_image(
    st: &AppState,
    account_id: i32,
    stored: StoredFile,
) -> Result<Account, AccountError> {
    let swap = ImageSwap::prepare(st, account_id, stored).await?;
    swap.commit(st).await
}

/// Intake followed by the swap. Returns the stored file name, the refreshed
/// snapshot and a session token carrying it.
pub async fn upload_profile_image(
    st: &AppState,
    account_id: i32,
    file: IncomingFile,
) -> Result<(String, AccountSnapshot, String), AccountError> {
    let stored = st.intake.accept(file).await?;
    debug!(account_id, file = %stored.name, size = stored.size, content_type = %stored.content_type, "upload accepted");
    let filename = stored.name.clone();
    let account = replace_profile_image(st, account_id, stored).await?;
    let snapshot = AccountSnapshot::from(account);
    let token = st.jwt.sign(&snapshot)?;
    info!(account_id, file = %filename, "profile picture updated");
    Ok((filename, snapshot, token))
}

/// Bytes and content type of a stored profile image, if it exists.
pub async fn read_profile_image(
    st: &AppState,
    filename: &str,
) -> Result<Option<(Bytes, &'static str)>, AccountError> {
    if !is_valid_key(filename) {
        return Ok(None);
    }
    let body = st
        .storage
        .get_object(filename)
        .await
        .map_err(AccountError::Storage)?;
    Ok(body.map(|b| (b, content_type_for(filename))))
}
