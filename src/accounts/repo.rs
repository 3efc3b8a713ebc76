use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::accounts::repo_types::{Account, NewAccount, ProfileUpdate};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    /// The write touched zero rows.
    #[error("account not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for account records. Each mutation is a single-row statement,
/// so readers never observe a partially written record.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create(&self, new: NewAccount) -> Result<Account, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Account>, StoreError>;
    async fn update_profile(&self, id: i32, update: &ProfileUpdate)
        -> Result<Account, StoreError>;
    async fn update_password(&self, id: i32, password_hash: &str) -> Result<Account, StoreError>;
    async fn update_image_ref(&self, id: i32, filename: &str) -> Result<Account, StoreError>;
}

#[derive(Clone)]
pub struct PgAccountStore {
    db: PgPool,
}

impl PgAccountStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::DuplicateEmail,
        e => StoreError::Database(e),
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create(&self, new: NewAccount) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO account (account_firstname, account_lastname, account_email, account_password)
            VALUES ($1, $2, $3, $4)
            RETURNING account_id, account_firstname, account_lastname, account_email,
                      account_password, account_type, account_profile_image
            "#,
        )
        .bind(&new.firstname)
        .bind(&new.lastname)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT account_id, account_firstname, account_lastname, account_email,
                   account_password, account_type, account_profile_image
            FROM account
            WHERE account_email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT account_id, account_firstname, account_lastname, account_email,
                   account_password, account_type, account_profile_image
            FROM account
            WHERE account_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn update_profile(
        &self,
        id: i32,
        update: &ProfileUpdate,
    ) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            r#"
            UPDATE account
               SET account_firstname = $1, account_lastname = $2, account_email = $3
             WHERE account_id = $4
            RETURNING account_id, account_firstname, account_lastname, account_email,
                      account_password, account_type, account_profile_image
            "#,
        )
        .bind(&update.firstname)
        .bind(&update.lastname)
        .bind(&update.email)
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)?
        .ok_or(StoreError::NotFound)
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            r#"
            UPDATE account
               SET account_password = $1
             WHERE account_id = $2
            RETURNING account_id, account_firstname, account_lastname, account_email,
                      account_password, account_type, account_profile_image
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn update_image_ref(&self, id: i32, filename: &str) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            r#"
            UPDATE account
               SET account_profile_image = $1
             WHERE account_id = $2
            RETURNING account_id, account_firstname, account_lastname, account_email,
                      account_password, account_type, account_profile_image
            "#,
        )
        .bind(filename)
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }
}
