use serde::{Deserialize, Serialize};

use crate::accounts::repo_types::AccountSnapshot;

/// JWT payload: the account snapshot plus the registered claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub account: AccountSnapshot,
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}
