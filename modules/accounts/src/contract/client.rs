use async_trait::async_trait;
use modkit::Principal;

use crate::contract::model::User;

/// Public API of the accounts module, published on the ClientHub.
#[async_trait]
pub trait AccountsApi: Send + Sync {
    /// Get a user by id
    async fn get_user(&self, id: i64) -> anyhow::Result<User>;

    /// Emails of the given users; unknown ids are skipped.
    async fn emails_for(&self, ids: &[i64]) -> anyhow::Result<Vec<String>>;

    /// Resolve an API token; `None` for unknown tokens and inactive accounts.
    async fn authenticate(&self, token: &str) -> anyhow::Result<Option<Principal>>;
}
