use async_trait::async_trait;
use chrono::{DateTime, Utc};
use modkit::Role;

use crate::contract::model::User;

/// Account row together with its password hash.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// Insert payload; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub country: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub is_admin: bool,
    pub date_joined: DateTime<Utc>,
}

/// Port for the domain layer: persistence operations the domain needs.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<UserRecord>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>>;
    async fn email_exists(&self, email: &str) -> anyhow::Result<bool>;
    async fn insert(&self, u: NewUserRecord) -> anyhow::Result<UserRecord>;
    /// Overwrite every mutable column of `u.user.id`.
    async fn update(&self, u: &UserRecord) -> anyhow::Result<()>;
    async fn emails_for(&self, ids: &[i64]) -> anyhow::Result<Vec<String>>;
    /// Bulk `is_active = false` for active accounts last seen at or before `cutoff`.
    async fn deactivate_not_seen_since(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64>;

    async fn token_of(&self, user_id: i64) -> anyhow::Result<Option<String>>;
    /// Fails if the user already has a token.
    async fn insert_token(
        &self,
        user_id: i64,
        key: &str,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
    async fn find_by_token(&self, key: &str) -> anyhow::Result<Option<UserRecord>>;
}
