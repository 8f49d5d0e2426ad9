//! SeaORM-backed implementation of the accounts repository port.
//!
//! Generic over `C: ConnectionTrait`, so it works on a `DatabaseConnection`
//! or inside a transaction.

use anyhow::Context;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::domain::repo::{NewUserRecord, UserRecord, UsersRepository};
use crate::infra::storage::entity::{auth_tokens, users};

pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<UserRecord>> {
        let found = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let found = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("find_by_email failed")?;
        Ok(found.map(Into::into))
    }

    async fn email_exists(&self, email: &str) -> anyhow::Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("email_exists failed")?;
        Ok(count > 0)
    }

    async fn insert(&self, u: NewUserRecord) -> anyhow::Result<UserRecord> {
        let m = users::ActiveModel {
            email: Set(u.email),
            password_hash: Set(u.password_hash),
            first_name: Set(u.first_name),
            last_name: Set(u.last_name),
            phone: Set(u.phone),
            country: Set(u.country),
            avatar: Set(u.avatar),
            role: Set(u.role.into()),
            is_admin: Set(u.is_admin),
            is_active: Set(true),
            last_login: Set(None),
            date_joined: Set(u.date_joined),
            ..Default::default()
        };
        let inserted = m.insert(&self.conn).await.context("insert failed")?;
        Ok(inserted.into())
    }

    async fn update(&self, r: &UserRecord) -> anyhow::Result<()> {
        let u = &r.user;
        let m = users::ActiveModel {
            id: Set(u.id),
            email: Set(u.email.clone()),
            password_hash: Set(r.password_hash.clone()),
            first_name: Set(u.first_name.clone()),
            last_name: Set(u.last_name.clone()),
            phone: Set(u.phone.clone()),
            country: Set(u.country.clone()),
            avatar: Set(u.avatar.clone()),
            role: Set(u.role.into()),
            is_admin: Set(u.is_admin),
            is_active: Set(u.is_active),
            last_login: Set(u.last_login),
            date_joined: Set(u.date_joined),
        };
        m.update(&self.conn).await.context("update failed")?;
        Ok(())
    }

    async fn emails_for(&self, ids: &[i64]) -> anyhow::Result<Vec<String>> {
        let emails: Vec<String> = users::Entity::find()
            .select_only()
            .column(users::Column::Email)
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(users::Column::Id)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("emails_for failed")?;
        Ok(emails)
    }

    async fn deactivate_not_seen_since(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64> {
        let res = users::Entity::update_many()
            .col_expr(users::Column::IsActive, Expr::value(false))
            .filter(users::Column::IsActive.eq(true))
            .filter(users::Column::LastLogin.is_not_null())
            .filter(users::Column::LastLogin.lte(cutoff))
            .exec(&self.conn)
            .await
            .context("deactivate_not_seen_since failed")?;
        Ok(res.rows_affected)
    }

    async fn token_of(&self, user_id: i64) -> anyhow::Result<Option<String>> {
        let found = auth_tokens::Entity::find()
            .filter(auth_tokens::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("token_of failed")?;
        Ok(found.map(|t| t.key))
    }

    async fn insert_token(
        &self,
        user_id: i64,
        key: &str,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let m = auth_tokens::ActiveModel {
            key: Set(key.to_owned()),
            user_id: Set(user_id),
            created_at: Set(created_at),
        };
        auth_tokens::Entity::insert(m)
            .exec(&self.conn)
            .await
            .context("insert_token failed")?;
        Ok(())
    }

    async fn find_by_token(&self, key: &str) -> anyhow::Result<Option<UserRecord>> {
        let found = auth_tokens::Entity::find_by_id(key.to_owned())
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("find_by_token failed")?;
        Ok(found.and_then(|(_, user)| user).map(Into::into))
    }
}
