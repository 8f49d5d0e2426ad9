//! SeaORM implementation of the catalog repository.
//!
//! Multi-table deletes run in a transaction opened on the held connection.

use std::collections::{HashMap, HashSet};

use anyhow::Context;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, SqlErr, TransactionTrait,
};

use crate::contract::model::{
    Course, DateOrder, Lesson, NewCourse, NewLesson, NewPayment, Payment, PaymentFilter,
    PurgeStats,
};
use crate::domain::repo::{CatalogRepository, SubscribeOutcome};
use crate::infra::storage::entity::{courses, lessons, payments, subscriptions};

pub struct SeaOrmCatalogRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmCatalogRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

async fn page<C, E>(
    conn: &C,
    query: Select<E>,
    limit: u64,
    offset: u64,
) -> Result<(Vec<E::Model>, u64), sea_orm::DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync + 'static,
{
    let total = query.clone().count(conn).await?;
    let rows = query.limit(limit).offset(offset).all(conn).await?;
    Ok((rows, total))
}

#[async_trait::async_trait]
impl<C> CatalogRepository for SeaOrmCatalogRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn list_courses(&self, limit: u64, offset: u64) -> anyhow::Result<(Vec<Course>, u64)> {
        let query = courses::Entity::find().order_by_asc(courses::Column::Id);
        let (rows, total) = page(&self.conn, query, limit, offset)
            .await
            .context("list_courses failed")?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn find_course(&self, id: i64) -> anyhow::Result<Option<Course>> {
        let found = courses::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_course failed")?;
        Ok(found.map(Into::into))
    }

    async fn insert_course(&self, c: NewCourse) -> anyhow::Result<Course> {
        let m = courses::ActiveModel {
            title: Set(c.title),
            description: Set(c.description),
            preview: Set(c.preview),
            owner_id: Set(c.owner_id),
            price: Set(Some(c.price.unwrap_or(0))),
            ..Default::default()
        };
        let inserted = m.insert(&self.conn).await.context("insert_course failed")?;
        Ok(inserted.into())
    }

    async fn update_course(&self, c: &Course) -> anyhow::Result<()> {
        let m = courses::ActiveModel {
            id: Set(c.id),
            title: Set(c.title.clone()),
            description: Set(c.description.clone()),
            preview: Set(c.preview.clone()),
            owner_id: Set(c.owner_id),
            price: Set(c.price),
        };
        m.update(&self.conn).await.context("update_course failed")?;
        Ok(())
    }

    async fn delete_course(&self, id: i64) -> anyhow::Result<bool> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let lesson_ids: Vec<i64> = lessons::Entity::find()
            .select_only()
            .column(lessons::Column::Id)
            .filter(lessons::Column::CourseId.eq(id))
            .into_tuple()
            .all(&txn)
            .await
            .context("load course lessons failed")?;

        payments::Entity::delete_many()
            .filter(
                payments::Column::CourseId
                    .eq(id)
                    .or(payments::Column::LessonId.is_in(lesson_ids)),
            )
            .exec(&txn)
            .await
            .context("delete course payments failed")?;
        subscriptions::Entity::delete_many()
            .filter(subscriptions::Column::CourseId.eq(id))
            .exec(&txn)
            .await
            .context("delete course subscriptions failed")?;
        lessons::Entity::delete_many()
            .filter(lessons::Column::CourseId.eq(id))
            .exec(&txn)
            .await
            .context("delete course lessons failed")?;
        let res = courses::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete course failed")?;

        txn.commit().await.context("commit failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn lesson_counts(&self, course_ids: &[i64]) -> anyhow::Result<HashMap<i64, u64>> {
        if course_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(i64, i64)> = lessons::Entity::find()
            .select_only()
            .column(lessons::Column::CourseId)
            .column_as(Expr::col(lessons::Column::Id).count(), "lesson_count")
            .filter(lessons::Column::CourseId.is_in(course_ids.iter().copied()))
            .group_by(lessons::Column::CourseId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("lesson_counts failed")?;
        Ok(rows
            .into_iter()
            .map(|(course_id, n)| (course_id, u64::try_from(n).unwrap_or(0)))
            .collect())
    }

    async fn list_lessons(&self, limit: u64, offset: u64) -> anyhow::Result<(Vec<Lesson>, u64)> {
        let query = lessons::Entity::find().order_by_asc(lessons::Column::Id);
        let (rows, total) = page(&self.conn, query, limit, offset)
            .await
            .context("list_lessons failed")?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn find_lesson(&self, id: i64) -> anyhow::Result<Option<Lesson>> {
        let found = lessons::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_lesson failed")?;
        Ok(found.map(Into::into))
    }

    async fn insert_lesson(&self, l: NewLesson) -> anyhow::Result<Lesson> {
        let m = lessons::ActiveModel {
            title: Set(l.title),
            description: Set(l.description),
            preview: Set(l.preview),
            url: Set(l.url),
            course_id: Set(l.course_id),
            owner_id: Set(l.owner_id),
            ..Default::default()
        };
        let inserted = m.insert(&self.conn).await.context("insert_lesson failed")?;
        Ok(inserted.into())
    }

    async fn update_lesson(&self, l: &Lesson) -> anyhow::Result<()> {
        let m = lessons::ActiveModel {
            id: Set(l.id),
            title: Set(l.title.clone()),
            description: Set(l.description.clone()),
            preview: Set(l.preview.clone()),
            url: Set(l.url.clone()),
            course_id: Set(l.course_id),
            owner_id: Set(l.owner_id),
        };
        m.update(&self.conn).await.context("update_lesson failed")?;
        Ok(())
    }

    async fn delete_lesson(&self, id: i64) -> anyhow::Result<bool> {
        let txn = self.conn.begin().await.context("begin failed")?;
        payments::Entity::delete_many()
            .filter(payments::Column::LessonId.eq(id))
            .exec(&txn)
            .await
            .context("delete lesson payments failed")?;
        let res = lessons::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete_lesson failed")?;
        txn.commit().await.context("commit failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn subscription_exists(&self, user_id: i64, course_id: i64) -> anyhow::Result<bool> {
        let count = subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::CourseId.eq(course_id))
            .count(&self.conn)
            .await
            .context("subscription_exists failed")?;
        Ok(count > 0)
    }

    async fn insert_subscription(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> anyhow::Result<SubscribeOutcome> {
        let m = subscriptions::ActiveModel {
            user_id: Set(user_id),
            course_id: Set(course_id),
            ..Default::default()
        };
        match m.insert(&self.conn).await {
            Ok(_) => Ok(SubscribeOutcome::Created),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(SubscribeOutcome::Duplicate)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert_subscription failed")),
        }
    }

    async fn delete_subscription(&self, user_id: i64, course_id: i64) -> anyhow::Result<bool> {
        let res = subscriptions::Entity::delete_many()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::CourseId.eq(course_id))
            .exec(&self.conn)
            .await
            .context("delete_subscription failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn subscriber_ids(&self, course_id: i64) -> anyhow::Result<Vec<i64>> {
        let ids: Vec<i64> = subscriptions::Entity::find()
            .select_only()
            .column(subscriptions::Column::UserId)
            .filter(subscriptions::Column::CourseId.eq(course_id))
            .order_by_asc(subscriptions::Column::Id)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("subscriber_ids failed")?;
        Ok(ids)
    }

    async fn subscribed_course_ids(
        &self,
        user_id: i64,
        course_ids: &[i64],
    ) -> anyhow::Result<HashSet<i64>> {
        if course_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<i64> = subscriptions::Entity::find()
            .select_only()
            .column(subscriptions::Column::CourseId)
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::CourseId.is_in(course_ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("subscribed_course_ids failed")?;
        Ok(ids.into_iter().collect())
    }

    async fn list_payments(
        &self,
        filter: &PaymentFilter,
        limit: u64,
        offset: u64,
    ) -> anyhow::Result<(Vec<Payment>, u64)> {
        let mut query = payments::Entity::find();
        if let Some(course_id) = filter.course_id {
            query = query.filter(payments::Column::CourseId.eq(course_id));
        }
        if let Some(lesson_id) = filter.lesson_id {
            query = query.filter(payments::Column::LessonId.eq(lesson_id));
        }
        if let Some(method) = filter.payment_method {
            query = query.filter(
                payments::Column::PaymentMethod.eq(payments::DbPaymentMethod::from(method)),
            );
        }
        query = match filter.order {
            DateOrder::Unordered => query,
            DateOrder::Ascending => query.order_by_asc(payments::Column::Date),
            DateOrder::Descending => query.order_by_desc(payments::Column::Date),
        };
        let query = query.order_by_asc(payments::Column::Id);

        let (rows, total) = page(&self.conn, query, limit, offset)
            .await
            .context("list_payments failed")?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn insert_payment(&self, p: NewPayment) -> anyhow::Result<Payment> {
        let m = payments::ActiveModel {
            user_id: Set(p.user_id),
            date: Set(p.date),
            course_id: Set(p.course_id),
            lesson_id: Set(p.lesson_id),
            amount: Set(Some(p.amount.unwrap_or(0))),
            payment_method: Set(p.payment_method.into()),
            ..Default::default()
        };
        let inserted = m.insert(&self.conn).await.context("insert_payment failed")?;
        Ok(inserted.into())
    }

    async fn purge(&self) -> anyhow::Result<PurgeStats> {
        let txn = self.conn.begin().await.context("begin failed")?;
        let payments = payments::Entity::delete_many()
            .exec(&txn)
            .await
            .context("purge payments failed")?
            .rows_affected;
        subscriptions::Entity::delete_many()
            .exec(&txn)
            .await
            .context("purge subscriptions failed")?;
        let lessons = lessons::Entity::delete_many()
            .exec(&txn)
            .await
            .context("purge lessons failed")?
            .rows_affected;
        let courses = courses::Entity::delete_many()
            .exec(&txn)
            .await
            .context("purge courses failed")?
            .rows_affected;
        txn.commit().await.context("commit failed")?;
        Ok(PurgeStats {
            payments,
            lessons,
            courses,
        })
    }
}
