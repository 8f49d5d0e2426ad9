use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::contract::model::{
    Course, Lesson, NewCourse, NewLesson, NewPayment, Payment, PaymentFilter, PurgeStats,
};

/// Outcome of a subscription insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Created,
    /// The (user, course) pair already exists.
    Duplicate,
}

/// Persistence port for the catalog.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    // courses
    async fn list_courses(&self, limit: u64, offset: u64) -> anyhow::Result<(Vec<Course>, u64)>;
    async fn find_course(&self, id: i64) -> anyhow::Result<Option<Course>>;
    async fn insert_course(&self, c: NewCourse) -> anyhow::Result<Course>;
    async fn update_course(&self, c: &Course) -> anyhow::Result<()>;
    /// Removes the course with its lessons, subscriptions and payments atomically.
    async fn delete_course(&self, id: i64) -> anyhow::Result<bool>;
    /// Lesson count per course; courses without lessons are absent.
    async fn lesson_counts(&self, course_ids: &[i64]) -> anyhow::Result<HashMap<i64, u64>>;

    // lessons
    async fn list_lessons(&self, limit: u64, offset: u64) -> anyhow::Result<(Vec<Lesson>, u64)>;
    async fn find_lesson(&self, id: i64) -> anyhow::Result<Option<Lesson>>;
    async fn insert_lesson(&self, l: NewLesson) -> anyhow::Result<Lesson>;
    async fn update_lesson(&self, l: &Lesson) -> anyhow::Result<()>;
    async fn delete_lesson(&self, id: i64) -> anyhow::Result<bool>;

    // subscriptions
    async fn subscription_exists(&self, user_id: i64, course_id: i64) -> anyhow::Result<bool>;
    async fn insert_subscription(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> anyhow::Result<SubscribeOutcome>;
    async fn delete_subscription(&self, user_id: i64, course_id: i64) -> anyhow::Result<bool>;
    async fn subscriber_ids(&self, course_id: i64) -> anyhow::Result<Vec<i64>>;
    /// Subset of `course_ids` the user is subscribed to.
    async fn subscribed_course_ids(
        &self,
        user_id: i64,
        course_ids: &[i64],
    ) -> anyhow::Result<HashSet<i64>>;

    // payments
    async fn list_payments(
        &self,
        filter: &PaymentFilter,
        limit: u64,
        offset: u64,
    ) -> anyhow::Result<(Vec<Payment>, u64)>;
    async fn insert_payment(&self, p: NewPayment) -> anyhow::Result<Payment>;

    /// Delete payments, lessons, subscriptions and courses in one transaction.
    async fn purge(&self) -> anyhow::Result<PurgeStats>;
}
