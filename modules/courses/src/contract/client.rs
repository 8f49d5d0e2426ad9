use async_trait::async_trait;

use crate::contract::model::{Course, NewPayment, Payment, PurgeStats};

/// Public API of the courses module for other modules and admin tooling.
/// No permission checks: callers are trusted.
#[async_trait]
pub trait CoursesApi: Send + Sync {
    async fn get_course(&self, id: i64) -> anyhow::Result<Course>;

    /// Append a payment record.
    async fn record_payment(&self, payment: NewPayment) -> anyhow::Result<Payment>;

    /// Delete all payments, lessons and courses, in that order.
    async fn purge_catalog(&self) -> anyhow::Result<PurgeStats>;
}
