use async_trait::async_trait;

use crate::contract::model::Course;

/// Outbound notification about a changed course.
#[async_trait]
pub trait CourseNotifier: Send + Sync {
    /// Tell `subscriber_ids` that `course` changed. Empty lists send nothing.
    async fn course_updated(&self, course: &Course, subscriber_ids: &[i64]) -> anyhow::Result<()>;
}
