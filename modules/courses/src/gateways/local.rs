use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::CoursesApi,
    error::CoursesError,
    model::{Course, NewPayment, Payment, PurgeStats},
};
use crate::domain::{error::DomainError, service::Service};

/// In-process client: delegates to the domain service.
pub struct CoursesLocalClient {
    service: Arc<Service>,
}

impl CoursesLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CoursesApi for CoursesLocalClient {
    async fn get_course(&self, id: i64) -> anyhow::Result<Course> {
        self.service.find_course(id).await.map_err(to_anyhow)
    }

    async fn record_payment(&self, payment: NewPayment) -> anyhow::Result<Payment> {
        self.service.record_payment(payment).await.map_err(to_anyhow)
    }

    async fn purge_catalog(&self) -> anyhow::Result<PurgeStats> {
        self.service.purge_catalog().await.map_err(to_anyhow)
    }
}

impl From<DomainError> for CoursesError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::CourseNotFound { id } => CoursesError::not_found("course", id),
            DomainError::LessonNotFound { id } => CoursesError::not_found("lesson", id),
            DomainError::Validation { field, message } => {
                CoursesError::validation(format!("{field}: {message}"))
            }
            DomainError::Forbidden { message } => CoursesError::validation(message),
            DomainError::AlreadySubscribed { .. } | DomainError::NotSubscribed { .. } => {
                CoursesError::validation(e.to_string())
            }
            DomainError::Database { .. } => CoursesError::internal(),
        }
    }
}

fn to_anyhow(e: DomainError) -> anyhow::Error {
    if matches!(e, DomainError::Database { .. }) {
        tracing::error!(error = %e, "courses call failed");
    }
    anyhow::Error::new(CoursesError::from(e))
}
