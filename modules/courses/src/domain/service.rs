use std::sync::Arc;

use modkit::Principal;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, Instrument};

use crate::contract::model::{
    Course, CoursePatch, CourseView, Lesson, LessonPatch, NewCourse, NewLesson, NewPayment, Page,
    Payment, PaymentFilter, PurgeStats,
};
use crate::domain::error::DomainError;
use crate::domain::permissions::{self, Rule};
use crate::domain::ports::CourseNotifier;
use crate::domain::repo::{CatalogRepository, SubscribeOutcome};

const MAX_COURSE_TITLE: usize = 20;
const MAX_LESSON_TITLE: usize = 50;

/// Catalog service: courses, lessons, subscriptions and payments.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn CatalogRepository>,
    notifier: Option<Arc<dyn CourseNotifier>>,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl Service {
    pub fn new(
        repo: Arc<dyn CatalogRepository>,
        notifier: Option<Arc<dyn CourseNotifier>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            notifier,
            config,
        }
    }

    fn window(&self, limit: Option<u64>, offset: Option<u64>) -> (u64, u64) {
        let max = self.config.max_page_size.max(1);
        let limit = limit.unwrap_or(self.config.default_page_size).clamp(1, max);
        (limit, offset.unwrap_or(0))
    }

    // --- courses ---

    #[instrument(name = "courses.service.list_courses", skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn list_courses(
        &self,
        caller: &Principal,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Page<CourseView>, DomainError> {
        let (limit, offset) = self.window(limit, offset);
        let (courses, total) = self
            .repo
            .list_courses(limit, offset)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let items = self.views(caller, courses).await?;
        debug!(count = items.len(), total, "Listed courses");
        Ok(Page {
            items,
            total,
            limit,
            offset,
        })
    }

    /// Admin-only gate of the create endpoints.
    pub fn authorize_create(&self, caller: &Principal) -> Result<(), DomainError> {
        if permissions::CREATE.allows(caller, None) {
            Ok(())
        } else {
            Err(DomainError::permission_denied())
        }
    }

    /// Lookup and access check of a course update, without applying it.
    pub async fn authorize_course_update(
        &self,
        caller: &Principal,
        id: i64,
    ) -> Result<(), DomainError> {
        let course = self.load_course(id).await?;
        check(permissions::UPDATE, caller, course.owner_id)
    }

    pub async fn authorize_lesson_update(
        &self,
        caller: &Principal,
        id: i64,
    ) -> Result<(), DomainError> {
        let lesson = self.load_lesson(id).await?;
        check(permissions::UPDATE, caller, lesson.owner_id)
    }

    #[instrument(name = "courses.service.create_course", skip(self, caller, new), fields(user_id = caller.user_id))]
    pub async fn create_course(
        &self,
        caller: &Principal,
        new: NewCourse,
    ) -> Result<CourseView, DomainError> {
        self.authorize_create(caller)?;
        validate_course(&new.title, &new.description, new.price)?;

        let course = self
            .repo
            .insert_course(new)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        info!(course_id = course.id, "Course created");
        Ok(CourseView {
            course,
            lesson_count: 0,
            is_subscribed: false,
        })
    }

    #[instrument(name = "courses.service.get_course", skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn get_course(&self, caller: &Principal, id: i64) -> Result<CourseView, DomainError> {
        let course = self.load_course(id).await?;
        check(permissions::RETRIEVE, caller, course.owner_id)?;
        self.view(caller, course).await
    }

    /// Apply `patch`, then notify subscribers in the background.
    #[instrument(name = "courses.service.update_course", skip(self, caller, patch), fields(user_id = caller.user_id))]
    pub async fn update_course(
        &self,
        caller: &Principal,
        id: i64,
        patch: CoursePatch,
    ) -> Result<CourseView, DomainError> {
        let mut course = self.load_course(id).await?;
        check(permissions::UPDATE, caller, course.owner_id)?;

        if let Some(v) = patch.title {
            course.title = v;
        }
        if let Some(v) = patch.description {
            course.description = v;
        }
        if let Some(v) = patch.preview {
            course.preview = (!v.is_empty()).then_some(v);
        }
        if let Some(v) = patch.owner_id {
            course.owner_id = Some(v);
        }
        if let Some(v) = patch.price {
            course.price = Some(v);
        }
        validate_course(&course.title, &course.description, course.price)?;

        self.repo
            .update_course(&course)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        info!(course_id = id, "Course updated");

        self.notify_course_updated(course.clone());
        self.view(caller, course).await
    }

    #[instrument(name = "courses.service.delete_course", skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn delete_course(&self, caller: &Principal, id: i64) -> Result<(), DomainError> {
        let course = self.load_course(id).await?;
        check(permissions::DESTROY, caller, course.owner_id)?;

        self.repo
            .delete_course(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        info!(course_id = id, "Course deleted");
        Ok(())
    }

    /// Spawn the subscriber notification; `None` when notifications are off.
    pub fn notify_course_updated(&self, course: Course) -> Option<JoinHandle<()>> {
        let notifier = self.notifier.clone()?;
        let repo = self.repo.clone();
        let span = tracing::info_span!("courses.notify_course_updated", course_id = course.id);

        Some(tokio::spawn(
            async move {
                let subscribers = match repo.subscriber_ids(course.id).await {
                    Ok(ids) => ids,
                    Err(e) => {
                        error!(error = %e, "Failed to load subscribers");
                        return;
                    }
                };
                if subscribers.is_empty() {
                    debug!("No subscribers, nothing to send");
                    return;
                }
                match notifier.course_updated(&course, &subscribers).await {
                    Ok(()) => info!(recipients = subscribers.len(), "Course update sent"),
                    Err(e) => error!(error = %e, "Course update notification failed"),
                }
            }
            .instrument(span),
        ))
    }

    // --- lessons ---

    #[instrument(name = "courses.service.list_lessons", skip(self, _caller))]
    pub async fn list_lessons(
        &self,
        _caller: &Principal,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Page<Lesson>, DomainError> {
        let (limit, offset) = self.window(limit, offset);
        let (items, total) = self
            .repo
            .list_lessons(limit, offset)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        Ok(Page {
            items,
            total,
            limit,
            offset,
        })
    }

    #[instrument(name = "courses.service.create_lesson", skip(self, caller, new), fields(user_id = caller.user_id, course_id = new.course_id))]
    pub async fn create_lesson(
        &self,
        caller: &Principal,
        new: NewLesson,
    ) -> Result<Lesson, DomainError> {
        self.authorize_create(caller)?;
        validate_lesson(&new.title, &new.description, &new.url)?;
        self.require_course_for_lesson(new.course_id).await?;

        let lesson = self
            .repo
            .insert_lesson(new)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        info!(lesson_id = lesson.id, "Lesson created");
        Ok(lesson)
    }

    #[instrument(name = "courses.service.get_lesson", skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn get_lesson(&self, caller: &Principal, id: i64) -> Result<Lesson, DomainError> {
        let lesson = self.load_lesson(id).await?;
        check(permissions::RETRIEVE, caller, lesson.owner_id)?;
        Ok(lesson)
    }

    #[instrument(name = "courses.service.update_lesson", skip(self, caller, patch), fields(user_id = caller.user_id))]
    pub async fn update_lesson(
        &self,
        caller: &Principal,
        id: i64,
        patch: LessonPatch,
    ) -> Result<Lesson, DomainError> {
        let mut lesson = self.load_lesson(id).await?;
        check(permissions::UPDATE, caller, lesson.owner_id)?;

        if let Some(v) = patch.title {
            lesson.title = v;
        }
        if let Some(v) = patch.description {
            lesson.description = v;
        }
        if let Some(v) = patch.preview {
            lesson.preview = (!v.is_empty()).then_some(v);
        }
        if let Some(v) = patch.url {
            lesson.url = v;
        }
        if let Some(v) = patch.owner_id {
            lesson.owner_id = Some(v);
        }
        if let Some(course_id) = patch.course_id {
            if course_id != lesson.course_id {
                self.require_course_for_lesson(course_id).await?;
                lesson.course_id = course_id;
            }
        }
        validate_lesson(&lesson.title, &lesson.description, &lesson.url)?;

        self.repo
            .update_lesson(&lesson)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        info!(lesson_id = id, "Lesson updated");
        Ok(lesson)
    }

    #[instrument(name = "courses.service.delete_lesson", skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn delete_lesson(&self, caller: &Principal, id: i64) -> Result<(), DomainError> {
        let lesson = self.load_lesson(id).await?;
        check(permissions::DESTROY, caller, lesson.owner_id)?;
        self.repo
            .delete_lesson(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        info!(lesson_id = id, "Lesson deleted");
        Ok(())
    }

    // --- subscriptions ---

    /// Subscribe the caller. A second subscribe, sequential or concurrent,
    /// fails with `AlreadySubscribed` and stores nothing.
    #[instrument(name = "courses.service.subscribe", skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn subscribe(&self, caller: &Principal, course_id: i64) -> Result<(), DomainError> {
        self.load_course(course_id).await?;

        if self
            .repo
            .subscription_exists(caller.user_id, course_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            return Err(DomainError::AlreadySubscribed { course_id });
        }

        match self
            .repo
            .insert_subscription(caller.user_id, course_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            SubscribeOutcome::Created => {
                info!("Subscribed");
                Ok(())
            }
            SubscribeOutcome::Duplicate => Err(DomainError::AlreadySubscribed { course_id }),
        }
    }

    #[instrument(name = "courses.service.unsubscribe", skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn unsubscribe(&self, caller: &Principal, course_id: i64) -> Result<(), DomainError> {
        self.load_course(course_id).await?;

        let removed = self
            .repo
            .delete_subscription(caller.user_id, course_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !removed {
            return Err(DomainError::NotSubscribed { course_id });
        }
        info!("Unsubscribed");
        Ok(())
    }

    // --- payments ---

    #[instrument(name = "courses.service.list_payments", skip(self, _caller))]
    pub async fn list_payments(
        &self,
        _caller: &Principal,
        filter: PaymentFilter,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Page<Payment>, DomainError> {
        let (limit, offset) = self.window(limit, offset);
        let (items, total) = self
            .repo
            .list_payments(&filter, limit, offset)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        Ok(Page {
            items,
            total,
            limit,
            offset,
        })
    }

    #[instrument(name = "courses.service.record_payment", skip(self, p), fields(user_id = p.user_id))]
    pub async fn record_payment(&self, p: NewPayment) -> Result<Payment, DomainError> {
        if p.amount.is_some_and(|a| a < 0) {
            return Err(DomainError::validation("amount", "must not be negative"));
        }
        let payment = self
            .repo
            .insert_payment(p)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!(payment_id = payment.id, "Payment recorded");
        Ok(payment)
    }

    // --- admin ---

    /// Trusted lookup without permission checks.
    pub async fn find_course(&self, id: i64) -> Result<Course, DomainError> {
        self.load_course(id).await
    }

    #[instrument(name = "courses.service.purge_catalog", skip(self))]
    pub async fn purge_catalog(&self) -> Result<PurgeStats, DomainError> {
        let stats = self
            .repo
            .purge()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        info!(
            payments = stats.payments,
            lessons = stats.lessons,
            courses = stats.courses,
            "Catalog purged"
        );
        Ok(stats)
    }

    // --- helpers ---

    async fn load_course(&self, id: i64) -> Result<Course, DomainError> {
        self.repo
            .find_course(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::course_not_found(id))
    }

    async fn load_lesson(&self, id: i64) -> Result<Lesson, DomainError> {
        self.repo
            .find_lesson(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::lesson_not_found(id))
    }

    /// A lesson's course must exist; a missing one is a client error, not a 404.
    async fn require_course_for_lesson(&self, course_id: i64) -> Result<(), DomainError> {
        let exists = self
            .repo
            .find_course(course_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .is_some();
        if exists {
            Ok(())
        } else {
            Err(DomainError::validation(
                "course",
                format!("course {course_id} does not exist"),
            ))
        }
    }

    async fn view(&self, caller: &Principal, course: Course) -> Result<CourseView, DomainError> {
        let mut views = self.views(caller, vec![course]).await?;
        views
            .pop()
            .ok_or_else(|| DomainError::database("course view lost"))
    }

    /// Decorate courses with lesson counts and the caller's subscription flag.
    async fn views(
        &self,
        caller: &Principal,
        courses: Vec<Course>,
    ) -> Result<Vec<CourseView>, DomainError> {
        let ids: Vec<i64> = courses.iter().map(|c| c.id).collect();
        let counts = self
            .repo
            .lesson_counts(&ids)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        let subscribed = self
            .repo
            .subscribed_course_ids(caller.user_id, &ids)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        Ok(courses
            .into_iter()
            .map(|course| CourseView {
                lesson_count: counts.get(&course.id).copied().unwrap_or(0),
                is_subscribed: subscribed.contains(&course.id),
                course,
            })
            .collect())
    }
}

fn check(rule: Rule, caller: &Principal, owner_id: Option<i64>) -> Result<(), DomainError> {
    if rule.allows(caller, owner_id) {
        Ok(())
    } else {
        debug!(?rule, user_id = caller.user_id, "Access denied");
        Err(DomainError::not_owner())
    }
}

fn validate_title(title: &str, max: usize) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::validation("title", "must not be empty"));
    }
    // Titles are stored as sent, so the limit applies to the raw length.
    let len = title.chars().count();
    if len > max {
        return Err(DomainError::validation(
            "title",
            format!("too long: {len} characters (max: {max})"),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), DomainError> {
    if description.trim().is_empty() {
        return Err(DomainError::validation("description", "must not be empty"));
    }
    Ok(())
}

fn validate_course(title: &str, description: &str, price: Option<i64>) -> Result<(), DomainError> {
    validate_title(title, MAX_COURSE_TITLE)?;
    validate_description(description)?;
    if price.is_some_and(|p| p < 0) {
        return Err(DomainError::validation("price", "must not be negative"));
    }
    Ok(())
}

fn validate_lesson(title: &str, description: &str, video_url: &str) -> Result<(), DomainError> {
    validate_title(title, MAX_LESSON_TITLE)?;
    validate_description(description)?;
    match url::Url::parse(video_url) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.has_host() => Ok(()),
        _ => Err(DomainError::validation(
            "url",
            format!("'{video_url}' is not an absolute http(s) URL"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_title_is_limited_to_20_chars() {
        assert!(validate_course("Основы Rust", "d", Some(0)).is_ok());
        assert!(validate_course(&"я".repeat(20), "d", None).is_ok());
        assert!(validate_course(&"я".repeat(21), "d", None).is_err());
        assert!(validate_course("   ", "d", None).is_err());
    }

    #[test]
    fn too_long_title_reports_the_stored_length() {
        let padded = format!("  {}", "я".repeat(19));
        let err = validate_course(&padded, "d", None).unwrap_err();
        assert!(err.to_string().contains("21 characters"), "{err}");
    }

    #[test]
    fn negative_price_is_rejected() {
        assert!(matches!(
            validate_course("t", "d", Some(-1)),
            Err(DomainError::Validation { ref field, .. }) if field == "price"
        ));
    }

    #[test]
    fn lesson_url_must_be_absolute_http() {
        assert!(validate_lesson("t", "d", "https://youtube.com/watch?v=1").is_ok());
        assert!(validate_lesson("t", "d", "http://video.local/1").is_ok());
        for bad in ["youtube.com/watch", "ftp://host/file", "/relative", ""] {
            assert!(validate_lesson("t", "d", bad).is_err(), "{bad}");
        }
        assert!(validate_lesson(&"x".repeat(51), "d", "https://a.io").is_err());
    }
}
