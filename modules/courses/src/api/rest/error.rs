use axum::http::StatusCode;
use modkit::api::problem::{Problem, ProblemResponse};

use crate::domain::error::DomainError;

pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    ProblemResponse(
        Problem::coded(status, code, title, detail)
            .with_instance(instance)
            .with_current_span(),
    )
}

/// Map domain error to RFC 9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::CourseNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "COURSES_COURSE_NOT_FOUND",
            "Course not found",
            format!("Course with id {id} was not found"),
            instance,
        ),
        DomainError::LessonNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "COURSES_LESSON_NOT_FOUND",
            "Lesson not found",
            format!("Lesson with id {id} was not found"),
            instance,
        ),
        DomainError::Forbidden { message } => from_parts(
            StatusCode::FORBIDDEN,
            "COURSES_FORBIDDEN",
            "Forbidden",
            *message,
            instance,
        ),
        DomainError::AlreadySubscribed { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "COURSES_ALREADY_SUBSCRIBED",
            "Already subscribed",
            e.to_string(),
            instance,
        ),
        DomainError::NotSubscribed { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "COURSES_NOT_SUBSCRIBED",
            "Subscription not found",
            e.to_string(),
            instance,
        ),
        DomainError::Validation { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "COURSES_VALIDATION",
            "Validation error",
            e.to_string(),
            instance,
        ),
        DomainError::Database { .. } => {
            tracing::error!(error = ?e, "Internal courses error");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Internal error",
                "An internal error occurred",
                instance,
            )
        }
    }
}

/// 400 for malformed query parameters.
pub fn bad_query(detail: impl Into<String>, instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::BAD_REQUEST,
        "COURSES_BAD_QUERY",
        "Invalid query",
        detail,
        instance,
    )
}
