use std::{future::Future, sync::Arc};

use axum::{
    extract::{Extension, Path, Query},
    http::{StatusCode, Uri},
    Json,
};
use modkit::{
    api::problem::ProblemResponse, Authenticated, Detail, JsonBody, PageDto, PageQuery, Problem,
};
use tracing::{error, info};

use crate::api::rest::dto::{
    parse_ordering, CourseDto, CoursePatchReq, CourseReq, LessonDto, LessonPatchReq, LessonReq,
    PaymentDto, PaymentsQuery,
};
use crate::api::rest::error::{bad_query, map_domain_error};
use crate::contract::model::{Page, PaymentFilter, PaymentMethod};
use crate::domain::error::{DomainError, MSG_SUBSCRIBED, MSG_UNSUBSCRIBED};
use crate::domain::service::Service;

fn page_dto<T, U: From<T>>(page: Page<T>) -> PageDto<U> {
    PageDto {
        items: page.items.into_iter().map(U::from).collect(),
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    }
}

/// Unwraps the request body; on a body error the access check runs first
/// and its error takes precedence.
async fn checked_body<T>(
    body: Result<JsonBody<T>, ProblemResponse>,
    access: impl Future<Output = Result<(), DomainError>>,
    path: &str,
) -> Result<T, ProblemResponse> {
    match body {
        Ok(JsonBody(value)) => Ok(value),
        Err(rejection) => {
            access.await.map_err(|e| map_domain_error(&e, path))?;
            Err(rejection)
        }
    }
}

// --- courses ---

/// List courses
#[utoipa::path(
    get,
    path = "/courses",
    tag = "courses",
    operation_id = "courses.list",
    security(("token" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Page of courses", body = PageDto<CourseDto>),
        (status = 401, description = "Unauthorized", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn list_courses(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Query(q): Query<PageQuery>,
) -> Result<Json<PageDto<CourseDto>>, ProblemResponse> {
    svc.list_courses(&caller, q.limit, q.offset)
        .await
        .map(|page| Json(page_dto(page)))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

/// Create a course (admin only)
#[utoipa::path(
    post,
    path = "/courses",
    tag = "courses",
    operation_id = "courses.create",
    security(("token" = [])),
    request_body = CourseReq,
    responses(
        (status = 201, description = "Course created", body = CourseDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Forbidden", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn create_course(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    body: Result<JsonBody<CourseReq>, ProblemResponse>,
) -> Result<(StatusCode, Json<CourseDto>), ProblemResponse> {
    let req = checked_body(body, async { svc.authorize_create(&caller) }, uri.path()).await?;
    info!(title = %req.title, "Creating course");

    match svc.create_course(&caller, req.into()).await {
        Ok(view) => Ok((StatusCode::CREATED, Json(view.into()))),
        Err(e) => {
            error!("Failed to create course: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Get a course
#[utoipa::path(
    get,
    path = "/courses/{id}",
    tag = "courses",
    operation_id = "courses.get",
    security(("token" = [])),
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course", body = CourseDto),
        (status = 403, description = "Forbidden", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not found", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn get_course(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<CourseDto>, ProblemResponse> {
    svc.get_course(&caller, id)
        .await
        .map(|v| Json(v.into()))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

/// Replace a course
#[utoipa::path(
    put,
    path = "/courses/{id}",
    tag = "courses",
    operation_id = "courses.replace",
    security(("token" = [])),
    params(("id" = i64, Path, description = "Course id")),
    request_body = CourseReq,
    responses(
        (status = 200, description = "Updated course", body = CourseDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Forbidden", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not found", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn replace_course(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
    body: Result<JsonBody<CourseReq>, ProblemResponse>,
) -> Result<Json<CourseDto>, ProblemResponse> {
    let access = svc.authorize_course_update(&caller, id);
    let req = checked_body(body, access, uri.path()).await?;
    svc.update_course(&caller, id, req.into())
        .await
        .map(|v| Json(v.into()))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

/// Partially update a course
#[utoipa::path(
    patch,
    path = "/courses/{id}",
    tag = "courses",
    operation_id = "courses.update",
    security(("token" = [])),
    params(("id" = i64, Path, description = "Course id")),
    request_body = CoursePatchReq,
    responses(
        (status = 200, description = "Updated course", body = CourseDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Forbidden", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not found", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn update_course(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
    body: Result<JsonBody<CoursePatchReq>, ProblemResponse>,
) -> Result<Json<CourseDto>, ProblemResponse> {
    let access = svc.authorize_course_update(&caller, id);
    let req = checked_body(body, access, uri.path()).await?;
    info!(course_id = id, "Updating course");

    match svc.update_course(&caller, id, req.into()).await {
        Ok(view) => Ok(Json(view.into())),
        Err(e) => {
            error!("Failed to update course {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Delete a course with its lessons, subscriptions and payments
#[utoipa::path(
    delete,
    path = "/courses/{id}",
    tag = "courses",
    operation_id = "courses.delete",
    security(("token" = [])),
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Forbidden", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not found", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn delete_course(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<StatusCode, ProblemResponse> {
    info!(course_id = id, "Deleting course");

    match svc.delete_course(&caller, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete course {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Subscribe the caller to a course
#[utoipa::path(
    post,
    path = "/courses/{id}/subscribe",
    tag = "courses",
    operation_id = "courses.subscribe",
    security(("token" = [])),
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = 201, description = "Subscribed", body = Detail),
        (status = 400, description = "Already subscribed", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Course not found", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn subscribe(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<Detail>), ProblemResponse> {
    svc.subscribe(&caller, id)
        .await
        .map(|()| (StatusCode::CREATED, Json(Detail::new(MSG_SUBSCRIBED))))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

/// Unsubscribe the caller from a course
#[utoipa::path(
    delete,
    path = "/courses/{id}/subscribe",
    tag = "courses",
    operation_id = "courses.unsubscribe",
    security(("token" = [])),
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Unsubscribed", body = Detail),
        (status = 404, description = "Course or subscription not found", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn unsubscribe(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<Detail>, ProblemResponse> {
    svc.unsubscribe(&caller, id)
        .await
        .map(|()| Json(Detail::new(MSG_UNSUBSCRIBED)))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

// --- lessons ---

/// List lessons
#[utoipa::path(
    get,
    path = "/lessons",
    tag = "lessons",
    operation_id = "lessons.list",
    security(("token" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Page of lessons", body = PageDto<LessonDto>),
        (status = 401, description = "Unauthorized", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn list_lessons(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Query(q): Query<PageQuery>,
) -> Result<Json<PageDto<LessonDto>>, ProblemResponse> {
    svc.list_lessons(&caller, q.limit, q.offset)
        .await
        .map(|page| Json(page_dto(page)))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

/// Create a lesson (admin only)
#[utoipa::path(
    post,
    path = "/lessons",
    tag = "lessons",
    operation_id = "lessons.create",
    security(("token" = [])),
    request_body = LessonReq,
    responses(
        (status = 201, description = "Lesson created", body = LessonDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Forbidden", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn create_lesson(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    body: Result<JsonBody<LessonReq>, ProblemResponse>,
) -> Result<(StatusCode, Json<LessonDto>), ProblemResponse> {
    let req = checked_body(body, async { svc.authorize_create(&caller) }, uri.path()).await?;
    info!(course_id = req.course_id, "Creating lesson");

    match svc.create_lesson(&caller, req.into()).await {
        Ok(lesson) => Ok((StatusCode::CREATED, Json(lesson.into()))),
        Err(e) => {
            error!("Failed to create lesson: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Get a lesson
#[utoipa::path(
    get,
    path = "/lessons/{id}",
    tag = "lessons",
    operation_id = "lessons.get",
    security(("token" = [])),
    params(("id" = i64, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Lesson", body = LessonDto),
        (status = 403, description = "Forbidden", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not found", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn get_lesson(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<LessonDto>, ProblemResponse> {
    svc.get_lesson(&caller, id)
        .await
        .map(|l| Json(l.into()))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

/// Replace a lesson
#[utoipa::path(
    put,
    path = "/lessons/{id}",
    tag = "lessons",
    operation_id = "lessons.replace",
    security(("token" = [])),
    params(("id" = i64, Path, description = "Lesson id")),
    request_body = LessonReq,
    responses(
        (status = 200, description = "Updated lesson", body = LessonDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Forbidden", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not found", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn replace_lesson(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
    body: Result<JsonBody<LessonReq>, ProblemResponse>,
) -> Result<Json<LessonDto>, ProblemResponse> {
    let access = svc.authorize_lesson_update(&caller, id);
    let req = checked_body(body, access, uri.path()).await?;
    svc.update_lesson(&caller, id, req.into())
        .await
        .map(|l| Json(l.into()))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

/// Partially update a lesson
#[utoipa::path(
    patch,
    path = "/lessons/{id}",
    tag = "lessons",
    operation_id = "lessons.update",
    security(("token" = [])),
    params(("id" = i64, Path, description = "Lesson id")),
    request_body = LessonPatchReq,
    responses(
        (status = 200, description = "Updated lesson", body = LessonDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Forbidden", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not found", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn update_lesson(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
    body: Result<JsonBody<LessonPatchReq>, ProblemResponse>,
) -> Result<Json<LessonDto>, ProblemResponse> {
    let access = svc.authorize_lesson_update(&caller, id);
    let req = checked_body(body, access, uri.path()).await?;
    svc.update_lesson(&caller, id, req.into())
        .await
        .map(|l| Json(l.into()))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

/// Delete a lesson
#[utoipa::path(
    delete,
    path = "/lessons/{id}",
    tag = "lessons",
    operation_id = "lessons.delete",
    security(("token" = [])),
    params(("id" = i64, Path, description = "Lesson id")),
    responses(
        (status = 204, description = "Lesson deleted"),
        (status = 403, description = "Forbidden", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not found", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn delete_lesson(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<i64>,
) -> Result<StatusCode, ProblemResponse> {
    info!(lesson_id = id, "Deleting lesson");

    match svc.delete_lesson(&caller, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete lesson {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

// --- payments ---

/// List payments with exact-match filters
#[utoipa::path(
    get,
    path = "/payments",
    tag = "payments",
    operation_id = "payments.list",
    security(("token" = [])),
    params(PaymentsQuery),
    responses(
        (status = 200, description = "Page of payments", body = PageDto<PaymentDto>),
        (status = 400, description = "Bad query", body = Problem, content_type = "application/problem+json"),
        (status = 401, description = "Unauthorized", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn list_payments(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Query(q): Query<PaymentsQuery>,
) -> Result<Json<PageDto<PaymentDto>>, ProblemResponse> {
    let order = parse_ordering(q.ordering.as_deref()).map_err(|m| bad_query(m, uri.path()))?;
    let payment_method = q
        .payment_method
        .as_deref()
        .filter(|m| !m.is_empty())
        .map(str::parse::<PaymentMethod>)
        .transpose()
        .map_err(|m| bad_query(m, uri.path()))?;

    let filter = PaymentFilter {
        course_id: q.course,
        lesson_id: q.lesson,
        payment_method,
        order,
    };
    svc.list_payments(&caller, filter, q.limit, q.offset)
        .await
        .map(|page| Json(page_dto(page)))
        .map_err(|e| map_domain_error(&e, uri.path()))
}
