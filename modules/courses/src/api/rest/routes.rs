use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use modkit::OpenApiRegistry;
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_courses,
        handlers::create_course,
        handlers::get_course,
        handlers::replace_course,
        handlers::update_course,
        handlers::delete_course,
        handlers::subscribe,
        handlers::unsubscribe,
        handlers::list_lessons,
        handlers::create_lesson,
        handlers::get_lesson,
        handlers::replace_lesson,
        handlers::update_lesson,
        handlers::delete_lesson,
        handlers::list_payments,
    ),
    components(schemas(
        dto::CourseDto,
        dto::CourseReq,
        dto::CoursePatchReq,
        dto::LessonDto,
        dto::LessonReq,
        dto::LessonPatchReq,
        dto::PaymentDto,
        crate::contract::model::PaymentMethod,
        modkit::Detail,
        modkit::Problem
    )),
    tags(
        (name = "courses", description = "Course catalog and subscriptions"),
        (name = "lessons", description = "Lessons of a course"),
        (name = "payments", description = "Payment history")
    )
)]
pub struct ApiDoc;

pub fn register_routes(
    router: Router,
    openapi: &dyn OpenApiRegistry,
    service: Arc<Service>,
) -> anyhow::Result<Router> {
    openapi.register_doc(ApiDoc::openapi());

    let catalog = Router::new()
        .route(
            "/courses",
            get(handlers::list_courses).post(handlers::create_course),
        )
        .route(
            "/courses/{id}",
            get(handlers::get_course)
                .put(handlers::replace_course)
                .patch(handlers::update_course)
                .delete(handlers::delete_course),
        )
        .route(
            "/courses/{id}/subscribe",
            post(handlers::subscribe).delete(handlers::unsubscribe),
        )
        .route(
            "/lessons",
            get(handlers::list_lessons).post(handlers::create_lesson),
        )
        .route(
            "/lessons/{id}",
            get(handlers::get_lesson)
                .put(handlers::replace_lesson)
                .patch(handlers::update_lesson)
                .delete(handlers::delete_lesson),
        )
        .route("/payments", get(handlers::list_payments))
        .layer(Extension(service));

    Ok(router.merge(catalog))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_catalog_paths() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert!(doc["paths"]["/courses/{id}/subscribe"]["post"].is_object());
        assert!(doc["paths"]["/courses/{id}/subscribe"]["delete"].is_object());
        assert!(doc["paths"]["/lessons/{id}"]["patch"].is_object());
        assert!(doc["paths"]["/payments"]["get"].is_object());
        assert!(doc["components"]["schemas"]["CourseDto"].is_object());
    }
}
