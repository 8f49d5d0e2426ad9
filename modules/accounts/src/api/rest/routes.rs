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
    paths(handlers::register, handlers::login, handlers::me, handlers::update_me),
    components(schemas(
        dto::UserDto,
        dto::RegisterReq,
        dto::LoginReq,
        dto::LoginResp,
        dto::UpdateMeReq,
        modkit::Problem
    )),
    tags((name = "users", description = "Accounts, login and profile"))
)]
pub struct ApiDoc;

pub fn register_routes(
    router: Router,
    openapi: &dyn OpenApiRegistry,
    service: Arc<Service>,
) -> anyhow::Result<Router> {
    openapi.register_doc(ApiDoc::openapi());

    let users = Router::new()
        .route("/users", post(handlers::register))
        .route("/users/login", post(handlers::login))
        .route("/users/me", get(handlers::me).patch(handlers::update_me))
        .layer(Extension(service));

    Ok(router.merge(users))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_user_paths() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert!(doc["paths"]["/users/login"]["post"].is_object());
        assert!(doc["paths"]["/users/me"]["patch"].is_object());
        assert!(doc["components"]["schemas"]["LoginResp"].is_object());
    }
}
