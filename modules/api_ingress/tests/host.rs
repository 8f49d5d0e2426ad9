//! REST host flow: prepare → module routes → finalize, then serve.

use std::sync::Arc;

use api_ingress::{ApiIngress, ApiIngressConfig};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use modkit::{
    contracts::{OpenApiRegistry, RestHostModule, StatefulModule},
    Authenticated, ClientHub, ModuleCtx, ModuleCtxBuilder, Principal, Role, TokenAuthenticator,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use utoipa::OpenApi;

struct StaticTokens;

#[async_trait]
impl TokenAuthenticator for StaticTokens {
    async fn authenticate(&self, token: &str) -> anyhow::Result<Option<Principal>> {
        Ok((token == "secret").then(|| Principal {
            user_id: 1,
            email: "admin@example.com".into(),
            role: Role::Member,
            is_admin: true,
        }))
    }
}

/// Who am I
#[utoipa::path(get, path = "/whoami", responses((status = 200, description = "Caller email")))]
async fn whoami(Authenticated(p): Authenticated) -> String {
    p.email
}

#[derive(OpenApi)]
#[openapi(paths(whoami))]
struct WhoamiDoc;

fn ctx(hub: Arc<ClientHub>) -> ModuleCtx {
    ModuleCtxBuilder::new(CancellationToken::new())
        .with_client_hub(hub)
        .for_module("api_ingress")
        .build()
}

fn finalized_router(host: &ApiIngress, with_auth: bool) -> Router {
    let hub = Arc::new(ClientHub::new());
    if with_auth {
        hub.register::<dyn TokenAuthenticator>(Arc::new(StaticTokens));
    }
    let ctx = ctx(hub);

    let router = host.rest_prepare(&ctx, Router::new()).unwrap();
    host.as_registry().register_doc(WhoamiDoc::openapi());
    let router = router.route("/whoami", get(whoami));
    host.rest_finalize(&ctx, router).unwrap()
}

async fn send(router: Router, uri: &str, auth: Option<&str>) -> axum::response::Response {
    let mut req = Request::builder().uri(uri);
    if let Some(a) = auth {
        req = req.header("authorization", a);
    }
    router.oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let host = ApiIngress::new(ApiIngressConfig::default());
    let router = finalized_router(&host, true);

    let resp = send(router.clone(), "/health", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let resp = send(router, "/openapi.json", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(doc["info"]["title"], "CourseHub API");
    assert!(doc["paths"]["/whoami"]["get"].is_object());
    assert!(doc["components"]["securitySchemes"]["token"].is_object());
}

#[tokio::test]
async fn docs_can_be_disabled() {
    let host = ApiIngress::new(ApiIngressConfig {
        enable_docs: false,
        ..Default::default()
    });
    let router = finalized_router(&host, true);
    let resp = send(router, "/openapi.json", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn token_middleware_guards_module_routes() {
    let host = ApiIngress::new(ApiIngressConfig::default());
    let router = finalized_router(&host, true);

    let resp = send(router.clone(), "/whoami", Some("Token secret")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(router.clone(), "/whoami", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/problem+json"
    );

    let resp = send(router, "/whoami", Some("Token wrong")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn without_authenticator_requests_stay_anonymous() {
    let host = ApiIngress::new(ApiIngressConfig::default());
    let router = finalized_router(&host, false);
    let resp = send(router, "/whoami", Some("Token secret")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn start_binds_and_stop_releases() {
    let host = ApiIngress::new(ApiIngressConfig {
        bind_addr: "127.0.0.1:0".into(),
        ..Default::default()
    });
    finalized_router(&host, false);

    let cancel = CancellationToken::new();
    host.start(cancel.clone()).await.unwrap();
    let addr = host.local_addr().expect("bound address");
    assert_ne!(addr.port(), 0);
    assert!(tokio::net::TcpStream::connect(addr).await.is_ok());

    cancel.cancel();
    host.stop(CancellationToken::new()).await.unwrap();
}

#[tokio::test]
async fn start_without_finalize_fails() {
    let host = ApiIngress::new(ApiIngressConfig {
        bind_addr: "127.0.0.1:0".into(),
        ..Default::default()
    });
    assert!(host.start(CancellationToken::new()).await.is_err());
}
