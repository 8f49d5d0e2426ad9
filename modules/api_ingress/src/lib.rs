//! HTTP host for the CourseHub server.
//!
//! Owns the router between the REST phases, merges the OpenAPI documents of
//! feature modules, applies the global middleware stack and serves until
//! the runtime token is cancelled.

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{http::StatusCode, middleware::from_fn, routing::get, Router};
use modkit::{
    contracts::{OpenApiRegistry, RestHostModule, StatefulModule},
    security::{authenticate_request, TokenAuthenticator},
    Lifecycle, ModuleCtx,
};
use parking_lot::{Mutex, RwLock};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use utoipa::openapi::{
    security::{ApiKey, ApiKeyValue, SecurityScheme},
    ComponentsBuilder, InfoBuilder, OpenApi, OpenApiBuilder,
};

mod config;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

pub const MODULE_NAME: &str = "api_ingress";

#[derive(Default)]
pub struct ApiIngress {
    config: RwLock<ApiIngressConfig>,
    docs: Mutex<Vec<OpenApi>>,
    final_router: Mutex<Option<Router>>,
    local_addr: Mutex<Option<SocketAddr>>,
    lifecycle: Lifecycle,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config: RwLock::new(config),
            ..Default::default()
        }
    }

    pub fn config(&self) -> ApiIngressConfig {
        self.config.read().clone()
    }

    /// Address the server is bound to (known after `start`).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Router kept by `rest_finalize`.
    pub fn router(&self) -> Option<Router> {
        self.final_router.lock().clone()
    }

    /// Merge every registered module document into one.
    pub fn build_openapi(&self) -> OpenApi {
        let components = ComponentsBuilder::new()
            .security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "`Token <key>` as returned by POST /users/login",
                ))),
            )
            .build();

        let mut doc = OpenApiBuilder::new()
            .info(
                InfoBuilder::new()
                    .title("CourseHub API")
                    .version(env!("CARGO_PKG_VERSION"))
                    .description(Some("Courses, lessons, subscriptions and payments"))
                    .build(),
            )
            .components(Some(components))
            .build();

        for module_doc in self.docs.lock().iter() {
            doc.merge(module_doc.clone());
        }
        doc
    }

    /// Global middleware, outermost first:
    /// SetRequestId → PropagateRequestId → Trace → push_req_id → Timeout → CORS → BodyLimit → auth.
    fn apply_layers(
        &self,
        mut router: Router,
        authenticator: Option<Arc<dyn TokenAuthenticator>>,
    ) -> Router {
        let cfg = self.config();

        if let Some(auth) = authenticator {
            router = router.layer(axum::middleware::from_fn_with_state(auth, authenticate_request));
        }
        router = router.layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes));
        if cfg.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }
        if cfg.request_timeout_secs > 0 {
            router = router.layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(cfg.request_timeout_secs),
            ));
        }

        // Set must wrap Propagate so a generated id reaches the response.
        let x_request_id = request_id::header();
        router
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(request_id::create_trace_layer())
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::NanoRequestId))
    }
}

#[async_trait]
impl modkit::Module for ApiIngress {
    async fn init(&self, ctx: &ModuleCtx) -> Result<()> {
        let cfg = ctx.module_config::<ApiIngressConfig>();
        tracing::debug!(bind_addr = %cfg.bind_addr, "api_ingress configured");
        *self.config.write() = cfg;
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl RestHostModule for ApiIngress {
    fn rest_prepare(&self, _ctx: &ModuleCtx, router: Router) -> Result<Router> {
        Ok(router.route("/health", get(web::health_check)))
    }

    fn rest_finalize(&self, ctx: &ModuleCtx, mut router: Router) -> Result<Router> {
        if self.config().enable_docs {
            let doc = serde_json::to_value(self.build_openapi())
                .context("failed to render OpenAPI document")?;
            tracing::info!(
                paths = doc["paths"].as_object().map(|p| p.len()).unwrap_or(0),
                "serving /openapi.json"
            );
            router = router.route("/openapi.json", get(web::openapi_handler(Arc::new(doc))));
        }

        let authenticator = match ctx.client_hub().get::<dyn TokenAuthenticator>() {
            Ok(a) => Some(a),
            Err(e) => {
                tracing::warn!(error = %e, "no token authenticator registered; all requests are anonymous");
                None
            }
        };

        let router = self.apply_layers(router, authenticator);
        *self.final_router.lock() = Some(router.clone());
        Ok(router)
    }

    fn as_registry(&self) -> &dyn OpenApiRegistry {
        self
    }
}

impl OpenApiRegistry for ApiIngress {
    fn register_doc(&self, doc: OpenApi) {
        tracing::debug!(paths = doc.paths.paths.len(), "registered module OpenAPI document");
        self.docs.lock().push(doc);
    }
}

#[async_trait]
impl StatefulModule for ApiIngress {
    /// Binds before returning so address errors fail the start phase.
    async fn start(&self, cancel: CancellationToken) -> Result<()> {
        let cfg = self.config();
        let addr: SocketAddr = cfg
            .bind_addr
            .parse()
            .with_context(|| format!("invalid bind address '{}'", cfg.bind_addr))?;

        let router = self
            .final_router
            .lock()
            .clone()
            .context("router was not finalized before start")?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        let bound = listener.local_addr()?;
        *self.local_addr.lock() = Some(bound);
        tracing::info!(addr = %bound, "HTTP server listening");

        self.lifecycle
            .start_with_token(cancel.child_token(), move |token| async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        token.cancelled().await;
                        tracing::info!("HTTP server shutting down");
                    })
                    .await
                    .map_err(anyhow::Error::from)
            })?;
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> Result<()> {
        let timeout = Duration::from_secs(self.config().shutdown_timeout_secs);
        self.lifecycle.stop(timeout).await;
        Ok(())
    }
}
