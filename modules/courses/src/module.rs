use std::sync::Arc;
use std::time::Duration;

use accounts::contract::client::AccountsApi;
use anyhow::Context;
use async_trait::async_trait;
use modkit::{DbModule, Module, ModuleCtx, OpenApiRegistry, RestfulModule, TracedClient};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};
use url::Url;

use crate::api::rest::routes;
use crate::config::CoursesConfig;
use crate::contract::client::CoursesApi;
use crate::domain::ports::CourseNotifier;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::CoursesLocalClient;
use crate::infra::mail::HttpMailNotifier;
use crate::infra::storage::{migrations::Migrator, sea_orm_repo::SeaOrmCatalogRepository};

/// Courses module: catalog CRUD, subscriptions, payments and
/// course-update notifications.
#[derive(Default)]
pub struct Courses {
    service: arc_swap::ArcSwapOption<Service>,
}

impl Courses {
    pub fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("courses service not initialized"))
    }
}

fn build_notifier(
    cfg: &CoursesConfig,
    ctx: &ModuleCtx,
) -> anyhow::Result<Option<Arc<dyn CourseNotifier>>> {
    let Some(raw) = cfg.mail_gateway_url.as_deref().filter(|u| !u.trim().is_empty()) else {
        info!("Mail gateway not configured; course notifications disabled");
        return Ok(None);
    };
    let base = Url::parse(raw).with_context(|| format!("invalid mail_gateway_url '{raw}'"))?;
    let client = TracedClient::with_timeout(Duration::from_secs(cfg.mail_timeout_secs.max(1)))
        .context("failed to build mail gateway client")?;
    let accounts = ctx
        .client_hub()
        .get::<dyn AccountsApi>()
        .context("courses needs the accounts client; init accounts first")?;

    let notifier = HttpMailNotifier::new(client, &base, cfg.mail_from.clone(), accounts)?;
    info!(endpoint = %notifier.endpoint(), "Course notifications enabled");
    Ok(Some(Arc::new(notifier)))
}

#[async_trait]
impl Module for Courses {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing courses module");

        let cfg: CoursesConfig = ctx.module_config();
        debug!(
            default_page_size = cfg.default_page_size,
            max_page_size = cfg.max_page_size,
            "Loaded courses config"
        );

        let db = ctx.db_required()?;
        let notifier = build_notifier(&cfg, ctx)?;
        let service = Arc::new(Service::new(
            Arc::new(SeaOrmCatalogRepository::new(db)),
            notifier,
            ServiceConfig {
                default_page_size: cfg.default_page_size,
                max_page_size: cfg.max_page_size,
            },
        ));
        self.service.store(Some(service.clone()));

        let api: Arc<dyn CoursesApi> = Arc::new(CoursesLocalClient::new(service));
        ctx.client_hub().register::<dyn CoursesApi>(api);

        info!("Courses API exposed to ClientHub");
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for Courses {
    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running courses database migrations");
        Migrator::up(db, None).await?;
        info!("Courses database migrations completed successfully");
        Ok(())
    }
}

impl RestfulModule for Courses {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: axum::Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<axum::Router> {
        info!("Registering courses REST routes");
        routes::register_routes(router, openapi, self.service()?)
    }
}
