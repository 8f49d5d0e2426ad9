use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use modkit::{
    DbModule, Lifecycle, Module, ModuleCtx, OpenApiRegistry, RestfulModule, StatefulModule,
    TokenAuthenticator,
};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::api::rest::routes;
use crate::config::AccountsConfig;
use crate::contract::client::AccountsApi;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::AccountsLocalClient;
use crate::infra::storage::{migrations::Migrator, sea_orm_repo::SeaOrmUsersRepository};

const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Accounts module: registration, login, token authentication and the
/// stale-account sweep.
#[derive(Default)]
pub struct Accounts {
    service: arc_swap::ArcSwapOption<Service>,
    config: arc_swap::ArcSwap<AccountsConfig>,
    sweeper: Lifecycle,
}

impl Accounts {
    pub fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("accounts service not initialized"))
    }
}

#[async_trait]
impl Module for Accounts {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing accounts module");

        let cfg: AccountsConfig = ctx.module_config();
        debug!(
            inactivity_days = cfg.inactivity_days,
            interval_secs = cfg.stale_check_interval_secs,
            "Loaded accounts config"
        );

        let db = ctx.db_required()?;
        let repo = SeaOrmUsersRepository::new(db);
        let service = Arc::new(Service::new(
            Arc::new(repo),
            ServiceConfig {
                inactivity_days: cfg.inactivity_days,
                ..ServiceConfig::default()
            },
        ));
        self.service.store(Some(service.clone()));
        self.config.store(Arc::new(cfg));

        let client = Arc::new(AccountsLocalClient::new(service));
        let hub = ctx.client_hub();
        hub.register::<dyn AccountsApi>(client.clone());
        hub.register::<dyn TokenAuthenticator>(client);

        info!("Accounts API and token authenticator exposed to ClientHub");
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for Accounts {
    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running accounts database migrations");
        Migrator::up(db, None).await?;
        info!("Accounts database migrations completed successfully");
        Ok(())
    }
}

impl RestfulModule for Accounts {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: axum::Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<axum::Router> {
        info!("Registering accounts REST routes");
        routes::register_routes(router, openapi, self.service()?)
    }
}

#[async_trait]
impl StatefulModule for Accounts {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let cfg = self.config.load_full();
        if !cfg.stale_job_enabled {
            info!("Stale-account sweep disabled");
            return Ok(());
        }
        let service = self.service()?;
        let period = Duration::from_secs(cfg.stale_check_interval_secs.max(1));

        self.sweeper
            .start_with_token(cancel.child_token(), move |token| {
                run_sweeper(service, period, token)
            })?;
        info!(period_secs = period.as_secs(), "Stale-account sweep scheduled");
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        let reason = self.sweeper.stop(STOP_TIMEOUT).await;
        debug!(?reason, "Stale-account sweep stopped");
        Ok(())
    }
}

/// First run one full period after start, then every `period`.
async fn run_sweeper(
    service: Arc<Service>,
    period: Duration,
    token: CancellationToken,
) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = service.deactivate_stale(chrono::Utc::now()).await {
                    error!(error = %e, "Stale-account sweep failed");
                }
            }
        }
    }
    Ok(())
}
