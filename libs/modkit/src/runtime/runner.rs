//! Runner: init → db → rest → start → wait → stop.
//!
//! One base `ModuleCtx` is built up front and scoped per module in every
//! phase. Shutdown is driven by OS signals, an external token, or any future.

use crate::client_hub::ClientHub;
use crate::context::{ConfigProvider, ModuleCtxBuilder};
use crate::registry::ModuleRegistry;
use crate::runtime::shutdown;
use anyhow::Context;
use sea_orm::DatabaseConnection;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio_util::sync::CancellationToken;

/// How the runtime should decide when to stop.
pub enum ShutdownOptions {
    /// Listen for OS signals.
    Signals,
    /// An external `CancellationToken` controls the lifecycle.
    Token(CancellationToken),
    /// When the future completes, shutdown starts.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

pub struct RunOptions {
    /// Provider of module config sections (raw JSON by module name).
    pub modules_cfg: Arc<dyn ConfigProvider>,
    /// Shared connection; `None` leaves `ModuleCtx::db()` empty and skips migrations.
    pub db: Option<DatabaseConnection>,
    pub registry: ModuleRegistry,
    pub shutdown: ShutdownOptions,
    /// Hub shared with the caller (e.g. to reach module clients after startup).
    pub client_hub: Option<Arc<ClientHub>>,
}

fn spawn_shutdown_waiter(shutdown: ShutdownOptions, cancel: &CancellationToken) {
    match shutdown {
        ShutdownOptions::Signals => {
            let c = cancel.clone();
            tokio::spawn(async move {
                if let Err(e) = shutdown::wait_for_shutdown().await {
                    tracing::warn!(error = %e, "signal handler failed; falling back to ctrl_c()");
                    let _ = tokio::signal::ctrl_c().await;
                }
                c.cancel();
            });
        }
        ShutdownOptions::Future(waiter) => {
            let c = cancel.clone();
            tokio::spawn(async move {
                waiter.await;
                tracing::info!("shutdown: external future completed");
                c.cancel();
            });
        }
        ShutdownOptions::Token(_) => {
            tracing::debug!("shutdown: external token controls lifecycle");
        }
    }
}

pub async fn run(opts: RunOptions) -> anyhow::Result<()> {
    let hub = opts.client_hub.unwrap_or_default();
    let cancel = match &opts.shutdown {
        ShutdownOptions::Token(t) => t.clone(),
        _ => CancellationToken::new(),
    };
    spawn_shutdown_waiter(opts.shutdown, &cancel);

    let registry = opts.registry;
    let mut builder = ModuleCtxBuilder::new(cancel.clone())
        .with_client_hub(hub)
        .with_config_provider(opts.modules_cfg);
    if let Some(db) = opts.db.clone() {
        builder = builder.with_db(db);
    }
    let base_ctx = builder.build();

    tracing::info!(modules = ?registry.module_names(), "phase: init");
    registry.run_init_phase(&base_ctx).await?;

    if let Some(db) = &opts.db {
        tracing::info!("phase: db");
        registry.run_db_phase(db).await?;
    }

    tracing::info!("phase: rest");
    // The host module keeps and serves the finalized router.
    let _router = registry
        .run_rest_phase(&base_ctx, axum::Router::new())
        .context("router composition failed")?;

    tracing::info!("phase: start");
    if let Err(e) = registry.run_start_phase(cancel.clone()).await {
        cancel.cancel();
        registry.run_stop_phase(cancel).await;
        return Err(e.into());
    }

    cancel.cancelled().await;

    tracing::info!("phase: stop");
    registry.run_stop_phase(cancel).await;
    Ok(())
}
