//! Module wiring: init publishes the client, notifier config is honoured.

use std::collections::HashMap;
use std::sync::Arc;

use accounts::Accounts;
use courses::{contract::client::CoursesApi, Courses, MODULE_NAME};
use modkit::{ClientHub, ConfigProvider, DbModule, Module, ModuleCtxBuilder};
use sea_orm::Database;
use serde_json::json;
use tokio_util::sync::CancellationToken;

struct MapConfig(HashMap<String, serde_json::Value>);

impl ConfigProvider for MapConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.get(module_name)
    }
}

#[tokio::test]
async fn init_after_accounts_publishes_client() -> anyhow::Result<()> {
    let db = Database::connect("sqlite::memory:").await?;
    let hub = Arc::new(ClientHub::new());
    let cfg: Arc<dyn ConfigProvider> = Arc::new(MapConfig(HashMap::from([(
        MODULE_NAME.to_string(),
        json!({ "mail_gateway_url": "http://127.0.0.1:9/", "default_page_size": 3 }),
    )])));
    let ctx_for = |name: &str| {
        ModuleCtxBuilder::new(CancellationToken::new())
            .with_db(db.clone())
            .with_client_hub(hub.clone())
            .with_config_provider(cfg.clone())
            .for_module(name)
            .build()
    };

    let accounts = Accounts::default();
    accounts.init(&ctx_for(accounts::MODULE_NAME)).await?;
    accounts.migrate(&db).await?;

    let module = Courses::default();
    module.init(&ctx_for(MODULE_NAME)).await?;
    module.migrate(&db).await?;

    let api = hub.get::<dyn CoursesApi>()?;
    assert!(api.get_course(1).await.is_err());
    assert!(module.service().is_ok());
    Ok(())
}

#[tokio::test]
async fn mail_gateway_needs_the_accounts_client() -> anyhow::Result<()> {
    let db = Database::connect("sqlite::memory:").await?;
    let cfg = MapConfig(HashMap::from([(
        MODULE_NAME.to_string(),
        json!({ "mail_gateway_url": "http://127.0.0.1:9/" }),
    )]));
    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .with_db(db)
        .with_client_hub(Arc::new(ClientHub::new()))
        .with_config_provider(Arc::new(cfg))
        .for_module(MODULE_NAME)
        .build();

    assert!(Courses::default().init(&ctx).await.is_err());
    Ok(())
}

#[tokio::test]
async fn invalid_gateway_url_fails_init() -> anyhow::Result<()> {
    let db = Database::connect("sqlite::memory:").await?;
    let cfg = MapConfig(HashMap::from([(
        MODULE_NAME.to_string(),
        json!({ "mail_gateway_url": "not a url" }),
    )]));
    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .with_db(db)
        .with_config_provider(Arc::new(cfg))
        .for_module(MODULE_NAME)
        .build();

    assert!(Courses::default().init(&ctx).await.is_err());
    Ok(())
}
