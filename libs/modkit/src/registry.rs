//! Explicit module registry.
//!
//! Modules are registered in dependency order; capabilities attach to the
//! module registered last. Phases run in registration order, `stop` runs in
//! reverse.

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::context::ModuleCtx;
use crate::contracts::{DbModule, Module, RestHostModule, RestfulModule, StatefulModule};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("module '{0}' is registered twice")]
    DuplicateModule(&'static str),
    #[error("capability '{0}' declared before any module")]
    OrphanCapability(&'static str),
    #[error("multiple REST hosts: '{0}' and '{1}'")]
    MultipleRestHosts(&'static str, &'static str),
    #[error("modules expose REST routes but no REST host is registered")]
    RestHostMissing,

    #[error("init failed for module '{module}'")]
    Init {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("migration failed for module '{module}'")]
    Migrate {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST wiring failed for module '{module}'")]
    Rest {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("start failed for module '{module}'")]
    Start {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

struct Entry {
    name: &'static str,
    core: Arc<dyn Module>,
    db: Option<Arc<dyn DbModule>>,
    rest: Option<Arc<dyn RestfulModule>>,
    rest_host: Option<Arc<dyn RestHostModule>>,
    stateful: Option<Arc<dyn StatefulModule>>,
}

#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<Entry>,
    errors: Vec<RegistryError>,
}

impl RegistryBuilder {
    pub fn module(mut self, name: &'static str, core: Arc<dyn Module>) -> Self {
        if self.entries.iter().any(|e| e.name == name) {
            self.errors.push(RegistryError::DuplicateModule(name));
            return self;
        }
        self.entries.push(Entry {
            name,
            core,
            db: None,
            rest: None,
            rest_host: None,
            stateful: None,
        });
        self
    }

    fn with_last(mut self, capability: &'static str, f: impl FnOnce(&mut Entry)) -> Self {
        match self.entries.last_mut() {
            Some(entry) => f(entry),
            None => self.errors.push(RegistryError::OrphanCapability(capability)),
        }
        self
    }

    pub fn db(self, m: Arc<dyn DbModule>) -> Self {
        self.with_last("db", |e| e.db = Some(m))
    }

    pub fn rest(self, m: Arc<dyn RestfulModule>) -> Self {
        self.with_last("rest", |e| e.rest = Some(m))
    }

    pub fn rest_host(self, m: Arc<dyn RestHostModule>) -> Self {
        self.with_last("rest_host", |e| e.rest_host = Some(m))
    }

    pub fn stateful(self, m: Arc<dyn StatefulModule>) -> Self {
        self.with_last("stateful", |e| e.stateful = Some(m))
    }

    pub fn build(mut self) -> Result<ModuleRegistry, RegistryError> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }

        let mut host: Option<&'static str> = None;
        for e in self.entries.iter().filter(|e| e.rest_host.is_some()) {
            if let Some(first) = host {
                return Err(RegistryError::MultipleRestHosts(first, e.name));
            }
            host = Some(e.name);
        }
        if host.is_none() && self.entries.iter().any(|e| e.rest.is_some()) {
            return Err(RegistryError::RestHostMissing);
        }

        Ok(ModuleRegistry {
            entries: self.entries,
        })
    }
}

pub struct ModuleRegistry {
    entries: Vec<Entry>,
}

fn rest_err(module: &'static str) -> impl FnOnce(anyhow::Error) -> RegistryError {
    move |source| RegistryError::Rest { module, source }
}

impl ModuleRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    /// Typed access to a registered module's core object.
    pub fn get<T: 'static>(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.core.as_any().downcast_ref::<T>())
    }

    pub async fn run_init_phase(&self, base: &ModuleCtx) -> Result<(), RegistryError> {
        for e in &self.entries {
            tracing::debug!(module = e.name, "init");
            let ctx = base.clone().for_module(e.name);
            e.core
                .init(&ctx)
                .await
                .map_err(|source| RegistryError::Init {
                    module: e.name,
                    source,
                })?;
        }
        Ok(())
    }

    pub async fn run_db_phase(&self, db: &DatabaseConnection) -> Result<(), RegistryError> {
        for e in &self.entries {
            if let Some(m) = &e.db {
                tracing::info!(module = e.name, "running migrations");
                m.migrate(db).await.map_err(|source| RegistryError::Migrate {
                    module: e.name,
                    source,
                })?;
            }
        }
        Ok(())
    }

    /// prepare (host) → register_rest (each module) → finalize (host).
    pub fn run_rest_phase(&self, base: &ModuleCtx, router: Router) -> Result<Router, RegistryError> {
        let Some(host_entry) = self.entries.iter().find(|e| e.rest_host.is_some()) else {
            return Ok(router);
        };
        let Some(host) = host_entry.rest_host.as_ref() else {
            return Ok(router);
        };
        let host_ctx = base.clone().for_module(host_entry.name);

        let mut router = host
            .rest_prepare(&host_ctx, router)
            .map_err(rest_err(host_entry.name))?;

        for e in &self.entries {
            if let Some(m) = &e.rest {
                tracing::debug!(module = e.name, "registering routes");
                let ctx = base.clone().for_module(e.name);
                router = m
                    .register_rest(&ctx, router, host.as_registry())
                    .map_err(rest_err(e.name))?;
            }
        }

        host.rest_finalize(&host_ctx, router)
            .map_err(rest_err(host_entry.name))
    }

    pub async fn run_start_phase(&self, cancel: CancellationToken) -> Result<(), RegistryError> {
        for e in &self.entries {
            if let Some(s) = &e.stateful {
                tracing::debug!(module = e.name, "start");
                s.start(cancel.clone())
                    .await
                    .map_err(|source| RegistryError::Start {
                        module: e.name,
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Stops every stateful module; failures are logged and do not short-circuit.
    pub async fn run_stop_phase(&self, cancel: CancellationToken) {
        for e in self.entries.iter().rev() {
            if let Some(s) = &e.stateful {
                if let Err(err) = s.stop(cancel.clone()).await {
                    tracing::warn!(module = e.name, error = %err, "stop failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ModuleCtxBuilder;
    use crate::contracts::OpenApiRegistry;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Journal(Mutex<Vec<String>>);

    impl Journal {
        fn push(&self, s: impl Into<String>) {
            self.0.lock().push(s.into());
        }
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock())
        }
    }

    struct Probe {
        name: &'static str,
        journal: Arc<Journal>,
    }

    #[async_trait]
    impl Module for Probe {
        async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
            assert_eq!(ctx.current_module(), Some(self.name));
            self.journal.push(format!("init:{}", self.name));
            Ok(())
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    impl RestfulModule for Probe {
        fn register_rest(
            &self,
            _ctx: &ModuleCtx,
            router: Router,
            openapi: &dyn OpenApiRegistry,
        ) -> anyhow::Result<Router> {
            openapi.register_doc(utoipa::openapi::OpenApi::default());
            self.journal.push(format!("rest:{}", self.name));
            Ok(router)
        }
    }

    impl RestHostModule for Probe {
        fn rest_prepare(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
            self.journal.push("prepare");
            Ok(router)
        }
        fn rest_finalize(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
            self.journal.push("finalize");
            Ok(router)
        }
        fn as_registry(&self) -> &dyn OpenApiRegistry {
            self
        }
    }

    impl OpenApiRegistry for Probe {
        fn register_doc(&self, _doc: utoipa::openapi::OpenApi) {
            self.journal.push("doc");
        }
    }

    #[async_trait]
    impl StatefulModule for Probe {
        async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            self.journal.push(format!("start:{}", self.name));
            Ok(())
        }
        async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            self.journal.push(format!("stop:{}", self.name));
            Ok(())
        }
    }

    fn probe(name: &'static str, journal: &Arc<Journal>) -> Arc<Probe> {
        Arc::new(Probe {
            name,
            journal: journal.clone(),
        })
    }

    #[tokio::test]
    async fn phases_run_in_registration_order() {
        let journal = Arc::new(Journal::default());
        let host = probe("host", &journal);
        let feature = probe("feature", &journal);

        let registry = ModuleRegistry::builder()
            .module("host", host.clone())
            .rest_host(host.clone())
            .stateful(host)
            .module("feature", feature.clone())
            .rest(feature.clone())
            .stateful(feature)
            .build()
            .unwrap();

        let ctx = ModuleCtxBuilder::new(CancellationToken::new()).build();
        registry.run_init_phase(&ctx).await.unwrap();
        registry.run_rest_phase(&ctx, Router::new()).unwrap();
        registry.run_start_phase(CancellationToken::new()).await.unwrap();
        registry.run_stop_phase(CancellationToken::new()).await;

        assert_eq!(
            journal.take(),
            vec![
                "init:host",
                "init:feature",
                "prepare",
                "doc",
                "rest:feature",
                "finalize",
                "start:host",
                "start:feature",
                "stop:feature",
                "stop:host",
            ]
        );
        assert!(registry.get::<Probe>("feature").is_some());
        assert!(registry.get::<String>("feature").is_none());
    }

    #[test]
    fn builder_rejects_bad_wiring() {
        let journal = Arc::new(Journal::default());

        let err = ModuleRegistry::builder()
            .rest(probe("a", &journal))
            .build()
            .err();
        assert!(matches!(err, Some(RegistryError::OrphanCapability("rest"))));

        let err = ModuleRegistry::builder()
            .module("a", probe("a", &journal))
            .module("a", probe("a", &journal))
            .build()
            .err();
        assert!(matches!(err, Some(RegistryError::DuplicateModule("a"))));

        let err = ModuleRegistry::builder()
            .module("a", probe("a", &journal))
            .rest(probe("a", &journal))
            .build()
            .err();
        assert!(matches!(err, Some(RegistryError::RestHostMissing)));

        let err = ModuleRegistry::builder()
            .module("a", probe("a", &journal))
            .rest_host(probe("a", &journal))
            .module("b", probe("b", &journal))
            .rest_host(probe("b", &journal))
            .build()
            .err();
        assert!(matches!(
            err,
            Some(RegistryError::MultipleRestHosts("a", "b"))
        ));
    }
}
