// Config payload catalog - save/query glue over the config store

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::{ModuleConfig, ModuleConfigParams};
use crate::error::ConsoleError;
use crate::result::{PageResult, RepeaterResult};
use crate::store::ConfigStore;

/// Parameters for creating or updating a config payload.
#[derive(Debug, Clone)]
pub struct SaveConfigParams {
    pub app_name: String,
    pub environment: String,
    pub config: String,
}

/// Owns the (app_name, environment) -> payload catalog. Configs are
/// created on first save, updated in place afterwards, and never deleted.
pub struct ModuleConfigManager {
    store: Arc<dyn ConfigStore>,
}

impl ModuleConfigManager {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        params: &ModuleConfigParams,
    ) -> Result<PageResult<ModuleConfig>, ConsoleError> {
        Ok(self.store.select_by_params(params).await?)
    }

    pub async fn query(
        &self,
        app_name: &str,
        environment: &str,
    ) -> Result<ModuleConfig, ConsoleError> {
        self.store
            .find_by_app_and_environment(app_name, environment)
            .await?
            .ok_or_else(|| ConsoleError::ConfigNotFound {
                app_name: app_name.to_string(),
                environment: environment.to_string(),
            })
    }

    /// Upsert by (app_name, environment): an existing config keeps its
    /// `gmt_create` and only gets payload and `gmt_modified` refreshed.
    pub async fn save_or_update(
        &self,
        params: SaveConfigParams,
    ) -> Result<ModuleConfig, ConsoleError> {
        let now = Utc::now();
        let config = match self
            .store
            .find_by_app_and_environment(&params.app_name, &params.environment)
            .await?
        {
            Some(mut existing) => {
                existing.config = params.config;
                existing.gmt_modified = now;
                existing
            }
            None => ModuleConfig {
                app_name: params.app_name,
                environment: params.environment,
                config: params.config,
                gmt_create: now,
                gmt_modified: now,
            },
        };
        info!(
            app_name = %config.app_name,
            environment = %config.environment,
            "config saved"
        );
        Ok(self.store.save(config).await?)
    }

    /// Diagnostic dump of every stored config, envelope form.
    pub async fn debug_query_all_configs(&self) -> RepeaterResult<Vec<ModuleConfig>> {
        match self.store.select_all().await {
            Ok(configs) => RepeaterResult::ok(configs),
            Err(e) => RepeaterResult::fail(format!("failed to query configs: {e}")),
        }
    }
}
