// In-memory store backed by a RwLock'd map - the shipped default and the test double

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{ModuleConfig, ModuleConfigParams, ModuleInfo, ModuleInfoParams};
use crate::result::PageResult;
use crate::store::{ConfigStore, ModuleStore};

/// Module catalog keyed by (app_name, ip).
#[derive(Default)]
pub struct InMemoryModuleStore {
    modules: RwLock<HashMap<(String, String), ModuleInfo>>,
}

impl InMemoryModuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(module: &ModuleInfo, params: &ModuleInfoParams) -> bool {
        if let Some(ref app_name) = params.app_name {
            if &module.app_name != app_name {
                return false;
            }
        }
        if let Some(ref ip) = params.ip {
            if &module.ip != ip {
                return false;
            }
        }
        if let Some(ref port) = params.port {
            if &module.port != port {
                return false;
            }
        }
        if let Some(ref environment) = params.environment {
            if &module.environment != environment {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl ModuleStore for InMemoryModuleStore {
    async fn find_by_app_and_ip(&self, app_name: &str, ip: &str) -> Result<Option<ModuleInfo>> {
        let modules = self.modules.read().unwrap();
        Ok(modules
            .get(&(app_name.to_string(), ip.to_string()))
            .cloned())
    }

    async fn find_by_app(&self, app_name: &str) -> Result<Vec<ModuleInfo>> {
        let modules = self.modules.read().unwrap();
        let mut found: Vec<ModuleInfo> = modules
            .values()
            .filter(|m| m.app_name == app_name)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.ip.cmp(&b.ip));
        Ok(found)
    }

    async fn save(&self, module: ModuleInfo) -> Result<ModuleInfo> {
        let mut modules = self.modules.write().unwrap();
        modules.insert(module.key(), module.clone());
        Ok(module)
    }

    async fn delete(&self, app_name: &str, ip: &str) -> Result<bool> {
        let mut modules = self.modules.write().unwrap();
        Ok(modules
            .remove(&(app_name.to_string(), ip.to_string()))
            .is_some())
    }

    async fn select_by_params(&self, params: &ModuleInfoParams) -> Result<PageResult<ModuleInfo>> {
        let modules = self.modules.read().unwrap();
        let mut matched: Vec<ModuleInfo> = modules
            .values()
            .filter(|m| Self::matches(m, params))
            .cloned()
            .collect();
        // Deterministic page order: by identity key
        matched.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(paginate(matched, params.page, params.size))
    }
}

/// Config payloads keyed by (app_name, environment).
#[derive(Default)]
pub struct InMemoryConfigStore {
    configs: RwLock<HashMap<(String, String), ModuleConfig>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn find_by_app_and_environment(
        &self,
        app_name: &str,
        environment: &str,
    ) -> Result<Option<ModuleConfig>> {
        let configs = self.configs.read().unwrap();
        Ok(configs
            .get(&(app_name.to_string(), environment.to_string()))
            .cloned())
    }

    async fn save(&self, config: ModuleConfig) -> Result<ModuleConfig> {
        let mut configs = self.configs.write().unwrap();
        configs.insert(
            (config.app_name.clone(), config.environment.clone()),
            config.clone(),
        );
        Ok(config)
    }

    async fn delete(&self, app_name: &str, environment: &str) -> Result<bool> {
        let mut configs = self.configs.write().unwrap();
        Ok(configs
            .remove(&(app_name.to_string(), environment.to_string()))
            .is_some())
    }

    async fn select_all(&self) -> Result<Vec<ModuleConfig>> {
        let configs = self.configs.read().unwrap();
        let mut all: Vec<ModuleConfig> = configs.values().cloned().collect();
        all.sort_by(|a, b| {
            (a.app_name.clone(), a.environment.clone())
                .cmp(&(b.app_name.clone(), b.environment.clone()))
        });
        Ok(all)
    }

    async fn select_by_params(
        &self,
        params: &ModuleConfigParams,
    ) -> Result<PageResult<ModuleConfig>> {
        let configs = self.configs.read().unwrap();
        let mut matched: Vec<ModuleConfig> = configs
            .values()
            .filter(|c| {
                params
                    .app_name
                    .as_ref()
                    .map(|a| &c.app_name == a)
                    .unwrap_or(true)
                    && params
                        .environment
                        .as_ref()
                        .map(|e| &c.environment == e)
                        .unwrap_or(true)
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            (a.app_name.clone(), a.environment.clone())
                .cmp(&(b.app_name.clone(), b.environment.clone()))
        });
        Ok(paginate(matched, params.page, params.size))
    }
}

/// Slice a matched set into a 1-based page envelope. Empty pages come back
/// with `success = false`, which downstream services rely on.
fn paginate<T>(matched: Vec<T>, page: usize, size: usize) -> PageResult<T> {
    let count = matched.len() as u64;
    let size = size.max(1);
    let page = page.max(1);
    let total_page = matched.len().div_ceil(size);
    let items: Vec<T> = matched
        .into_iter()
        .skip((page - 1) * size)
        .take(size)
        .collect();
    PageResult {
        success: !items.is_empty(),
        page_index: page,
        page_size: size,
        count,
        total_page,
        data: items,
    }
}
