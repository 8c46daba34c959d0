// Persistent store collaborators - traits for dependency injection, in-memory impl for tests and single-process runs

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{ModuleConfig, ModuleConfigParams, ModuleInfo, ModuleInfoParams};
use crate::result::PageResult;

pub use memory::{InMemoryConfigStore, InMemoryModuleStore};

/// Keyed store for module instances. The registry is the only writer.
///
/// Page semantics live here: callers hand over filter params and get a
/// fully-formed page envelope back.
#[async_trait]
pub trait ModuleStore: Send + Sync {
    /// Look up one instance by its (app_name, ip) identity.
    async fn find_by_app_and_ip(&self, app_name: &str, ip: &str) -> Result<Option<ModuleInfo>>;

    /// All instances registered under one app, any environment.
    async fn find_by_app(&self, app_name: &str) -> Result<Vec<ModuleInfo>>;

    /// Insert or replace by (app_name, ip).
    async fn save(&self, module: ModuleInfo) -> Result<ModuleInfo>;

    /// Delete by key; returns whether anything was removed.
    async fn delete(&self, app_name: &str, ip: &str) -> Result<bool>;

    /// Filtered, paginated lookup. An empty page is reported with
    /// `success = false` in the envelope.
    async fn select_by_params(&self, params: &ModuleInfoParams) -> Result<PageResult<ModuleInfo>>;
}

/// Keyed store for config payloads, identified by (app_name, environment).
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn find_by_app_and_environment(
        &self,
        app_name: &str,
        environment: &str,
    ) -> Result<Option<ModuleConfig>>;

    /// Insert or replace by (app_name, environment).
    async fn save(&self, config: ModuleConfig) -> Result<ModuleConfig>;

    /// Delete by key; returns whether anything was removed. Configs are
    /// never deleted by policy - this only backs the auto-fix re-key.
    async fn delete(&self, app_name: &str, environment: &str) -> Result<bool>;

    /// Full config dump for the consistency checker.
    async fn select_all(&self) -> Result<Vec<ModuleConfig>>;

    async fn select_by_params(
        &self,
        params: &ModuleConfigParams,
    ) -> Result<PageResult<ModuleConfig>>;
}
