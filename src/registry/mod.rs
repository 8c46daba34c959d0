// Module registry - owns the catalog of agent instances and their lifecycle

pub mod prober;
pub mod version;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::agent::{AgentClient, AgentEndpoints};
use crate::domain::{
    ModuleInfo, ModuleInfoParams, ModuleStatus, DEFAULT_AGENT_PORT, DEFAULT_ENVIRONMENT,
};
use crate::error::ConsoleError;
use crate::result::{PageResult, RepeaterResult};
use crate::store::ModuleStore;

pub use prober::ModuleStatusProber;
pub use version::resolve_version;

/// Heartbeat payload an agent reports to keep its record current.
#[derive(Debug, Clone)]
pub struct HeartbeatReport {
    pub app_name: String,
    pub ip: String,
    pub port: String,
    pub environment: Option<String>,
    pub version: Option<String>,
    pub status: Option<ModuleStatus>,
}

/// Admin-side install request. Port and environment fall back to defaults
/// when absent.
#[derive(Debug, Clone)]
pub struct InstallParams {
    pub app_name: String,
    pub ip: String,
    pub port: Option<String>,
    pub environment: Option<String>,
}

/// Outcome of a reload call: measured latency plus the post-reload
/// activation check.
#[derive(Debug, Clone)]
pub struct ReloadOutcome {
    pub response_time_ms: u64,
    pub module_active: bool,
}

impl std::fmt::Display for ReloadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "module reloaded, response time: {}ms, status: {}",
            self.response_time_ms,
            if self.module_active { "ok" } else { "abnormal" }
        )
    }
}

/// Catalog of known agent instances keyed by (app_name, ip).
///
/// Single-instance mutations are all-or-nothing: a remote state-change call
/// that fails leaves the local record untouched. Concurrent heartbeats and
/// admin calls on the same key are last-writer-wins by design - contention
/// per instance is low and the original behavior carried no lock either.
pub struct ModuleRegistry {
    store: Arc<dyn ModuleStore>,
    agent: Arc<dyn AgentClient>,
    endpoints: AgentEndpoints,
    default_port: String,
}

impl ModuleRegistry {
    pub fn new(
        store: Arc<dyn ModuleStore>,
        agent: Arc<dyn AgentClient>,
        endpoints: AgentEndpoints,
    ) -> Self {
        Self {
            store,
            agent,
            endpoints,
            default_port: DEFAULT_AGENT_PORT.to_string(),
        }
    }

    pub fn with_default_port(mut self, port: impl Into<String>) -> Self {
        self.default_port = port.into();
        self
    }

    /// Heartbeat upsert by (app_name, ip). Safe to call at any rate: an
    /// existing record only gets its timestamp (and, when supplied, status
    /// and version) refreshed; `gmt_create` is preserved.
    pub async fn report(&self, report: HeartbeatReport) -> Result<ModuleInfo, ConsoleError> {
        let now = Utc::now();
        if let Some(mut existing) = self
            .store
            .find_by_app_and_ip(&report.app_name, &report.ip)
            .await?
        {
            existing.gmt_modified = now;
            if let Some(status) = report.status {
                existing.status = status;
            }
            if let Some(version) = report.version {
                if !version.is_empty() {
                    existing.version = version;
                }
            }
            debug!(
                app_name = %existing.app_name,
                ip = %existing.ip,
                "heartbeat refreshed"
            );
            return Ok(self.store.save(existing).await?);
        }

        let module = ModuleInfo {
            app_name: report.app_name,
            ip: report.ip,
            port: if report.port.is_empty() {
                self.default_port.clone()
            } else {
                report.port
            },
            environment: report
                .environment
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            version: report.version.unwrap_or_else(|| "unknown".to_string()),
            status: report.status.unwrap_or(ModuleStatus::Active),
            gmt_create: now,
            gmt_modified: now,
        };
        info!(
            app_name = %module.app_name,
            ip = %module.ip,
            environment = %module.environment,
            "module registered via heartbeat"
        );
        Ok(self.store.save(module).await?)
    }

    /// Admin install: validate, verify the agent is actually reachable and
    /// carries the repeater module, resolve its version, then persist a new
    /// ACTIVE instance. Nothing is persisted until both remote checks pass.
    pub async fn install(&self, params: InstallParams) -> Result<ModuleInfo, ConsoleError> {
        if params.app_name.is_empty() || params.ip.is_empty() {
            return Err(ConsoleError::validation("appName and ip are required"));
        }

        let port = params
            .port
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.default_port.clone());
        let environment = params
            .environment
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        let port_num: u32 = port
            .parse()
            .map_err(|_| ConsoleError::validation("port must be a number"))?;
        if !(1..=65535).contains(&port_num) {
            return Err(ConsoleError::validation(
                "port must be between 1 and 65535",
            ));
        }

        if self
            .store
            .find_by_app_and_ip(&params.app_name, &params.ip)
            .await?
            .is_some()
        {
            return Err(ConsoleError::AlreadyRegistered {
                app_name: params.app_name,
                ip: params.ip,
            });
        }

        // Reachability first, then module presence; the second response body
        // is also where the version hint lives.
        let list_resp = self.agent.get(&self.endpoints.list_url(&params.ip, &port)).await;
        if !list_resp.success {
            return Err(ConsoleError::remote(format!(
                "failed to connect agent at {}:{}, message = {}",
                params.ip, port, list_resp.message
            )));
        }

        let detail_resp = self
            .agent
            .get(&self.endpoints.detail_url(&params.ip, &port))
            .await;
        if !detail_resp.success {
            return Err(ConsoleError::remote(format!(
                "repeater module not found at {}:{}, message = {}",
                params.ip, port, detail_resp.message
            )));
        }

        let version = resolve_version(&detail_resp.body);
        let now = Utc::now();
        let module = ModuleInfo {
            app_name: params.app_name,
            ip: params.ip,
            port,
            environment,
            version,
            status: ModuleStatus::Active,
            gmt_create: now,
            gmt_modified: now,
        };
        info!(
            app_name = %module.app_name,
            ip = %module.ip,
            port = %module.port,
            environment = %module.environment,
            version = %module.version,
            "module installed"
        );
        Ok(self.store.save(module).await?)
    }

    /// Activate the remote module, then mirror the confirmed state locally.
    pub async fn active(&self, app_name: &str, ip: &str) -> Result<ModuleInfo, ConsoleError> {
        self.execute_state_change(app_name, ip, ModuleStatus::Active)
            .await
    }

    /// Freeze the remote module, then mirror the confirmed state locally.
    pub async fn frozen(&self, app_name: &str, ip: &str) -> Result<ModuleInfo, ConsoleError> {
        self.execute_state_change(app_name, ip, ModuleStatus::Frozen)
            .await
    }

    async fn execute_state_change(
        &self,
        app_name: &str,
        ip: &str,
        target: ModuleStatus,
    ) -> Result<ModuleInfo, ConsoleError> {
        let mut module = self.find_required(app_name, ip).await?;
        let url = match target {
            ModuleStatus::Active => self.endpoints.active_url(&module.ip, &module.port),
            ModuleStatus::Frozen => self.endpoints.frozen_url(&module.ip, &module.port),
        };
        let resp = self.agent.get(&url).await;
        if !resp.success {
            warn!(
                app_name,
                ip,
                target = %target,
                message = %resp.message,
                "remote state change rejected, local record untouched"
            );
            return Err(ConsoleError::remote(resp.message));
        }
        module.status = target;
        module.gmt_modified = Utc::now();
        info!(app_name, ip, status = %target, "module status changed");
        Ok(self.store.save(module).await?)
    }

    /// Trigger a remote reload, then re-probe the detail endpoint to confirm
    /// the module came back up. State is only touched on remote success.
    pub async fn reload(&self, app_name: &str, ip: &str) -> Result<ReloadOutcome, ConsoleError> {
        let mut module = self.find_required(app_name, ip).await?;
        let started = Instant::now();
        let resp = self
            .agent
            .get(&self.endpoints.reload_url(&module.ip, &module.port))
            .await;
        let response_time_ms = started.elapsed().as_millis() as u64;
        if !resp.success {
            return Err(ConsoleError::remote(resp.message));
        }

        module.gmt_modified = Utc::now();
        let module = self.store.save(module).await?;

        let detail = self
            .agent
            .get(&self.endpoints.detail_url(&module.ip, &module.port))
            .await;
        let module_active = detail.success && detail.body.contains("ACTIVE");
        info!(
            app_name,
            ip, response_time_ms, module_active, "module reloaded"
        );
        Ok(ReloadOutcome {
            response_time_ms,
            module_active,
        })
    }

    /// Delete an instance. When a port is supplied it must match the stored
    /// one - a guard against deleting a re-deployed instance by accident.
    pub async fn remove(
        &self,
        app_name: &str,
        ip: &str,
        port: Option<&str>,
    ) -> Result<ModuleInfo, ConsoleError> {
        if app_name.is_empty() || ip.is_empty() {
            return Err(ConsoleError::validation("appName and ip are required"));
        }
        let module = self.find_required(app_name, ip).await?;
        if let Some(port) = port.filter(|p| !p.is_empty()) {
            if port != module.port {
                return Err(ConsoleError::validation(format!(
                    "port mismatch: expected {}, got {}",
                    module.port, port
                )));
            }
        }
        self.store.delete(app_name, ip).await?;
        info!(app_name, ip, port = %module.port, "module removed");
        Ok(module)
    }

    /// Paginated lookup by any subset of {app_name, ip, port, environment}.
    /// Page semantics delegate entirely to the store.
    pub async fn query(
        &self,
        params: &ModuleInfoParams,
    ) -> Result<PageResult<ModuleInfo>, ConsoleError> {
        Ok(self.store.select_by_params(params).await?)
    }

    /// All instances of one app, envelope form. Empty means failure here,
    /// matching the read-API contract of the surrounding glue.
    pub async fn query_by_app(&self, app_name: &str) -> RepeaterResult<Vec<ModuleInfo>> {
        match self.store.find_by_app(app_name).await {
            Ok(modules) if modules.is_empty() => RepeaterResult::fail("data not exist"),
            Ok(modules) => RepeaterResult::ok(modules),
            Err(e) => RepeaterResult::fail(e.to_string()),
        }
    }

    /// One instance by key, envelope form.
    pub async fn query_one(&self, app_name: &str, ip: &str) -> RepeaterResult<ModuleInfo> {
        match self.store.find_by_app_and_ip(app_name, ip).await {
            Ok(Some(module)) => RepeaterResult::ok(module),
            Ok(None) => RepeaterResult::fail("data not exist"),
            Err(e) => RepeaterResult::fail(e.to_string()),
        }
    }

    /// Diagnostic dump of the whole catalog. Errors are folded into the
    /// envelope so debug tooling never sees a fault.
    pub async fn debug_query_all_modules(&self) -> RepeaterResult<Vec<ModuleInfo>> {
        let params = ModuleInfoParams {
            size: 1000,
            ..Default::default()
        };
        match self.store.select_by_params(&params).await {
            Ok(page) => RepeaterResult::ok(page.data),
            Err(e) => RepeaterResult::fail(format!("failed to query modules: {e}")),
        }
    }

    async fn find_required(&self, app_name: &str, ip: &str) -> Result<ModuleInfo, ConsoleError> {
        self.store
            .find_by_app_and_ip(app_name, ip)
            .await?
            .ok_or_else(|| ConsoleError::ModuleNotFound {
                app_name: app_name.to_string(),
                ip: ip.to_string(),
            })
    }
}
