// On-demand health probe of a single registered instance

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::agent::{AgentClient, AgentEndpoints};
use crate::domain::ModuleStatusDetail;
use crate::error::ConsoleError;
use crate::store::ModuleStore;

/// Probes one instance's liveness and activation state. The result is
/// ephemeral - nothing the probe learns is written back to the catalog.
pub struct ModuleStatusProber {
    store: Arc<dyn ModuleStore>,
    agent: Arc<dyn AgentClient>,
    endpoints: AgentEndpoints,
}

impl ModuleStatusProber {
    pub fn new(
        store: Arc<dyn ModuleStore>,
        agent: Arc<dyn AgentClient>,
        endpoints: AgentEndpoints,
    ) -> Self {
        Self {
            store,
            agent,
            endpoints,
        }
    }

    /// Measure a liveness round-trip, then (if online) read the module
    /// detail to decide activation. Agent-side failures land in the detail
    /// struct, never in the Err channel - only an unknown (app_name, ip)
    /// fails the caller.
    ///
    /// `failure_count` is 0/1 for this probe alone, not a running counter.
    pub async fn probe(
        &self,
        app_name: &str,
        ip: &str,
    ) -> Result<ModuleStatusDetail, ConsoleError> {
        let module = self
            .store
            .find_by_app_and_ip(app_name, ip)
            .await?
            .ok_or_else(|| ConsoleError::ModuleNotFound {
                app_name: app_name.to_string(),
                ip: ip.to_string(),
            })?;

        let mut detail = ModuleStatusDetail {
            last_heartbeat: Some(module.gmt_modified),
            ..Default::default()
        };

        let started = Instant::now();
        let ping = self
            .agent
            .get(&self.endpoints.list_url(&module.ip, &module.port))
            .await;
        detail.online = ping.success;
        detail.response_time_ms = started.elapsed().as_millis() as u64;

        if ping.success {
            let resp = self
                .agent
                .get(&self.endpoints.detail_url(&module.ip, &module.port))
                .await;
            if resp.success {
                detail.module_active = resp.body.contains("ACTIVE");
                detail.module_detail = Some(resp.body);
            } else {
                detail.module_active = false;
            }
            detail.failure_count = 0;
        } else {
            detail.module_active = false;
            detail.error = Some(ping.message);
            detail.failure_count = 1;
        }

        debug!(
            app_name,
            ip,
            online = detail.online,
            module_active = detail.module_active,
            latency = detail.latency_level(),
            "module probed"
        );
        Ok(detail)
    }
}
