// Config push distributor - serializes a payload and fans it out to matching instances

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{info, warn};

use crate::agent::{AgentClient, AgentEndpoints, AgentResponse};
use crate::domain::ModuleInfoParams;
use crate::error::ConsoleError;
use crate::registry::ModuleRegistry;
use crate::store::ConfigStore;

/// Wire-format encoder for config payloads. The agents agree on the
/// encoding out of band; the distributor only cares that it either yields
/// a string or a serialization error.
pub trait ConfigSerializer: Send + Sync {
    fn serialize(&self, config: &Value) -> Result<String, ConsoleError>;
}

/// Default encoder: compact JSON.
pub struct JsonConfigSerializer;

impl ConfigSerializer for JsonConfigSerializer {
    fn serialize(&self, config: &Value) -> Result<String, ConsoleError> {
        serde_json::to_string(config).map_err(|e| ConsoleError::Serialization(e.to_string()))
    }
}

/// Delivery policy outcome. Partial delivery is deliberately still a
/// success - flipping that contract is a matter of changing `success()`
/// for the `PartiallyDelivered` arm, nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStatus {
    Delivered,
    PartiallyDelivered,
}

/// Result of one push broadcast.
#[derive(Debug, Clone)]
pub struct PushOutcome {
    pub status: PushStatus,
    pub target_count: usize,
    /// IPs whose push call failed, sorted.
    pub failed_ips: Vec<String>,
}

impl PushOutcome {
    pub fn success(&self) -> bool {
        match self.status {
            PushStatus::Delivered => true,
            PushStatus::PartiallyDelivered => true,
        }
    }

    pub fn message(&self) -> String {
        match self.status {
            PushStatus::Delivered => String::new(),
            PushStatus::PartiallyDelivered => {
                format!("{} push failed.", self.failed_ips.join(","))
            }
        }
    }
}

/// Fans a stored config out over HTTP to every instance registered under
/// its (app_name, environment). Calls are independent, unordered, bounded
/// in flight, and never retried; each target commits or fails on its own.
pub struct ConfigPushDistributor {
    configs: Arc<dyn ConfigStore>,
    registry: Arc<ModuleRegistry>,
    agent: Arc<dyn AgentClient>,
    endpoints: AgentEndpoints,
    serializer: Arc<dyn ConfigSerializer>,
    concurrency: usize,
    query_size: usize,
}

impl ConfigPushDistributor {
    pub fn new(
        configs: Arc<dyn ConfigStore>,
        registry: Arc<ModuleRegistry>,
        agent: Arc<dyn AgentClient>,
        endpoints: AgentEndpoints,
        serializer: Arc<dyn ConfigSerializer>,
    ) -> Self {
        Self {
            configs,
            registry,
            agent,
            endpoints,
            serializer,
            concurrency: 8,
            query_size: 1000,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Push the stored config for (app_name, environment) to all matching
    /// live instances.
    pub async fn push(
        &self,
        app_name: &str,
        environment: &str,
    ) -> Result<PushOutcome, ConsoleError> {
        let config = self
            .configs
            .find_by_app_and_environment(app_name, environment)
            .await?
            .ok_or_else(|| ConsoleError::ConfigNotFound {
                app_name: app_name.to_string(),
                environment: environment.to_string(),
            })?;

        let targets = self
            .registry
            .query(&ModuleInfoParams {
                app_name: Some(app_name.to_string()),
                environment: Some(environment.to_string()),
                size: self.query_size,
                ..Default::default()
            })
            .await?;
        if !targets.success || targets.data.is_empty() {
            return Err(ConsoleError::NoAliveModule {
                app_name: app_name.to_string(),
                environment: environment.to_string(),
            });
        }

        let payload: Value = serde_json::from_str(&config.config)
            .map_err(|e| ConsoleError::Serialization(e.to_string()))?;
        let data = self.serializer.serialize(&payload)?;
        let encoded = urlencoding::encode(&data).into_owned();

        let target_count = targets.data.len();
        let results: HashMap<String, AgentResponse> = stream::iter(targets.data)
            .map(|module| {
                let url = self
                    .endpoints
                    .push_config_url(&module.ip, &module.port, &encoded);
                let agent = Arc::clone(&self.agent);
                async move { (module.ip, agent.get(&url).await) }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut failed_ips: Vec<String> = results
            .iter()
            .filter(|(_, resp)| !resp.success)
            .map(|(ip, _)| ip.clone())
            .collect();
        failed_ips.sort();

        let outcome = if failed_ips.is_empty() {
            info!(app_name, environment, target_count, "config pushed");
            PushOutcome {
                status: PushStatus::Delivered,
                target_count,
                failed_ips,
            }
        } else {
            warn!(
                app_name,
                environment,
                target_count,
                failed = %failed_ips.join(","),
                "config push partially failed"
            );
            PushOutcome {
                status: PushStatus::PartiallyDelivered,
                target_count,
                failed_ips,
            }
        };
        Ok(outcome)
    }
}
