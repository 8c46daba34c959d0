// Repeater Console Library - control plane for a fleet of repeater agent modules
// This exposes the core components for testing and integration

pub mod agent;
pub mod checker;
pub mod config;
pub mod configs;
pub mod domain;
pub mod error;
pub mod push;
pub mod registry;
pub mod result;
pub mod store;
pub mod telemetry;

// Re-export key types for easy access
pub use agent::{AgentClient, AgentEndpoints, AgentResponse, HttpAgentClient};
pub use checker::{
    AutoFixReport, ConfigCheckDetail, EnvironmentChecker, EnvironmentReport, MatchFailureReason,
    MatchingAnalysis, ModuleMatchReport,
};
pub use config::{config, EndpointTemplates, RepeaterConsoleConfig};
pub use configs::{ModuleConfigManager, SaveConfigParams};
pub use domain::{
    ModuleConfig, ModuleConfigParams, ModuleInfo, ModuleInfoParams, ModuleStatus,
    ModuleStatusDetail, DEFAULT_AGENT_PORT, DEFAULT_ENVIRONMENT,
};
pub use error::ConsoleError;
pub use push::{
    ConfigPushDistributor, ConfigSerializer, JsonConfigSerializer, PushOutcome, PushStatus,
};
pub use registry::{
    resolve_version, HeartbeatReport, InstallParams, ModuleRegistry, ModuleStatusProber,
    ReloadOutcome,
};
pub use result::{PageResult, RepeaterResult};
pub use store::{ConfigStore, InMemoryConfigStore, InMemoryModuleStore, ModuleStore};
pub use telemetry::{init_telemetry, shutdown_telemetry};
