use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for the repeater console
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RepeaterConsoleConfig {
    /// Remote agent settings
    pub agent: AgentSettings,
    /// Config push fan-out settings
    pub push: PushSettings,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Port assumed for an agent when install omits one
    pub default_port: String,
    /// Per-request timeout for agent control calls, in seconds
    pub http_timeout_seconds: u64,
    /// Control endpoint URL templates ({ip}/{port} placeholders)
    pub endpoints: EndpointTemplates,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            default_port: crate::domain::DEFAULT_AGENT_PORT.to_string(),
            http_timeout_seconds: 10,
            endpoints: EndpointTemplates::default(),
        }
    }
}

/// URL templates for the sandbox container's module-management surface.
/// Defaults match the stock jvm-sandbox deployment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointTemplates {
    pub list: String,
    pub detail: String,
    pub active: String,
    pub frozen: String,
    pub reload: String,
    pub push_config: String,
}

impl Default for EndpointTemplates {
    fn default() -> Self {
        Self {
            list: "http://{ip}:{port}/sandbox/default/module/http/sandbox-module-mgr/list"
                .to_string(),
            detail:
                "http://{ip}:{port}/sandbox/default/module/http/sandbox-module-mgr/detail?id=repeater"
                    .to_string(),
            active:
                "http://{ip}:{port}/sandbox/default/module/http/sandbox-module-mgr/active?ids=repeater"
                    .to_string(),
            frozen:
                "http://{ip}:{port}/sandbox/default/module/http/sandbox-module-mgr/frozen?ids=repeater"
                    .to_string(),
            reload: "http://{ip}:{port}/sandbox/default/module/http/repeater/reload".to_string(),
            push_config: "http://{ip}:{port}/sandbox/default/module/http/repeater/pushConfig"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PushSettings {
    /// Bound on in-flight push calls during fan-out
    pub concurrency: usize,
    /// Page size used when selecting push targets
    pub query_size: usize,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            concurrency: 8,
            query_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl RepeaterConsoleConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (repeater-console.toml)
    /// 3. Environment variables (prefixed with REPEATER_CONSOLE_)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("repeater-console.toml").exists() {
            builder = builder.add_source(File::with_name("repeater-console"));
        }

        builder = builder.add_source(
            Environment::with_prefix("REPEATER_CONSOLE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<RepeaterConsoleConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = RepeaterConsoleConfig::load_env_file();
        RepeaterConsoleConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static RepeaterConsoleConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
