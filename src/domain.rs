// Domain types for the module catalog and probe results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default port the sandbox container listens on when none is supplied.
pub const DEFAULT_AGENT_PORT: &str = "12580";

/// Default deployment environment tag.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Activation state of a registered module instance.
///
/// Transitions happen only through `active`/`frozen` registry calls and are
/// gated by remote confirmation. Deletion is not a status, it is removal
/// from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "FROZEN")]
    Frozen,
}

impl ModuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleStatus::Active => "ACTIVE",
            ModuleStatus::Frozen => "FROZEN",
        }
    }
}

impl std::fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registered agent process, identified by (app_name, ip).
///
/// Exclusively owned by the registry; `gmt_modified` doubles as the
/// heartbeat / last-change timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub app_name: String,
    pub ip: String,
    pub port: String,
    pub environment: String,
    pub version: String,
    pub status: ModuleStatus,
    pub gmt_create: DateTime<Utc>,
    pub gmt_modified: DateTime<Utc>,
}

impl ModuleInfo {
    /// Catalog identity key.
    pub fn key(&self) -> (String, String) {
        (self.app_name.clone(), self.ip.clone())
    }
}

/// A configuration payload targeted at an (app_name, environment) pair.
/// The payload itself is opaque structured text (JSON in practice).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub app_name: String,
    pub environment: String,
    pub config: String,
    pub gmt_create: DateTime<Utc>,
    pub gmt_modified: DateTime<Utc>,
}

/// Ephemeral health snapshot produced by a single probe. Never persisted.
///
/// `failure_count` reflects only the outcome of the current probe call
/// (0 on a healthy probe, 1 on a failed one), not a running count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleStatusDetail {
    pub online: bool,
    pub response_time_ms: u64,
    pub module_active: bool,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub last_reload_time: Option<DateTime<Utc>>,
    pub module_detail: Option<String>,
    pub error: Option<String>,
    pub failure_count: u32,
}

impl ModuleStatusDetail {
    /// Coarse latency bucket: fast < 1000ms, normal < 3000ms, else slow.
    pub fn latency_level(&self) -> &'static str {
        if !self.online {
            return "offline";
        }
        if self.response_time_ms < 1000 {
            "fast"
        } else if self.response_time_ms < 3000 {
            "normal"
        } else {
            "slow"
        }
    }

    pub fn status_description(&self) -> &'static str {
        if !self.online {
            "offline"
        } else if !self.module_active {
            "abnormal"
        } else {
            "ok"
        }
    }
}

/// Filter + paging parameters for module catalog queries. Every field is
/// optional; the store matches on whatever subset is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInfoParams {
    pub app_name: Option<String>,
    pub ip: Option<String>,
    pub port: Option<String>,
    pub environment: Option<String>,
    pub page: usize,
    pub size: usize,
}

impl Default for ModuleInfoParams {
    fn default() -> Self {
        Self {
            app_name: None,
            ip: None,
            port: None,
            environment: None,
            page: 1,
            size: 10,
        }
    }
}

impl ModuleInfoParams {
    pub fn for_app(app_name: impl Into<String>) -> Self {
        Self {
            app_name: Some(app_name.into()),
            ..Default::default()
        }
    }

    pub fn for_app_and_environment(
        app_name: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            app_name: Some(app_name.into()),
            environment: Some(environment.into()),
            ..Default::default()
        }
    }
}

/// Filter + paging parameters for config queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfigParams {
    pub app_name: Option<String>,
    pub environment: Option<String>,
    pub page: usize,
    pub size: usize,
}

impl Default for ModuleConfigParams {
    fn default() -> Self {
        Self {
            app_name: None,
            environment: None,
            page: 1,
            size: 10,
        }
    }
}
