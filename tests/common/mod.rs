// Shared test doubles - scripted agent responses, no network
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use repeater_console::{
    AgentClient, AgentResponse, InMemoryConfigStore, InMemoryModuleStore, ModuleConfig,
    ModuleInfo, ModuleStatus,
};

/// Agent client that answers from a fixed script: the first rule whose
/// pattern is a substring of the requested URL wins. Unmatched URLs look
/// like a dead host.
pub struct ScriptedAgentClient {
    rules: Mutex<Vec<(String, AgentResponse)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedAgentClient {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_rule(self, pattern: &str, response: AgentResponse) -> Self {
        self.rules
            .lock()
            .unwrap()
            .push((pattern.to_string(), response));
        self
    }

    /// Every URL this client was asked to call, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentClient for ScriptedAgentClient {
    async fn get(&self, url: &str) -> AgentResponse {
        self.calls.lock().unwrap().push(url.to_string());
        let rules = self.rules.lock().unwrap();
        for (pattern, response) in rules.iter() {
            if url.contains(pattern.as_str()) {
                return response.clone();
            }
        }
        AgentResponse::failure("connection refused")
    }
}

/// An agent that answers every endpoint successfully, with a versioned
/// detail body.
pub fn healthy_agent() -> Arc<ScriptedAgentClient> {
    Arc::new(
        ScriptedAgentClient::new()
            .with_rule("detail?id=repeater", AgentResponse::ok(" VERSION : 1.4.0\nACTIVE"))
            .with_rule("sandbox-module-mgr/list", AgentResponse::ok("repeater"))
            .with_rule("active?ids=repeater", AgentResponse::ok("ok"))
            .with_rule("frozen?ids=repeater", AgentResponse::ok("ok"))
            .with_rule("repeater/reload", AgentResponse::ok("ok"))
            .with_rule("repeater/pushConfig", AgentResponse::ok("ok")),
    )
}

pub fn module(app_name: &str, ip: &str, environment: &str) -> ModuleInfo {
    let now = Utc::now();
    ModuleInfo {
        app_name: app_name.to_string(),
        ip: ip.to_string(),
        port: "12580".to_string(),
        environment: environment.to_string(),
        version: "1.0.0".to_string(),
        status: ModuleStatus::Active,
        gmt_create: now,
        gmt_modified: now,
    }
}

pub fn config(app_name: &str, environment: &str, payload: &str) -> ModuleConfig {
    let now = Utc::now();
    ModuleConfig {
        app_name: app_name.to_string(),
        environment: environment.to_string(),
        config: payload.to_string(),
        gmt_create: now,
        gmt_modified: now,
    }
}

pub fn module_store() -> Arc<InMemoryModuleStore> {
    Arc::new(InMemoryModuleStore::new())
}

pub fn config_store() -> Arc<InMemoryConfigStore> {
    Arc::new(InMemoryConfigStore::new())
}
