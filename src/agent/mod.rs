// Remote agent control surface - trait for dependency injection, reqwest impl for production

pub mod http;

use async_trait::async_trait;

pub use http::HttpAgentClient;

use crate::config::EndpointTemplates;

/// Outcome of one HTTP call to an agent. Failures are folded into
/// `success = false` with a message; the client never returns an Err, which
/// keeps probe paths infallible by construction.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    pub success: bool,
    pub body: String,
    pub message: String,
}

impl AgentResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            success: true,
            body: body.into(),
            message: String::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            body: String::new(),
            message: message.into(),
        }
    }
}

/// Plain HTTP GET against an agent control endpoint.
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn get(&self, url: &str) -> AgentResponse;
}

/// URL templates for the agent control surface, rendered per instance.
///
/// Templates carry `{ip}` and `{port}` placeholders and are injected from
/// configuration rather than hardcoded, so tests and alternate deployments
/// can point them anywhere.
#[derive(Debug, Clone)]
pub struct AgentEndpoints {
    templates: EndpointTemplates,
}

impl AgentEndpoints {
    pub fn new(templates: EndpointTemplates) -> Self {
        Self { templates }
    }

    fn render(template: &str, ip: &str, port: &str) -> String {
        template.replace("{ip}", ip).replace("{port}", port)
    }

    /// Generic liveness endpoint (module list).
    pub fn list_url(&self, ip: &str, port: &str) -> String {
        Self::render(&self.templates.list, ip, port)
    }

    /// Module detail endpoint; the body carries status and version hints.
    pub fn detail_url(&self, ip: &str, port: &str) -> String {
        Self::render(&self.templates.detail, ip, port)
    }

    pub fn active_url(&self, ip: &str, port: &str) -> String {
        Self::render(&self.templates.active, ip, port)
    }

    pub fn frozen_url(&self, ip: &str, port: &str) -> String {
        Self::render(&self.templates.frozen, ip, port)
    }

    pub fn reload_url(&self, ip: &str, port: &str) -> String {
        Self::render(&self.templates.reload, ip, port)
    }

    /// Config push endpoint with the serialized payload embedded as the
    /// `_data` query parameter. The payload must already be URL-encoded.
    pub fn push_config_url(&self, ip: &str, port: &str, encoded_data: &str) -> String {
        format!(
            "{}?_data={}",
            Self::render(&self.templates.push_config, ip, port),
            encoded_data
        )
    }
}

impl Default for AgentEndpoints {
    fn default() -> Self {
        Self::new(EndpointTemplates::default())
    }
}
