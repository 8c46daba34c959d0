// reqwest-backed agent client

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::agent::{AgentClient, AgentResponse};

/// Production agent client. One pooled reqwest client shared by all calls;
/// the per-request timeout is the only cancellation contract the core has.
#[derive(Debug, Clone)]
pub struct HttpAgentClient {
    client: reqwest::Client,
}

impl HttpAgentClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn get(&self, url: &str) -> AgentResponse {
        debug!(url, "calling agent endpoint");
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                if status.is_success() {
                    AgentResponse::ok(body)
                } else {
                    AgentResponse::failure(format!("http status {status}"))
                }
            }
            Err(e) => AgentResponse::failure(e.to_string()),
        }
    }
}
