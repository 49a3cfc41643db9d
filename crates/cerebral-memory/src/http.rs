use async_trait::async_trait;
use cerebral_core::{CerebralError, Result};
use reqwest::Client;
use tracing::debug;

use crate::backend::*;

/// Memory service over HTTP+JSON.
pub struct HttpMemoryBackend {
    client: Client,
    base_url: String,
}

impl HttpMemoryBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route)
    }

    async fn decode(route: &str, resp: reqwest::Response) -> Result<serde_json::Value> {
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CerebralError::Transport(format!("{route}: HTTP {status}: {text}")));
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CerebralError::Transport(format!("{route}: malformed body: {e}")))?;

        if data.get("success").and_then(|v| v.as_bool()) == Some(false) {
            let reason = data["error"].as_str().unwrap_or("backend reported failure");
            return Err(CerebralError::Transport(format!("{route}: {reason}")));
        }
        Ok(data)
    }

    async fn post(&self, route: &str, body: &impl serde::Serialize) -> Result<serde_json::Value> {
        debug!(route, "memory service POST");
        let resp = self
            .client
            .post(self.url(route))
            .json(body)
            .send()
            .await
            .map_err(|e| CerebralError::Transport(format!("{route}: {e}")))?;
        Self::decode(route, resp).await
    }
}

#[async_trait]
impl MemoryBackend for HttpMemoryBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<serde_json::Value>> {
        let data = self.post("search", request).await?;
        // Older deployments answer under `results`.
        let list = data.get("memories").or_else(|| data.get("results"));
        match list {
            Some(serde_json::Value::Array(items)) => Ok(items.clone()),
            Some(serde_json::Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(CerebralError::Transport(format!(
                "search: expected a list of memories, got {other}"
            ))),
        }
    }

    async fn add(&self, request: &AddRequest) -> Result<serde_json::Value> {
        let data = self.post("add", request).await?;
        Ok(data.get("memory").cloned().unwrap_or(data))
    }

    async fn delete(&self, request: &DeleteRequest) -> Result<()> {
        self.post("delete", request).await.map(|_| ())
    }

    async fn stats(&self, user_id: &str) -> Result<StatsResponse> {
        debug!("memory service GET stats");
        let resp = self
            .client
            .get(self.url("stats"))
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(|e| CerebralError::Transport(format!("stats: {e}")))?;
        let data = Self::decode("stats", resp).await?;
        serde_json::from_value(data)
            .map_err(|e| CerebralError::Transport(format!("stats: malformed body: {e}")))
    }
}
