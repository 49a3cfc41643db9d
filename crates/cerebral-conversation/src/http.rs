use async_trait::async_trait;
use cerebral_core::{CerebralError, Result};
use reqwest::{Client, IntoUrl, Url};
use serde_json::Value;
use tracing::debug;

use crate::backend::*;

/// Conversation service over HTTP+JSON. Routes live under `{base_url}/conversation/`.
pub struct HttpConversationBackend {
    client: Client,
    base_url: String,
}

impl HttpConversationBackend {
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
        format!("{}/conversation/{}", self.base_url, route)
    }

    /// `{base_url}/conversation/session/{id}` with the id percent-encoded as one segment.
    fn session_url(&self, session_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url("session"))
            .map_err(|e| CerebralError::Transport(format!("session: bad base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| CerebralError::Transport("session: base url cannot hold a path".into()))?
            .push(session_id);
        Ok(url)
    }

    async fn read_json(route: &str, resp: reqwest::Response) -> Result<Value> {
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CerebralError::Transport(format!("{route}: HTTP {status}: {text}")));
        }
        resp.json()
            .await
            .map_err(|e| CerebralError::Transport(format!("{route}: malformed body: {e}")))
    }

    fn reject_failure(route: &str, data: Value) -> Result<Value> {
        if data.get("success").and_then(Value::as_bool) == Some(false) {
            let reason = data["error"].as_str().unwrap_or("service reported failure");
            return Err(CerebralError::Transport(format!("{route}: {reason}")));
        }
        Ok(data)
    }

    fn field<T: serde::de::DeserializeOwned>(route: &str, data: &mut Value, key: &str) -> Result<T> {
        let value = data.get_mut(key).map(Value::take).unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|e| CerebralError::Transport(format!("{route}: bad `{key}`: {e}")))
    }

    async fn get(&self, route: &str) -> Result<Value> {
        self.get_at(route, self.url(route)).await
    }

    async fn get_at(&self, route: &str, url: impl IntoUrl) -> Result<Value> {
        debug!(route, "conversation service GET");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CerebralError::Transport(format!("{route}: {e}")))?;
        Self::read_json(route, resp).await
    }

    async fn post(&self, route: &str, body: &impl serde::Serialize) -> Result<Value> {
        debug!(route, "conversation service POST");
        let resp = self
            .client
            .post(self.url(route))
            .json(body)
            .send()
            .await
            .map_err(|e| CerebralError::Transport(format!("{route}: {e}")))?;
        Self::read_json(route, resp).await
    }
}

#[async_trait]
impl ConversationBackend for HttpConversationBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn health(&self) -> Result<ConversationStats> {
        let mut data = self.get("health").await?;
        Self::field("health", &mut data, "conversation_stats")
    }

    async fn start(&self, request: &StartRequest) -> Result<StartResponse> {
        let data = Self::reject_failure("start", self.post("start", request).await?)?;
        serde_json::from_value(data)
            .map_err(|e| CerebralError::Transport(format!("start: malformed body: {e}")))
    }

    async fn message(&self, request: &MessageRequest) -> Result<TurnResult> {
        let mut data = self.post("message", request).await?;
        // The envelope repeats the inner success flag; only a missing result is transport.
        if data.get("result").is_some_and(Value::is_object) {
            return serde_json::from_value(data["result"].take())
                .map_err(|e| CerebralError::Transport(format!("message: bad `result`: {e}")));
        }
        Self::reject_failure("message", data)?;
        Err(CerebralError::Transport("message: response carried no result".into()))
    }

    async fn agents(&self) -> Result<Vec<AgentDescriptor>> {
        let mut data = Self::reject_failure("agents", self.get("agents").await?)?;
        Self::field("agents", &mut data, "agents")
    }

    async fn flows(&self) -> Result<Vec<FlowDescriptor>> {
        let mut data = Self::reject_failure("flows", self.get("flows").await?)?;
        Self::field("flows", &mut data, "flows")
    }

    async fn session(&self, session_id: &str) -> Result<SessionSnapshot> {
        let url = self.session_url(session_id)?;
        let route = format!("session/{session_id}");
        let mut data = Self::reject_failure(&route, self.get_at(&route, url).await?)?;
        Self::field(&route, &mut data, "session")
    }
}
