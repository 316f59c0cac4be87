//! Model API adapter: creates agents and runs them through the Responses API.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value as J};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::clients::mcp::McpServerStreamableHttp;
use crate::core::error::AgentError;
use crate::domain::{Agent, AgentResponse, Message, ReasoningEffort};
use crate::infra::config::{AgentConfig, OpenAiSettings};
use crate::infra::http::headers::{generate_request_id, ApiHeaders};
use crate::infra::runtime::limits::{make_http_client_with, retry_async, Backoff};

static AGENT_SEQ: AtomicU64 = AtomicU64::new(1);

#[derive(Clone)]
pub struct AgentClient {
    api_key: String,
    base: String,
    http: Client,
    backoff: Backoff,
}

impl AgentClient {
    pub fn new(api_key: impl Into<String>, settings: &OpenAiSettings) -> Result<Self, AgentError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AgentError::MissingCredential);
        }
        let http = make_http_client_with(Duration::from_secs(settings.request_timeout_secs))?;
        Ok(Self {
            api_key,
            base: settings.base_url.trim_end_matches('/').to_string(),
            http,
            backoff: Backoff::new(settings.max_retries, Duration::from_millis(500)),
        })
    }

    /// Reads the credential from `OPENAI_API_KEY`.
    pub fn from_env(settings: &OpenAiSettings) -> Result<Self, AgentError> {
        let key = std::env::var("OPENAI_API_KEY").map_err(|_| AgentError::MissingCredential)?;
        Self::new(key, settings)
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn create_agent(&self, config: AgentConfig) -> Result<RemoteAgent, AgentError> {
        config.validate()?;
        let tools = config
            .tools
            .iter()
            .cloned()
            .map(McpServerStreamableHttp::new)
            .collect::<Result<Vec<_>, _>>()?;
        let id = format!("agent-{}", AGENT_SEQ.fetch_add(1, Ordering::Relaxed));
        tracing::info!(
            agent_id = %id,
            model = %config.model,
            reasoning_effort = config.reasoning_effort.level(),
            tools = tools.len(),
            "agent created"
        );
        Ok(RemoteAgent {
            id,
            client: self.clone(),
            model: config.model,
            instructions: config.instructions,
            reasoning_effort: config.reasoning_effort,
            tools,
        })
    }
}

/// An agent bound to a model, a system prompt and its MCP connectors.
#[derive(Clone)]
pub struct RemoteAgent {
    id: String,
    client: AgentClient,
    model: String,
    instructions: String,
    reasoning_effort: ReasoningEffort,
    tools: Vec<McpServerStreamableHttp>,
}

impl RemoteAgent {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tools(&self) -> &[McpServerStreamableHttp] {
        &self.tools
    }

    pub fn request_body(&self, messages: &[Message]) -> J {
        let tools: Vec<J> = self.tools.iter().map(|t| t.hosted_tool()).collect();
        json!({
            "model": self.model,
            "instructions": self.instructions,
            "input": messages,
            "tools": tools,
            "reasoning": { "effort": self.reasoning_effort.as_api_str() },
        })
    }

    async fn send_once(&self, body: &J, req_id: &str) -> Result<ResponsesWire, AgentError> {
        let url = format!("{}/responses", self.client.base);
        let headers = ApiHeaders { api_key: &self.client.api_key, request_id: req_id };
        let resp = headers.apply(self.client.http.post(url)).json(body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::Upstream { status: status.as_u16(), body });
        }
        resp.json::<ResponsesWire>()
            .await
            .map_err(|e| AgentError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Agent for RemoteAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, messages: &[Message]) -> Result<AgentResponse, AgentError> {
        let body = self.request_body(messages);
        let req_id = generate_request_id();
        tracing::debug!(agent_id = %self.id, request_id = %req_id, "responses request");

        let start = Instant::now();
        let res = retry_async(
            self.client.backoff,
            |_| self.send_once(&body, &req_id),
            AgentError::is_retryable,
        )
        .await;
        if res.is_err() {
            crate::infra::logging::log_metric("agent.run", "remote_error_total", 1.0);
        }
        let wire = res?;
        let elapsed_ms = start.elapsed().as_millis() as f64;
        crate::infra::logging::log_metric("agent.run", "remote_latency_ms", elapsed_ms);
        tracing::info!(agent_id = %self.id, response_id = %wire.id, elapsed_ms, "agent run finished");

        AgentResponse::try_from(wire)
    }
}

#[derive(Debug, Deserialize)]
struct ResponsesWire {
    #[serde(default)]
    id: String,
    #[serde(default)]
    error: Option<ApiErrorWire>,
    #[serde(default)]
    output: Vec<OutputItemWire>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorWire {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OutputItemWire {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<ContentPartWire>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    error: Option<J>,
}

#[derive(Debug, Deserialize)]
struct ContentPartWire {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl TryFrom<ResponsesWire> for AgentResponse {
    type Error = AgentError;

    fn try_from(w: ResponsesWire) -> Result<Self, Self::Error> {
        if let Some(err) = w.error {
            let code = err.code.unwrap_or_else(|| "unknown".into());
            return Err(AgentError::Api(format!("{} ({code})", err.message)));
        }
        let mut parts = Vec::new();
        for item in &w.output {
            match item.kind.as_str() {
                "message" => parts.extend(
                    item.content
                        .iter()
                        .filter(|p| p.kind == "output_text")
                        .map(|p| p.text.as_str()),
                ),
                "mcp_call" => tracing::debug!(
                    tool = item.name.as_deref().unwrap_or("?"),
                    failed = item.error.as_ref().is_some_and(|e| !e.is_null()),
                    "mcp tool call"
                ),
                _ => {}
            }
        }
        if parts.is_empty() {
            return Err(AgentError::EmptyResponse);
        }
        Ok(AgentResponse { id: w.id, content: parts.join("") })
    }
}
