use rmcp::model::{ClientInfo, ProtocolVersion};
use rmcp::service::{ClientInitializeError, RoleClient, RunningService, ServiceError, ServiceExt};
use rmcp::transport::StreamableHttpClientTransport;
use serde_json::{json, Value as J};
use std::time::Instant;

use crate::core::error::{map_client_initialize_error, map_service_error, AgentError};
use crate::core::mcp::McpToolInfo;
use crate::infra::config::McpConnectorConfig;
use crate::infra::runtime::limits::{retry_async, Backoff};
use crate::infra::runtime::tool_cache::ToolListCache;

type McpSession = RunningService<RoleClient, ClientInfo>;

/// Remote MCP server reached over streamable HTTP.
///
/// The agent runtime talks to the server itself; this side only keeps the
/// connection parameters and can ask the server which tools it exposes.
#[derive(Clone)]
pub struct McpServerStreamableHttp {
    config: McpConnectorConfig,
    cache: ToolListCache,
}

impl McpServerStreamableHttp {
    pub fn new(config: McpConnectorConfig) -> Result<Self, AgentError> {
        config.validate()?;
        Ok(Self { config, cache: ToolListCache::default() })
    }

    pub fn config(&self) -> &McpConnectorConfig {
        &self.config
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.config.max_retry_attempts, self.config.backoff_base())
    }

    /// Hosted tool definition for the Responses API `tools` array.
    pub fn hosted_tool(&self) -> J {
        json!({
            "type": "mcp",
            "server_label": self.config.server_label,
            "server_url": self.config.url,
            "require_approval": self.config.require_approval,
        })
    }

    pub fn invalidate_tools_cache(&self) {
        self.cache.clear();
    }

    pub async fn list_tools(&self) -> Result<Vec<McpToolInfo>, AgentError> {
        if self.config.cache_tools_list {
            if let Some(tools) = self.cache.get() {
                tracing::debug!(server = %self.config.server_label, "tools/list served from cache");
                return Ok(tools);
            }
        }

        let start = Instant::now();
        let res = retry_async(
            self.backoff(),
            |_| self.fetch_tools(),
            AgentError::is_retryable,
        )
        .await;
        if res.is_err() {
            crate::infra::logging::log_metric("mcp.tools_list", "remote_error_total", 1.0);
        }
        let tools = res?;
        let elapsed_ms = start.elapsed().as_millis() as f64;
        crate::infra::logging::log_metric("mcp.tools_list", "remote_latency_ms", elapsed_ms);

        if self.config.cache_tools_list {
            self.cache.set(tools.clone());
        }
        Ok(tools)
    }

    /// One attempt: handshake, page through `tools/list`, close the session.
    async fn fetch_tools(&self) -> Result<Vec<McpToolInfo>, AgentError> {
        let timeout = self.config.timeout();
        tokio::time::timeout(timeout, self.list_tools_in_session())
            .await
            .map_err(|_| {
                AgentError::Transport(format!(
                    "mcp server did not answer within {}s",
                    timeout.as_secs()
                ))
            })?
    }

    async fn list_tools_in_session(&self) -> Result<Vec<McpToolInfo>, AgentError> {
        let session = self.connect().await?;
        tracing::debug!(endpoint = %self.config.url, "mcp session initialized");

        let listed = match session.list_all_tools().await {
            Ok(tools) => Ok(tools),
            Err(ServiceError::UnexpectedResponse) => {
                session.list_tools(None).await.map(|page| page.tools)
            }
            Err(error) => Err(error),
        };
        if let Err(e) = session.cancel().await {
            tracing::debug!(error = %e, "mcp session shutdown failed");
        }

        let tools = listed.map_err(|e| map_service_error("tools/list", e))?;
        Ok(tools.into_iter().map(McpToolInfo::from).collect())
    }

    async fn connect(&self) -> Result<McpSession, AgentError> {
        let latest = ClientInfo {
            protocol_version: ProtocolVersion::LATEST,
            ..Default::default()
        };
        match latest.serve(StreamableHttpClientTransport::from_uri(self.config.url.clone())).await {
            Ok(session) => return Ok(session),
            Err(error) if should_retry_protocol_fallback(&error) => {
                tracing::debug!(error = %error, "falling back to MCP protocol 2024-11-05");
            }
            Err(error) => return Err(map_client_initialize_error(error)),
        }

        let fallback = ClientInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            ..Default::default()
        };
        fallback
            .serve(StreamableHttpClientTransport::from_uri(self.config.url.clone()))
            .await
            .map_err(map_client_initialize_error)
    }
}

fn should_retry_protocol_fallback(error: &ClientInitializeError) -> bool {
    match error {
        ClientInitializeError::JsonRpcError(error) => {
            let message = error.message.to_ascii_lowercase();
            message.contains("protocol") && message.contains("version")
        }
        _ => false,
    }
}
