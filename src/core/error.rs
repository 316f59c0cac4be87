use thiserror::Error;

/// Error model shared by the agent client, the MCP connector and the session driver.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("OPENAI_API_KEY is not set")]
    MissingCredential,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("api error: {0}")]
    Api(String),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("agent returned no text output")]
    EmptyResponse,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Transport failures, rate limiting and server errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::Transport(_) => true,
            AgentError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AgentError::Decode(e.to_string())
        } else {
            AgentError::Transport(e.to_string())
        }
    }
}

/// Handshake failures on the wire are transient; protocol-level refusals are not.
pub fn map_client_initialize_error(error: rmcp::service::ClientInitializeError) -> AgentError {
    use rmcp::service::ClientInitializeError;
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            AgentError::Transport(format!("mcp initialize connection closed: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => {
            AgentError::Transport(format!("mcp initialize transport error ({context}): {error}"))
        }
        ClientInitializeError::JsonRpcError(error) => AgentError::Api(format!(
            "mcp initialize JSON-RPC error {}: {}",
            error.code.0, error.message
        )),
        other => AgentError::Api(format!("mcp initialize error: {other}")),
    }
}

pub fn map_service_error(context: &str, error: rmcp::service::ServiceError) -> AgentError {
    use rmcp::service::ServiceError;
    match error {
        ServiceError::McpError(error) => AgentError::Api(format!(
            "{context}: mcp error {}: {}",
            error.code.0, error.message
        )),
        ServiceError::TransportSend(error) => {
            AgentError::Transport(format!("{context}: mcp transport send failed: {error}"))
        }
        ServiceError::TransportClosed => {
            AgentError::Transport(format!("{context}: mcp transport closed"))
        }
        ServiceError::Timeout { timeout } => AgentError::Transport(format!(
            "{context}: mcp request timed out after {}ms",
            timeout.as_millis()
        )),
        other => AgentError::Api(format!("{context}: {other}")),
    }
}
