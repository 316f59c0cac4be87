use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::error::AgentError;
use crate::domain::ReasoningEffort;

pub const DEFAULT_MODEL: &str = "gpt-5";
pub const DEFAULT_MCP_URL: &str = "https://nimiq-mcp.je-cf9.workers.dev/sse";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful Nimiq ecosystem assistant with comprehensive access to:

**Blockchain Data:**
- Real-time account balances and transaction information
- Block and validator data
- Network statistics and supply information
- Staking rewards calculations

**Documentation & Learning Resources:**
- Complete Nimiq web client documentation and tutorials
- Protocol specifications and architecture guides
- Validator setup guides and best practices
- Full-text search across all Nimiq documentation

You can help users understand Nimiq's technology, build applications with the web client,
set up validators, analyze blockchain data, and learn about the Nimiq ecosystem.";

pub const DEFAULT_QUERIES: [&str; 5] = [
    "What's the current block number?",
    "Get the balance of NQ07 0000 0000 0000 0000 0000 0000 0000 0000",
    "Calculate staking rewards for 10,000 NIM staked for 365 days",
    "How many validators are currently active?",
    "Search the docs for information about validator setup",
];

/// Remote MCP connector parameters. These are handed to the connector as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConnectorConfig {
    pub name: String,
    pub server_label: String,
    pub url: String,
    pub timeout_secs: u64,
    pub cache_tools_list: bool,
    pub max_retry_attempts: u32,
    pub retry_backoff_seconds_base: u64,
    pub require_approval: String,
}

impl Default for McpConnectorConfig {
    fn default() -> Self {
        Self {
            name: "Nimiq Blockchain".into(),
            server_label: "nimiq".into(),
            url: DEFAULT_MCP_URL.into(),
            timeout_secs: 30,
            cache_tools_list: true,
            max_retry_attempts: 3,
            retry_backoff_seconds_base: 2,
            require_approval: "never".into(),
        }
    }
}

impl McpConnectorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_seconds_base)
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(AgentError::InvalidConfig(format!(
                "mcp url must be http(s): {}",
                self.url
            )));
        }
        if self.server_label.trim().is_empty() {
            return Err(AgentError::InvalidConfig("mcp server_label is empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(AgentError::InvalidConfig("mcp timeout_secs cannot be 0".into()));
        }
        Ok(())
    }
}

/// Everything needed to create the conversational agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub model: String,
    pub instructions: String,
    pub reasoning_effort: ReasoningEffort,
    pub tools: Vec<McpConnectorConfig>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            instructions: DEFAULT_INSTRUCTIONS.into(),
            reasoning_effort: ReasoningEffort::MEDIUM,
            tools: vec![McpConnectorConfig::default()],
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.model.trim().is_empty() {
            return Err(AgentError::InvalidConfig("model is empty".into()));
        }
        if self.tools.is_empty() {
            return Err(AgentError::InvalidConfig("no mcp connector configured".into()));
        }
        self.tools.iter().try_for_each(McpConnectorConfig::validate)
    }
}

/// HTTP settings for the model API adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_BASE_URL.into(),
            request_timeout_secs: 300,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub agent: AgentConfig,
    pub openai: OpenAiSettings,
    pub queries: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            openai: OpenAiSettings::default(),
            queries: DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    model: Option<String>,
    reasoning_effort: Option<ReasoningEffort>,
    instructions: Option<String>,
    queries: Option<Vec<String>>,
    mcp: Option<McpConnectorConfig>,
    openai: Option<OpenAiSettings>,
}

impl Settings {
    /// Defaults, then the TOML file named by `AGENT_CONFIG`, then env overrides.
    pub fn load() -> Result<Self, AgentError> {
        let mut settings = match std::env::var("AGENT_CONFIG") {
            Ok(path) if !path.trim().is_empty() => {
                let raw = std::fs::read_to_string(&path)?;
                tracing::debug!(path = %path, "loading agent config file");
                Self::from_toml_str(&raw)?
            }
            _ => Self::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, AgentError> {
        let file: FileConfig =
            toml::from_str(raw).map_err(|e| AgentError::InvalidConfig(e.to_string()))?;
        let mut s = Self::default();
        if let Some(model) = file.model {
            s.agent.model = model;
        }
        if let Some(effort) = file.reasoning_effort {
            s.agent.reasoning_effort = effort;
        }
        if let Some(instructions) = file.instructions {
            s.agent.instructions = instructions;
        }
        if let Some(queries) = file.queries {
            s.queries = queries;
        }
        if let Some(mcp) = file.mcp {
            s.agent.tools = vec![mcp];
        }
        if let Some(openai) = file.openai {
            s.openai = openai;
        }
        Ok(s)
    }

    fn apply_env(&mut self) {
        if let Some(url) = non_empty_env("OPENAI_BASE_URL") {
            self.openai.base_url = url;
        }
        if let Some(model) = non_empty_env("AGENT_MODEL") {
            self.agent.model = model;
        }
        if let Some(url) = non_empty_env("NIMIQ_MCP_URL") {
            for tool in &mut self.agent.tools {
                tool.url = url.clone();
            }
        }
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        self.agent.validate()?;
        if self.openai.request_timeout_secs == 0 {
            return Err(AgentError::InvalidConfig("openai request_timeout_secs cannot be 0".into()));
        }
        Ok(())
    }

    /// Connector used for direct MCP calls (`tools` subcommand).
    pub fn primary_connector(&self) -> Result<&McpConnectorConfig, AgentError> {
        self.agent
            .tools
            .first()
            .ok_or_else(|| AgentError::InvalidConfig("no mcp connector configured".into()))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for key in ["AGENT_CONFIG", "OPENAI_BASE_URL", "AGENT_MODEL", "NIMIQ_MCP_URL"] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn defaults_match_the_demo_connector() {
        let s = Settings::default();
        let mcp = &s.agent.tools[0];
        assert_eq!(mcp.url, DEFAULT_MCP_URL);
        assert_eq!(mcp.timeout_secs, 30);
        assert!(mcp.cache_tools_list);
        assert_eq!(mcp.max_retry_attempts, 3);
        assert_eq!(mcp.retry_backoff_seconds_base, 2);
        assert_eq!(s.agent.model, "gpt-5");
        assert_eq!(s.agent.reasoning_effort.level(), 3);
        assert_eq!(s.queries.len(), 5);
        assert_eq!(s.queries[0], "What's the current block number?");
        assert!(s.validate().is_ok());
    }

    #[test]
    fn toml_overrides_selected_fields() {
        let s = Settings::from_toml_str(
            r#"
            model = "gpt-5-mini"
            reasoning_effort = 5
            queries = ["one"]

            [mcp]
            url = "http://localhost:8787/mcp"
            max_retry_attempts = 1
            "#,
        )
        .unwrap();
        assert_eq!(s.agent.model, "gpt-5-mini");
        assert_eq!(s.agent.reasoning_effort.as_api_str(), "high");
        assert_eq!(s.queries, vec!["one".to_string()]);
        assert_eq!(s.agent.tools[0].url, "http://localhost:8787/mcp");
        assert_eq!(s.agent.tools[0].max_retry_attempts, 1);
        assert_eq!(s.agent.tools[0].timeout_secs, 30);
        assert_eq!(s.agent.instructions, DEFAULT_INSTRUCTIONS);
    }

    #[test]
    fn toml_rejects_bad_effort_and_unknown_keys() {
        assert!(Settings::from_toml_str("reasoning_effort = 9").is_err());
        assert!(Settings::from_toml_str("temperature = 1").is_err());
    }

    #[test]
    fn validate_rejects_non_http_connector() {
        let mut s = Settings::default();
        s.agent.tools[0].url = "ftp://nope".into();
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    #[serial]
    fn load_applies_env_overrides() {
        clear_env();
        std::env::set_var("OPENAI_BASE_URL", "http://127.0.0.1:1/v1");
        std::env::set_var("NIMIQ_MCP_URL", "http://127.0.0.1:2/mcp");
        std::env::set_var("AGENT_MODEL", "gpt-5-nano");
        let s = Settings::load().unwrap();
        assert_eq!(s.openai.base_url, "http://127.0.0.1:1/v1");
        assert_eq!(s.agent.tools[0].url, "http://127.0.0.1:2/mcp");
        assert_eq!(s.agent.model, "gpt-5-nano");
        clear_env();
    }

    #[test]
    #[serial]
    fn load_reads_file_from_agent_config() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "queries = [\"a\", \"b\"]").unwrap();
        std::env::set_var("AGENT_CONFIG", file.path());
        let s = Settings::load().unwrap();
        assert_eq!(s.queries, vec!["a".to_string(), "b".to_string()]);
        clear_env();
    }

    #[test]
    #[serial]
    fn load_fails_on_missing_file() {
        clear_env();
        std::env::set_var("AGENT_CONFIG", "/definitely/not/here.toml");
        assert!(matches!(Settings::load(), Err(AgentError::Io(_))));
        clear_env();
    }
}
