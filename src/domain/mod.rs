use serde::{Deserialize, Serialize};

use crate::core::error::AgentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// One conversational turn sent to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentResponse {
    pub id: String,
    pub content: String,
}

/// Reasoning effort on a 1..=5 scale, rendered as the effort names the
/// Responses API understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ReasoningEffort(u8);

impl ReasoningEffort {
    pub const MEDIUM: ReasoningEffort = ReasoningEffort(3);

    pub fn new(level: u8) -> Result<Self, AgentError> {
        if (1..=5).contains(&level) {
            Ok(Self(level))
        } else {
            Err(AgentError::InvalidConfig(format!(
                "reasoning_effort must be between 1 and 5, got {level}"
            )))
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn as_api_str(self) -> &'static str {
        match self.0 {
            1 => "minimal",
            2 => "low",
            3 => "medium",
            _ => "high",
        }
    }
}

impl Default for ReasoningEffort {
    fn default() -> Self {
        Self::MEDIUM
    }
}

impl TryFrom<u8> for ReasoningEffort {
    type Error = AgentError;
    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<ReasoningEffort> for u8 {
    fn from(e: ReasoningEffort) -> Self {
        e.0
    }
}

/// A conversational agent that answers messages, possibly calling remote tools.
#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    fn id(&self) -> &str;
    async fn run(&self, messages: &[Message]) -> Result<AgentResponse, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_effort_levels_to_api_names() {
        let names: Vec<_> = (1..=5)
            .map(|l| ReasoningEffort::new(l).unwrap().as_api_str())
            .collect();
        assert_eq!(names, ["minimal", "low", "medium", "high", "high"]);
    }

    #[test]
    fn rejects_out_of_range_effort() {
        assert!(ReasoningEffort::new(0).is_err());
        assert!(ReasoningEffort::new(6).is_err());
        assert_eq!(ReasoningEffort::default().level(), 3);
    }

    #[test]
    fn user_message_serializes_with_lowercase_role() {
        let v = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(v, serde_json::json!({"role": "user", "content": "hi"}));
    }
}
