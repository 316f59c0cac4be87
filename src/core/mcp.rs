//! Tool metadata as reported by an MCP server.

use serde::{Deserialize, Serialize};
use serde_json::Value as J;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct McpToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: J,
}

impl From<rmcp::model::Tool> for McpToolInfo {
    fn from(tool: rmcp::model::Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.map(|d| d.to_string()),
            input_schema: J::Object((*tool.input_schema).clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_rmcp_tool_keeping_schema() {
        let schema = json!({"type": "object", "properties": {"address": {"type": "string"}}});
        let tool = rmcp::model::Tool::new(
            "getAccountByAddress",
            "Account details for an address",
            schema.as_object().cloned().unwrap(),
        );
        let info = McpToolInfo::from(tool);
        assert_eq!(info.name, "getAccountByAddress");
        assert_eq!(info.description.as_deref(), Some("Account details for an address"));
        assert_eq!(info.input_schema, schema);
    }

    #[test]
    fn serializes_schema_under_mcp_key() {
        let info = McpToolInfo {
            name: "getBlockNumber".into(),
            description: None,
            input_schema: json!({"type": "object"}),
        };
        let v = serde_json::to_value(&info).unwrap();
        assert_eq!(v["inputSchema"]["type"], "object");
    }
}
