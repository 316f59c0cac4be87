use std::sync::{Arc, RwLock};

use crate::core::mcp::McpToolInfo;

/// Holds the last `tools/list` result for a connector.
#[derive(Default, Clone)]
pub struct ToolListCache(Arc<RwLock<Option<Vec<McpToolInfo>>>>);

impl ToolListCache {
    pub fn get(&self) -> Option<Vec<McpToolInfo>> {
        self.0.read().ok()?.clone()
    }

    pub fn set(&self, tools: Vec<McpToolInfo>) {
        if let Ok(mut slot) = self.0.write() {
            *slot = Some(tools);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.0.write() {
            *slot = None;
        }
    }
}
