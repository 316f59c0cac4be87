//! Core types: error model and the MCP protocol surface.

pub mod error;
pub mod mcp;
