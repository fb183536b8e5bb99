#![allow(clippy::must_use_candidate)]

mod env;
pub mod llm;
mod loader;
pub mod mcp;
pub mod telemetry;

use serde::Deserialize;

pub use llm::*;
pub use mcp::*;
pub use telemetry::*;

/// Top-level conduit configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// LLM provider and tool-call orchestration configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// MCP server configuration backing tool execution
    #[serde(default)]
    pub mcp: McpConfig,
    /// Logging and trace export configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
