//! MCP servers as the tool executor for conduit
//!
//! Connects to the configured downstream servers and runs model tool calls
//! named `server__tool` on them, subject to per-server access rules.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod access;
pub mod downstream;
pub mod error;
pub mod executor;

pub use error::McpError;
pub use executor::McpExecutor;

/// Separator between server name and tool name
const TOOL_SEPARATOR: &str = "__";

/// Gateway-wide name of `tool` on `server`
pub fn qualified_name(server: &str, tool: &str) -> String {
    format!("{server}{TOOL_SEPARATOR}{tool}")
}

/// Split `server__tool` at the first separator
pub fn parse_qualified_name(qualified: &str) -> Option<(&str, &str)> {
    qualified
        .split_once(TOOL_SEPARATOR)
        .filter(|(server, tool)| !server.is_empty() && !tool.is_empty())
}
