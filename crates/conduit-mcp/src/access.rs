use std::collections::HashMap;

use conduit_config::{McpAccessConfig, McpServerConfig};
use indexmap::IndexMap;

use crate::error::McpError;
use crate::qualified_name;

/// Per-server allow and deny lists for tool calls
#[derive(Debug, Default)]
pub struct AccessController {
    rules: HashMap<String, McpAccessConfig>,
}

impl AccessController {
    pub fn new(servers: &IndexMap<String, McpServerConfig>) -> Self {
        let rules = servers
            .iter()
            .filter_map(|(name, config)| config.access.clone().map(|access| (name.clone(), access)))
            .collect();

        Self { rules }
    }

    /// Check whether `tool` on `server` may be called
    ///
    /// Deny wins over allow. A non-empty allow list admits only the tools it
    /// names. Servers without rules admit everything.
    pub fn check(&self, server: &str, tool: &str) -> Result<(), McpError> {
        let Some(access) = self.rules.get(server) else {
            return Ok(());
        };

        let denied = access.deny.iter().any(|denied| denied == tool);
        let not_allowed = !access.allow.is_empty() && !access.allow.iter().any(|allowed| allowed == tool);

        if denied || not_allowed {
            return Err(McpError::AccessDenied {
                tool: qualified_name(server, tool),
            });
        }

        Ok(())
    }

    /// Non-failing variant of [`check`](Self::check)
    pub fn is_allowed(&self, server: &str, tool: &str) -> bool {
        self.check(server, tool).is_ok()
    }
}
