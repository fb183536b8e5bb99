use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a placeholder cannot be
    /// resolved, the TOML is malformed, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency found
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_llm_config()?;
        self.validate_mcp_config()?;
        Ok(())
    }

    fn validate_llm_config(&self) -> anyhow::Result<()> {
        if self.llm.tool_calls.stream_buffer == 0 {
            anyhow::bail!("llm.tool_calls.stream_buffer must be greater than 0");
        }

        if self.llm.providers.keys().any(|name| name.trim().is_empty()) {
            anyhow::bail!("LLM provider names must not be empty");
        }

        Ok(())
    }

    fn validate_mcp_config(&self) -> anyhow::Result<()> {
        for (name, server) in &self.mcp.servers {
            if let Some(ref access) = server.access
                && !access.allow.is_empty()
                && !access.deny.is_empty()
            {
                anyhow::bail!("MCP server '{name}' cannot have both allow and deny lists");
            }
        }

        Ok(())
    }
}
