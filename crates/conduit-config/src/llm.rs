use std::time::Duration;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use url::Url;

/// Default capacity of the interceptor's output channel
pub const DEFAULT_STREAM_BUFFER: usize = 256;

/// Top-level LLM configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// LLM provider configurations keyed by name
    #[serde(default)]
    pub providers: IndexMap<String, LlmProviderConfig>,
    /// Tool-call orchestration settings
    #[serde(default)]
    pub tool_calls: ToolCallConfig,
}

/// Configuration for a single LLM provider
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmProviderConfig {
    /// Provider protocol type
    #[serde(rename = "type")]
    pub provider_type: LlmProviderType,
    /// API key for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Allow callers to override the configured key per request
    #[serde(default)]
    pub forward_authorization: bool,
}

/// Supported LLM provider protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProviderType {
    /// OpenAI-compatible API
    Openai,
}

/// Settings for tool-call resolution on both response paths
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolCallConfig {
    /// Capacity of the bounded output stream produced by the interceptor
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
    /// Deadline for a single tool execution (e.g. "30s")
    #[serde(default, deserialize_with = "deserialize_optional_duration")]
    pub tool_timeout: Option<Duration>,
    /// Deadline for the follow-up dispatch (e.g. "2m")
    #[serde(default, deserialize_with = "deserialize_optional_duration")]
    pub followup_timeout: Option<Duration>,
    /// Execute a batch of tool calls concurrently, keeping result order
    #[serde(default)]
    pub parallel: bool,
}

impl Default for ToolCallConfig {
    fn default() -> Self {
        Self {
            stream_buffer: DEFAULT_STREAM_BUFFER,
            tool_timeout: None,
            followup_timeout: None,
            parallel: false,
        }
    }
}

const fn default_stream_buffer() -> usize {
    DEFAULT_STREAM_BUFFER
}

/// Parse an optional human-readable duration such as `"30s"` or `"2m"`
fn deserialize_optional_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;

    raw.map(|s| {
        duration_str::parse(&s).map_err(|e| serde::de::Error::custom(format!("invalid duration '{s}': {e}")))
    })
    .transpose()
}
