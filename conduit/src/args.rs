use std::path::PathBuf;

use clap::Parser;

/// Conduit LLM gateway
#[derive(Debug, Parser)]
#[command(name = "conduit", about = "Send one prompt through a configured LLM provider, resolving tool calls on the way")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "conduit.toml", env = "CONDUIT_CONFIG")]
    pub config: PathBuf,

    /// Configured provider name
    #[arg(short, long, env = "CONDUIT_PROVIDER")]
    pub provider: String,

    /// Model to request
    #[arg(short, long, env = "CONDUIT_MODEL")]
    pub model: String,

    /// Optional system prompt
    #[arg(long)]
    pub system: Option<String>,

    /// Caller key, used when the provider forwards authorization
    #[arg(long, env = "CONDUIT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print the answer as it streams in
    #[arg(long)]
    pub stream: bool,

    /// Do not offer MCP tools to the model
    #[arg(long)]
    pub no_tools: bool,

    /// The user prompt
    pub prompt: String,
}
