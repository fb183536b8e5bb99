#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::sync::Arc;

use args::Args;
use clap::Parser;
use conduit_config::Config;
use conduit_core::RequestContext;
use conduit_llm::types::ToolDefinition;
use conduit_llm::{Gateway, Message, Request, ToolExecutor};
use conduit_mcp::McpExecutor;
use futures_util::StreamExt;
use secrecy::SecretString;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;
    let _telemetry_guard = conduit_telemetry::init(&config.telemetry)?;

    tracing::info!(config_path = %args.config.display(), "starting conduit");

    let (executor, tools) = if config.mcp.is_enabled() && !args.no_tools {
        let executor = McpExecutor::connect(&config.mcp).await;
        let tools = executor.tools().to_vec();
        (Some(Arc::new(executor) as Arc<dyn ToolExecutor>), tools)
    } else {
        (None, Vec::new())
    };

    let gateway = Gateway::from_config(&config.llm, executor)?;

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

    let mut context = RequestContext::with_parent(&shutdown);
    if let Some(key) = args.api_key.clone() {
        context = context.with_api_key(SecretString::from(key));
    }

    let request = build_request(&args, tools);

    if args.stream {
        stream_answer(&gateway, request, &context, &mut tokio::io::stdout()).await?;
    } else {
        let response = gateway.complete(request, &context).await?;
        let text = response
            .choices
            .first_message()
            .map(|message| message.content.as_text())
            .unwrap_or_default();
        println!("{text}");
    }

    Ok(())
}

fn build_request(args: &Args, tools: Vec<ToolDefinition>) -> Request {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &args.system {
        messages.push(Message::system(system.clone()));
    }
    messages.push(Message::user(args.prompt.clone()));

    let mut request = Request::chat(args.provider.clone(), args.model.clone(), messages);
    if !tools.is_empty() {
        request.tools = Some(tools);
    }
    request
}

/// Write each streamed content fragment to `out` as it arrives
async fn stream_answer<W>(gateway: &Gateway, request: Request, context: &RequestContext, out: &mut W) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut stream = gateway.complete_stream(request, context).await?;

    while let Some(element) = stream.next().await {
        if let Some(content) = element?.choices.first_delta().and_then(|delta| delta.content.as_deref()) {
            out.write_all(content.as_bytes()).await?;
            out.flush().await?;
        }
    }

    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}

/// Cancel the in-flight request on `SIGINT`
async fn cancel_on_ctrl_c(token: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("interrupt received, cancelling");
            token.cancel();
        }
        Err(e) => tracing::warn!(error = %e, "failed to install Ctrl+C handler"),
    }
}
