//! Minimal OpenAI-compatible backend
//!
//! Chat requests offering tools get a `weather` tool call back; requests
//! whose last message is a tool result get an answer quoting it. The model
//! name `overloaded` fails with 503, and `flaky-followup` fails only once a
//! tool result is present. `mid-stream-error` streams one word and then an
//! in-band error payload; the embedding model `corrupt-embedding` answers
//! with a vector that is not valid base64.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

pub const TOOL_CALL_ID: &str = "call_weather_1";

pub struct MockLlm {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    chat_requests: Mutex<Vec<Value>>,
    authorization: Mutex<Vec<Option<String>>>,
}

impl MockLlm {
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat))
            .route("/v1/embeddings", routing::post(handle_embeddings))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let stopped = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { stopped.cancelled().await })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL including `/v1`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Every chat request body received so far
    pub fn chat_requests(&self) -> Vec<Value> {
        self.state.chat_requests.lock().unwrap().clone()
    }

    /// `Authorization` header of every chat request
    pub fn authorization(&self) -> Vec<Option<String>> {
        self.state.authorization.lock().unwrap().clone()
    }
}

impl Drop for MockLlm {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_chat(
    State(state): State<Arc<MockState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.chat_requests.lock().unwrap().push(body.clone());
    state.authorization.lock().unwrap().push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
    );

    let model = body["model"].as_str().unwrap_or_default().to_owned();
    let streaming = body["stream"].as_bool().unwrap_or(false);

    let tool_result = body["messages"]
        .as_array()
        .and_then(|messages| messages.last())
        .filter(|message| message["role"] == "tool")
        .map(|message| message["content"].as_str().unwrap_or_default().to_owned());

    if model == "overloaded" || (model == "flaky-followup" && tool_result.is_some()) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": { "message": "mock overloaded", "type": "server_error" } })),
        )
            .into_response();
    }

    if model == "mid-stream-error" && streaming {
        let mut body = format!("data: {}\n\n", chunk(&model, &json!({ "content": "Hello" }), None));
        body.push_str("data: {\"error\":{\"message\":\"mock rate limited\",\"type\":\"rate_limit_error\"}}\n\n");
        return ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response();
    }

    let offers_tools = body["tools"].as_array().is_some_and(|tools| !tools.is_empty());

    match (tool_result, offers_tools, streaming) {
        (Some(result), _, false) => Json(text_completion(&model, &format!("The tool said: {result}"))).into_response(),
        (Some(result), _, true) => sse(&text_chunks(&model, &format!("The tool said: {result}"))),
        (None, true, false) => Json(tool_call_completion(&model)).into_response(),
        (None, true, true) => sse(&tool_call_chunks(&model)),
        (None, false, false) => Json(text_completion(&model, "Hello from mock LLM")).into_response(),
        (None, false, true) => sse(&text_chunks(&model, "Hello from mock LLM")),
    }
}

async fn handle_embeddings(Json(body): Json<Value>) -> Json<Value> {
    let corrupt = body["model"] == "corrupt-embedding";
    let count = body["input"].as_array().map_or(1, Vec::len);
    let data: Vec<_> = (0..count)
        .map(|index| {
            let embedding = if corrupt { json!("!!not base64!!") } else { json!([0.5, -0.25, index]) };
            json!({ "object": "embedding", "index": index, "embedding": embedding })
        })
        .collect();

    Json(json!({
        "object": "list",
        "data": data,
        "model": body["model"],
        "usage": { "prompt_tokens": 4, "total_tokens": 4 }
    }))
}

fn text_completion(model: &str, text: &str) -> Value {
    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    })
}

fn tool_call_completion(model: &str) -> Value {
    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": TOOL_CALL_ID,
                    "type": "function",
                    "function": { "name": "weather", "arguments": "{\"city\":\"Paris\"}" }
                }]
            },
            "finish_reason": "tool_calls"
        }]
    })
}

fn chunk(model: &str, delta: &Value, finish_reason: Option<&str>) -> Value {
    json!({
        "id": "chatcmpl-mock-stream",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{ "index": 0, "delta": delta, "finish_reason": finish_reason }]
    })
}

fn text_chunks(model: &str, text: &str) -> Vec<Value> {
    let mut chunks = vec![chunk(model, &json!({ "role": "assistant", "content": "" }), None)];
    chunks.extend(
        text.split_inclusive(' ')
            .map(|word| chunk(model, &json!({ "content": word }), None)),
    );
    chunks.push(chunk(model, &json!({}), Some("stop")));
    chunks
}

/// Text, then one tool call whose arguments arrive in two fragments
fn tool_call_chunks(model: &str) -> Vec<Value> {
    vec![
        chunk(model, &json!({ "role": "assistant", "content": "Checking. " }), None),
        chunk(
            model,
            &json!({ "tool_calls": [{
                "index": 0,
                "id": TOOL_CALL_ID,
                "type": "function",
                "function": { "name": "weather", "arguments": "" }
            }] }),
            None,
        ),
        chunk(
            model,
            &json!({ "tool_calls": [{ "index": 0, "function": { "arguments": "{\"city\":" } }] }),
            None,
        ),
        chunk(
            model,
            &json!({ "tool_calls": [{ "index": 0, "function": { "arguments": "\"Paris\"}" } }] }),
            None,
        ),
        chunk(model, &json!({}), Some("tool_calls")),
    ]
}

fn sse(chunks: &[Value]) -> Response {
    let mut body: String = chunks.iter().map(|chunk| format!("data: {chunk}\n\n")).collect();
    body.push_str("data: [DONE]\n\n");

    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}
