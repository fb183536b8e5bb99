//! Conversion between canonical types and the `OpenAI` wire format

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;

use super::ProviderAdapter;
use crate::error::LlmError;
use crate::protocol::openai::{
    OpenAiChatRequest, OpenAiChatResponse, OpenAiContent, OpenAiContentPart, OpenAiEmbeddingRequest,
    OpenAiEmbeddingResponse, OpenAiEmbeddingVector, OpenAiFunction, OpenAiFunctionCall, OpenAiImageUrl,
    OpenAiMessage, OpenAiSampling, OpenAiStreamChunk, OpenAiTextRequest, OpenAiTextResponse, OpenAiTool,
    OpenAiToolCall, OpenAiTranscriptionRequest, OpenAiTranscriptionResponse, OpenAiUsage, OpenAiWireRequest,
    OpenAiWireResponse,
};
use crate::types::{
    Choice, Choices, Content, ContentBlock, Delta, Embedding, EmbeddingInput, FinishReason, Message, Params, Request,
    RequestInput, Response, Role, StreamChoice, StreamFunctionCall, StreamToolCall, ToolCall, ToolChoice,
    ToolDefinition, Transcription, TranscriptionInput, Usage,
};

type ExtraFields = serde_json::Map<String, serde_json::Value>;

/// Adapter for the `OpenAI` API and compatible endpoints
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiAdapter;

impl ProviderAdapter for OpenAiAdapter {
    type WireRequest = OpenAiWireRequest;
    type WireResponse = OpenAiWireResponse;

    fn to_provider_wire(&self, request: &Request) -> Result<OpenAiWireRequest, LlmError> {
        let mut extra = request.params.extra.clone();

        let wire = match &request.input {
            RequestInput::Chat(messages) => OpenAiWireRequest::Chat(OpenAiChatRequest {
                model: request.model.clone(),
                messages: messages.iter().map(message_to_wire).collect(),
                sampling: sampling(&request.params),
                tools: request.tools.as_deref().map(|tools| tools.iter().map(tool_to_wire).collect()),
                tool_choice: request.tool_choice.as_ref().map(tool_choice_to_wire),
                stream: None,
                stream_options: None,
                extra,
            }),
            RequestInput::TextCompletion(prompt) => OpenAiWireRequest::Text(OpenAiTextRequest {
                model: request.model.clone(),
                prompt: prompt.clone(),
                sampling: sampling(&request.params),
                logprobs: take_extra(&mut extra, "logprobs"),
                echo: take_extra(&mut extra, "echo"),
                best_of: take_extra(&mut extra, "best_of"),
                suffix: take_extra(&mut extra, "suffix"),
                extra,
            }),
            RequestInput::Embedding(input) => OpenAiWireRequest::Embedding(OpenAiEmbeddingRequest {
                model: request.model.clone(),
                input: embedding_input_to_wire(input),
                encoding_format: take_extra(&mut extra, "encoding_format"),
                dimensions: take_extra(&mut extra, "dimensions"),
                user: request.params.user.clone(),
                extra,
            }),
            RequestInput::Transcription(input) => {
                OpenAiWireRequest::Transcription(transcription_to_wire(request, input, extra))
            }
        };

        Ok(wire)
    }

    fn from_provider_wire(&self, response: OpenAiWireResponse, model: &str, provider: &str) -> Response {
        let mut canonical = match response {
            OpenAiWireResponse::Chat(chat) => chat_response(chat),
            OpenAiWireResponse::Text(text) => text_response(text),
            OpenAiWireResponse::Embedding(embedding) => embedding_response(embedding),
            OpenAiWireResponse::Transcription(transcription) => transcription_response(transcription),
            OpenAiWireResponse::Chunk(chunk) => chunk_response(chunk),
        };

        model.clone_into(&mut canonical.model);
        canonical.provider = Some(provider.to_owned());
        canonical
    }
}

/// Copy the sampling fields `OpenAI` recognises; `top_k` has no counterpart
fn sampling(params: &Params) -> OpenAiSampling {
    OpenAiSampling {
        temperature: params.temperature,
        top_p: params.top_p,
        max_tokens: params.max_tokens,
        stop: params.stop.clone(),
        frequency_penalty: params.frequency_penalty,
        presence_penalty: params.presence_penalty,
        seed: params.seed,
        logit_bias: params.logit_bias.clone(),
        user: params.user.clone(),
    }
}

/// Move a recognised extension field into a native slot
///
/// A value of the wrong type stays in `extra` and is forwarded verbatim.
fn take_extra<T: DeserializeOwned>(extra: &mut ExtraFields, key: &str) -> Option<T> {
    let parsed = serde_json::from_value(extra.get(key)?.clone()).ok()?;
    extra.remove(key);
    Some(parsed)
}

fn transcription_to_wire(request: &Request, input: &TranscriptionInput, mut extra: ExtraFields) -> OpenAiTranscriptionRequest {
    let temperature = take_extra(&mut extra, "temperature");

    OpenAiTranscriptionRequest {
        model: request.model.clone(),
        file: input.file.clone(),
        language: input.language.clone(),
        prompt: input.prompt.clone(),
        response_format: input.response_format.clone(),
        temperature: request.params.temperature.or(temperature),
        include: take_extra(&mut extra, "include").unwrap_or_default(),
        timestamp_granularities: take_extra(&mut extra, "timestamp_granularities").unwrap_or_default(),
        extra,
    }
}

fn embedding_input_to_wire(input: &EmbeddingInput) -> serde_json::Value {
    match input {
        EmbeddingInput::Text(text) => serde_json::Value::from(text.as_str()),
        EmbeddingInput::Texts(texts) => serde_json::Value::from(texts.clone()),
        EmbeddingInput::Tokens(tokens) => serde_json::Value::from(tokens.clone()),
        EmbeddingInput::TokenBatches(batches) => {
            serde_json::Value::Array(batches.iter().cloned().map(serde_json::Value::from).collect())
        }
    }
}

fn message_to_wire(message: &Message) -> OpenAiMessage {
    let tool_calls = message.tool_calls();

    OpenAiMessage {
        role: message.role.as_str().to_owned(),
        content: content_to_wire(&message.content),
        name: message.name.clone(),
        tool_calls: (!tool_calls.is_empty()).then(|| tool_calls.iter().map(tool_call_to_wire).collect()),
        tool_call_id: message.tool_call_id().map(str::to_owned),
    }
}

/// An empty block list means the provider sent no content at all
fn content_to_wire(content: &Content) -> Option<OpenAiContent> {
    match content {
        Content::Text(text) => Some(OpenAiContent::Text(text.clone())),
        Content::Blocks(blocks) if blocks.is_empty() => None,
        Content::Blocks(blocks) => Some(OpenAiContent::Parts(
            blocks
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => OpenAiContentPart::Text { text: text.clone() },
                    ContentBlock::Image { url, detail } => OpenAiContentPart::ImageUrl {
                        image_url: OpenAiImageUrl {
                            url: url.clone(),
                            detail: detail.clone(),
                        },
                    },
                })
                .collect(),
        )),
    }
}

fn content_from_wire(content: Option<OpenAiContent>) -> Content {
    match content {
        Some(OpenAiContent::Text(text)) => Content::Text(text),
        Some(OpenAiContent::Parts(parts)) => Content::Blocks(
            parts
                .into_iter()
                .map(|part| match part {
                    OpenAiContentPart::Text { text } => ContentBlock::Text { text },
                    OpenAiContentPart::ImageUrl { image_url } => ContentBlock::Image {
                        url: image_url.url,
                        detail: image_url.detail,
                    },
                })
                .collect(),
        ),
        None => Content::Blocks(Vec::new()),
    }
}

fn tool_call_to_wire(call: &ToolCall) -> OpenAiToolCall {
    OpenAiToolCall {
        id: call.id.clone(),
        tool_type: "function".to_owned(),
        function: OpenAiFunctionCall {
            name: call.function.name.clone(),
            arguments: call.function.arguments.clone(),
        },
    }
}

fn tool_to_wire(tool: &ToolDefinition) -> OpenAiTool {
    OpenAiTool {
        tool_type: "function",
        function: OpenAiFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

fn tool_choice_to_wire(choice: &ToolChoice) -> serde_json::Value {
    match choice {
        ToolChoice::None => "none".into(),
        ToolChoice::Auto => "auto".into(),
        ToolChoice::Required => "required".into(),
        ToolChoice::Function { name } => serde_json::json!({
            "type": "function",
            "function": { "name": name }
        }),
    }
}

fn role_from_wire(role: &str) -> Option<Role> {
    match role {
        "system" | "developer" => Some(Role::System),
        "user" => Some(Role::User),
        "assistant" => Some(Role::Assistant),
        "tool" => Some(Role::Tool),
        _ => None,
    }
}

fn usage_from_wire(usage: OpenAiUsage) -> Usage {
    Usage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
    }
}

/// Response messages are always assistant turns
fn assistant_from_wire(message: OpenAiMessage) -> Message {
    let content = content_from_wire(message.content);
    let tool_calls: Vec<ToolCall> = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall::new(call.id, call.function.name, call.function.arguments))
        .collect();

    let mut assistant = if tool_calls.is_empty() {
        Message::assistant(content)
    } else {
        Message::assistant_with_tool_calls(content, tool_calls)
    };
    assistant.name = message.name;
    assistant
}

fn chat_response(chat: OpenAiChatResponse) -> Response {
    let choices = chat
        .choices
        .into_iter()
        .map(|choice| Choice {
            index: choice.index,
            message: assistant_from_wire(choice.message),
            finish_reason: choice.finish_reason.map(FinishReason::from),
            log_probs: choice.logprobs,
            stop_string: None,
        })
        .collect();

    Response {
        id: chat.id,
        created: chat.created,
        system_fingerprint: chat.system_fingerprint,
        choices: Choices::Complete(choices),
        usage: chat.usage.map(usage_from_wire),
        ..Response::default()
    }
}

fn text_response(text: OpenAiTextResponse) -> Response {
    let choices = text
        .choices
        .into_iter()
        .map(|choice| Choice {
            index: choice.index,
            message: Message::assistant(choice.text),
            finish_reason: choice.finish_reason.map(FinishReason::from),
            log_probs: choice.logprobs,
            stop_string: None,
        })
        .collect();

    Response {
        id: text.id,
        created: text.created,
        system_fingerprint: text.system_fingerprint,
        choices: Choices::Complete(choices),
        usage: text.usage.map(usage_from_wire),
        ..Response::default()
    }
}

fn embedding_response(embedding: OpenAiEmbeddingResponse) -> Response {
    // Vectors that fail to decode are omitted; the dispatcher rejects them before this point
    let embeddings = embedding
        .data
        .into_iter()
        .filter_map(|data| {
            Some(Embedding {
                index: data.index,
                embedding: decode_vector(data.embedding).ok()?,
            })
        })
        .collect();

    Response {
        embeddings,
        usage: embedding.usage.map(usage_from_wire),
        ..Response::default()
    }
}

/// Decode every base64 vector of an embedding response in place
///
/// # Errors
///
/// Returns an upstream error naming the first vector that is not valid
/// base64 or does not hold a whole number of little-endian `f32`s.
pub(crate) fn decode_embeddings(response: &mut OpenAiEmbeddingResponse) -> Result<(), LlmError> {
    for data in &mut response.data {
        if let OpenAiEmbeddingVector::Base64(_) = data.embedding {
            let vector = std::mem::replace(&mut data.embedding, OpenAiEmbeddingVector::Float(Vec::new()));
            let values = decode_vector(vector)
                .map_err(|reason| LlmError::upstream(format!("invalid base64 embedding at index {}: {reason}", data.index)))?;
            data.embedding = OpenAiEmbeddingVector::Float(values);
        }
    }

    Ok(())
}

fn decode_vector(vector: OpenAiEmbeddingVector) -> Result<Vec<f32>, String> {
    let encoded = match vector {
        OpenAiEmbeddingVector::Float(values) => return Ok(values),
        OpenAiEmbeddingVector::Base64(encoded) => encoded,
    };

    let bytes = STANDARD.decode(encoded).map_err(|e| e.to_string())?;
    if bytes.len() % 4 != 0 {
        return Err(format!("{} bytes is not a whole number of f32 values", bytes.len()));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn transcription_response(transcription: OpenAiTranscriptionResponse) -> Response {
    Response {
        transcription: Some(Transcription {
            text: transcription.text,
            language: transcription.language,
            duration: transcription.duration,
        }),
        ..Response::default()
    }
}

fn chunk_response(chunk: OpenAiStreamChunk) -> Response {
    let choices = chunk
        .choices
        .into_iter()
        .map(|choice| StreamChoice {
            index: choice.index,
            delta: Delta {
                role: choice.delta.role.as_deref().and_then(role_from_wire),
                content: choice.delta.content,
                tool_calls: choice
                    .delta
                    .tool_calls
                    .unwrap_or_default()
                    .into_iter()
                    .map(|call| {
                        let function = call.function.map_or_else(StreamFunctionCall::default, |function| {
                            StreamFunctionCall {
                                name: function.name,
                                arguments: function.arguments,
                            }
                        });
                        StreamToolCall {
                            index: call.index,
                            id: call.id,
                            function,
                        }
                    })
                    .collect(),
            },
            finish_reason: choice.finish_reason.map(FinishReason::from),
        })
        .collect();

    Response {
        id: chunk.id,
        created: chunk.created,
        system_fingerprint: chunk.system_fingerprint,
        choices: Choices::Delta(choices),
        usage: chunk.usage.map(usage_from_wire),
        ..Response::default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn chat_wire(request: &Request) -> serde_json::Value {
        match OpenAiAdapter.to_provider_wire(request).unwrap() {
            OpenAiWireRequest::Chat(chat) => serde_json::to_value(chat).unwrap(),
            other => panic!("expected chat request, got {other:?}"),
        }
    }

    #[test]
    fn chat_request_maps_allow_listed_params() {
        let mut request = Request::chat("openai", "gpt-4o", vec![Message::user("hi")]);
        request.params.temperature = Some(0.5);
        request.params.top_k = Some(40);
        request.params.user = Some("u-1".to_owned());
        request.params.extra.insert("parallel_tool_calls".to_owned(), json!(false));

        let wire = chat_wire(&request);

        assert_eq!(wire["temperature"], json!(0.5));
        assert_eq!(wire["user"], json!("u-1"));
        assert_eq!(wire["parallel_tool_calls"], json!(false));
        assert!(wire.get("top_k").is_none());
        assert!(wire.get("stream").is_none());
    }

    #[test]
    fn chat_request_carries_tool_turns() {
        let request = Request::chat(
            "openai",
            "gpt-4o",
            vec![
                Message::user("weather?"),
                Message::assistant_with_tool_calls(
                    Content::Blocks(Vec::new()),
                    vec![ToolCall::new("call_1", "weather", r#"{"city":"Oslo"}"#)],
                ),
                Message::tool("call_1", "rain"),
            ],
        );

        let wire = chat_wire(&request);
        let messages = wire["messages"].as_array().unwrap();

        assert_eq!(messages[1]["content"], serde_json::Value::Null);
        assert_eq!(messages[1]["tool_calls"][0]["id"], "call_1");
        assert_eq!(messages[1]["tool_calls"][0]["type"], "function");
        assert_eq!(messages[2]["role"], "tool");
        assert_eq!(messages[2]["tool_call_id"], "call_1");
    }

    #[test]
    fn tools_and_choice_use_function_shape() {
        let mut request = Request::chat("openai", "gpt-4o", vec![Message::user("hi")]);
        request.tools = Some(vec![ToolDefinition::function(
            "weather",
            "Current weather",
            json!({ "type": "object" }),
        )]);
        request.tool_choice = Some(ToolChoice::Function {
            name: "weather".to_owned(),
        });

        let wire = chat_wire(&request);

        assert_eq!(wire["tools"][0]["type"], "function");
        assert_eq!(wire["tools"][0]["function"]["name"], "weather");
        assert_eq!(wire["tool_choice"], json!({ "type": "function", "function": { "name": "weather" } }));
    }

    #[test]
    fn text_request_moves_recognised_extras() {
        let mut request = Request::new("openai", "gpt-3.5-turbo-instruct", RequestInput::TextCompletion("Once".to_owned()));
        request.params.extra.insert("echo".to_owned(), json!(true));
        request.params.extra.insert("best_of".to_owned(), json!("many"));
        request.params.extra.insert("logit_scale".to_owned(), json!(2));

        let OpenAiWireRequest::Text(text) = OpenAiAdapter.to_provider_wire(&request).unwrap() else {
            panic!("expected text request");
        };

        assert_eq!(text.echo, Some(true));
        assert_eq!(text.best_of, None);
        assert_eq!(text.extra.get("best_of"), Some(&json!("many")));
        assert_eq!(text.extra.get("logit_scale"), Some(&json!(2)));
        assert!(!text.extra.contains_key("echo"));
    }

    #[test]
    fn embedding_request_keeps_token_input() {
        let mut request = Request::new(
            "openai",
            "text-embedding-3-small",
            RequestInput::Embedding(EmbeddingInput::TokenBatches(vec![vec![1, 2], vec![3]])),
        );
        request.params.extra.insert("dimensions".to_owned(), json!(256));

        let OpenAiWireRequest::Embedding(embedding) = OpenAiAdapter.to_provider_wire(&request).unwrap() else {
            panic!("expected embedding request");
        };

        assert_eq!(embedding.input, json!([[1, 2], [3]]));
        assert_eq!(embedding.dimensions, Some(256));
        assert!(embedding.extra.is_empty());
    }

    #[test]
    fn transcription_request_reads_endpoint_extras() {
        let mut request = Request::new(
            "openai",
            "whisper-1",
            RequestInput::Transcription(TranscriptionInput {
                file: vec![1, 2, 3],
                language: Some("en".to_owned()),
                prompt: None,
                response_format: Some("srt".to_owned()),
            }),
        );
        request.params.extra.insert("temperature".to_owned(), json!(0.2));
        request.params.extra.insert("timestamp_granularities".to_owned(), json!(["word"]));

        let OpenAiWireRequest::Transcription(wire) = OpenAiAdapter.to_provider_wire(&request).unwrap() else {
            panic!("expected transcription request");
        };

        assert_eq!(wire.temperature, Some(0.2));
        assert_eq!(wire.timestamp_granularities, vec!["word".to_owned()]);
        assert!(!wire.expects_json());
        assert!(wire.extra.is_empty());
    }

    #[test]
    fn chat_response_without_content_keeps_it_absent() {
        let wire: OpenAiChatResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-2024-08-06",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "weather", "arguments": "{}" }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();

        let response = OpenAiAdapter.from_provider_wire(OpenAiWireResponse::Chat(wire), "gpt-4o", "openai");

        assert_eq!(response.model, "gpt-4o");
        assert_eq!(response.provider.as_deref(), Some("openai"));
        assert!(response.usage.is_none());
        assert_eq!(response.tool_calls(), &[ToolCall::new("call_1", "weather", "{}")]);

        let message = response.choices.first_message().unwrap();
        assert_eq!(message.content, Content::Blocks(Vec::new()));
        assert_eq!(message_to_wire(message).content, None);
    }

    #[test]
    fn text_response_becomes_assistant_choice() {
        let wire: OpenAiTextResponse = serde_json::from_value(json!({
            "id": "cmpl-1",
            "choices": [{ "index": 0, "text": " upon a time", "finish_reason": "length", "logprobs": null }],
            "usage": { "prompt_tokens": 1, "completion_tokens": 4, "total_tokens": 5 }
        }))
        .unwrap();

        let response = OpenAiAdapter.from_provider_wire(OpenAiWireResponse::Text(wire), "davinci", "openai");
        let Choices::Complete(choices) = &response.choices else {
            panic!("expected complete choices");
        };

        assert_eq!(choices[0].message.content.as_text(), " upon a time");
        assert_eq!(choices[0].finish_reason, Some(FinishReason::Length));
        assert_eq!(response.usage.map(|usage| usage.total_tokens), Some(5));
    }

    #[test]
    fn base64_embeddings_are_decoded() {
        let bytes: Vec<u8> = [1.0_f32, -0.5].iter().flat_map(|value| value.to_le_bytes()).collect();
        let wire: OpenAiEmbeddingResponse = serde_json::from_value(json!({
            "data": [
                { "index": 0, "embedding": [0.25, 0.5] },
                { "index": 1, "embedding": STANDARD.encode(bytes) }
            ],
            "usage": { "prompt_tokens": 3, "total_tokens": 3 }
        }))
        .unwrap();

        let response = OpenAiAdapter.from_provider_wire(OpenAiWireResponse::Embedding(wire), "emb", "openai");

        assert_eq!(response.embeddings[0].embedding, vec![0.25, 0.5]);
        assert_eq!(response.embeddings[1].embedding, vec![1.0, -0.5]);
        assert_eq!(response.usage.map(|usage| usage.completion_tokens), Some(0));
        assert!(response.choices.is_empty());
    }

    #[test]
    fn undecodable_base64_embedding_is_rejected() {
        let mut wire: OpenAiEmbeddingResponse = serde_json::from_value(json!({
            "data": [
                { "index": 0, "embedding": [0.25] },
                { "index": 1, "embedding": "!!not base64!!" }
            ]
        }))
        .unwrap();

        let err = decode_embeddings(&mut wire).unwrap_err();
        assert!(matches!(&err, LlmError::Upstream { message, .. } if message.contains("invalid base64 embedding at index 1")));

        let response = OpenAiAdapter.from_provider_wire(OpenAiWireResponse::Embedding(wire), "emb", "openai");
        assert_eq!(response.embeddings.len(), 1);
        assert_eq!(response.embeddings[0].index, 0);
    }

    #[test]
    fn partial_f32_in_base64_embedding_is_rejected() {
        let bytes: Vec<u8> = 1.0_f32.to_le_bytes().into_iter().chain([0x3f, 0x80]).collect();
        let mut wire: OpenAiEmbeddingResponse = serde_json::from_value(json!({
            "data": [{ "index": 0, "embedding": STANDARD.encode(bytes) }]
        }))
        .unwrap();

        let err = decode_embeddings(&mut wire).unwrap_err();
        assert!(err.to_string().contains("6 bytes is not a whole number of f32 values"), "{err}");
    }

    #[test]
    fn decoded_embeddings_become_float_vectors() {
        let bytes: Vec<u8> = [2.0_f32, 0.5].iter().flat_map(|value| value.to_le_bytes()).collect();
        let mut wire: OpenAiEmbeddingResponse = serde_json::from_value(json!({
            "data": [{ "index": 0, "embedding": STANDARD.encode(bytes) }]
        }))
        .unwrap();

        decode_embeddings(&mut wire).unwrap();
        assert!(matches!(&wire.data[0].embedding, OpenAiEmbeddingVector::Float(values) if values == &[2.0, 0.5]));
    }

    #[test]
    fn stream_chunk_maps_tool_call_fragments() {
        let wire: OpenAiStreamChunk = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "choices": [{
                "index": 0,
                "delta": {
                    "role": "assistant",
                    "tool_calls": [{ "index": 0, "id": "call_1", "type": "function", "function": { "name": "weather", "arguments": "" } }]
                },
                "finish_reason": null
            }]
        }))
        .unwrap();

        let response = OpenAiAdapter.from_provider_wire(OpenAiWireResponse::Chunk(wire), "gpt-4o", "openai");
        let delta = response.choices.first_delta().unwrap();

        assert_eq!(delta.role, Some(Role::Assistant));
        assert_eq!(delta.content, None);
        assert_eq!(delta.tool_calls[0].id.as_deref(), Some("call_1"));
        assert_eq!(delta.tool_calls[0].function.name.as_deref(), Some("weather"));
    }

    #[test]
    fn usage_only_chunk_has_no_choices() {
        let wire: OpenAiStreamChunk = serde_json::from_value(json!({
            "choices": [],
            "usage": { "prompt_tokens": 5, "completion_tokens": 7, "total_tokens": 12 }
        }))
        .unwrap();

        let response = OpenAiAdapter.from_provider_wire(OpenAiWireResponse::Chunk(wire), "gpt-4o", "openai");

        assert!(matches!(response.choices, Choices::Delta(ref choices) if choices.is_empty()));
        assert_eq!(response.usage.map(|usage| usage.total_tokens), Some(12));
    }
}
