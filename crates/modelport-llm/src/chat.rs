//! OpenAI-style `/chat/completions` wire format.

use serde_json::json;

use crate::{
    ContentPart, FinishReason, Message, ModelSettings, Request, Response, Role, ToolCallResult,
    ToolChoice, Usage,
};
use modelport_types::ModelportError;

/// Which response extensions to read beyond the common OpenAI shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatDialect {
    OpenAi,
    /// Adds `reasoning_content` and `prompt_cache_hit_tokens`.
    DeepSeek,
}

// ---------------------------------------------------------------------------
// Request body
// ---------------------------------------------------------------------------

pub(crate) fn build_request_body(
    model_id: &str,
    settings: &ModelSettings,
    request: &Request,
) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = request.messages.iter().map(convert_message).collect();

    let mut body = json!({
        "model": model_id,
        "messages": messages,
        "stream": false,
    });

    if let Some(max_tokens) = request.max_tokens.or(settings.max_tokens) {
        body["max_tokens"] = json!(max_tokens);
    }

    if let Some(temp) = request.temperature.or(settings.temperature) {
        body["temperature"] = json!(temp);
    }

    if !request.stop_sequences.is_empty() {
        body["stop"] = json!(request.stop_sequences);
    }

    if !request.tools.is_empty() {
        let tools: Vec<serde_json::Value> = request
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect();
        body["tools"] = json!(tools);
    }

    if let Some(ref choice) = request.tool_choice {
        body["tool_choice"] = match choice {
            ToolChoice::Auto => json!("auto"),
            ToolChoice::None => json!("none"),
            ToolChoice::Required => json!("required"),
            ToolChoice::Specific(name) => json!({
                "type": "function",
                "function": { "name": name },
            }),
        };
    }

    body
}

fn convert_message(msg: &Message) -> serde_json::Value {
    match msg.role {
        Role::Tool => {
            for part in &msg.content {
                if let ContentPart::ToolResult {
                    tool_call_id,
                    content,
                } = part
                {
                    return json!({
                        "role": "tool",
                        "tool_call_id": tool_call_id,
                        "content": content,
                    });
                }
            }
            json!({ "role": "tool", "content": msg.text() })
        }
        Role::Assistant => {
            let tool_calls: Vec<serde_json::Value> = msg
                .content
                .iter()
                .filter_map(|part| match part {
                    ContentPart::ToolCall {
                        id,
                        name,
                        arguments,
                    } => Some(json!({
                        "id": id,
                        "type": "function",
                        "function": {
                            "name": name,
                            "arguments": arguments.to_string(),
                        }
                    })),
                    _ => None,
                })
                .collect();

            let mut result = json!({
                "role": "assistant",
                "content": msg.text(),
            });
            if !tool_calls.is_empty() {
                result["tool_calls"] = json!(tool_calls);
            }
            result
        }
        Role::System | Role::User => {
            let role = if msg.role == Role::System {
                "system"
            } else {
                "user"
            };
            let has_images = msg
                .content
                .iter()
                .any(|p| matches!(p, ContentPart::Image { .. }));
            if !has_images {
                return json!({ "role": role, "content": msg.text() });
            }

            let parts: Vec<serde_json::Value> = msg
                .content
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(json!({ "type": "text", "text": text })),
                    ContentPart::Image { url } => Some(json!({
                        "type": "image_url",
                        "image_url": { "url": url },
                    })),
                    _ => None,
                })
                .collect();
            json!({ "role": role, "content": parts })
        }
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

pub(crate) fn parse_response(
    provider: &str,
    dialect: ChatDialect,
    body: serde_json::Value,
) -> Result<Response, ModelportError> {
    let choice = body["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .ok_or_else(|| ModelportError::ProviderError {
            provider: provider.to_string(),
            status: 200,
            message: "response contained no choices".into(),
            retryable: false,
        })?;
    let message = &choice["message"];

    let text = message["content"].as_str().unwrap_or("").to_string();

    let reasoning = match dialect {
        ChatDialect::DeepSeek => message["reasoning_content"]
            .as_str()
            .filter(|r| !r.is_empty())
            .map(String::from),
        ChatDialect::OpenAi => None,
    };

    let tool_calls: Vec<ToolCallResult> = message["tool_calls"]
        .as_array()
        .map(|calls| {
            calls
                .iter()
                .map(|call| {
                    let arguments_str = call["function"]["arguments"].as_str().unwrap_or("{}");
                    ToolCallResult {
                        id: call["id"].as_str().unwrap_or("").to_string(),
                        name: call["function"]["name"].as_str().unwrap_or("").to_string(),
                        arguments: serde_json::from_str(arguments_str).unwrap_or(json!({})),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let finish_reason = match choice["finish_reason"].as_str() {
        Some("length") => FinishReason::MaxTokens,
        Some("tool_calls") | Some("function_call") => FinishReason::ToolUse,
        Some("content_filter") => FinishReason::ContentFilter,
        _ if !tool_calls.is_empty() => FinishReason::ToolUse,
        _ => FinishReason::EndTurn,
    };

    let usage_obj = &body["usage"];
    let input_tokens = usage_obj["prompt_tokens"].as_u64().unwrap_or(0);
    let output_tokens = usage_obj["completion_tokens"].as_u64().unwrap_or(0);
    let cache_read_tokens = match dialect {
        ChatDialect::DeepSeek => usage_obj["prompt_cache_hit_tokens"].as_u64(),
        ChatDialect::OpenAi => usage_obj["prompt_tokens_details"]["cached_tokens"].as_u64(),
    };
    let usage = Usage {
        input_tokens,
        output_tokens,
        reasoning_tokens: usage_obj["completion_tokens_details"]["reasoning_tokens"].as_u64(),
        cache_read_tokens,
        total_tokens: usage_obj["total_tokens"]
            .as_u64()
            .unwrap_or(input_tokens + output_tokens),
    };

    Ok(Response {
        id: body["id"].as_str().unwrap_or("").to_string(),
        text,
        tool_calls,
        reasoning,
        usage,
        model: body["model"].as_str().unwrap_or("").to_string(),
        finish_reason,
    })
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

pub(crate) fn map_error(
    provider: &str,
    status: reqwest::StatusCode,
    retry_after: Option<&str>,
    body: &str,
) -> ModelportError {
    let status_u16 = status.as_u16();
    match status_u16 {
        429 => {
            let retry_after_ms = retry_after
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map(|s| (s * 1000.0) as u64)
                .unwrap_or(1000);
            ModelportError::RateLimited {
                provider: provider.into(),
                retry_after_ms,
            }
        }
        401 | 403 => ModelportError::AuthError {
            provider: provider.into(),
        },
        500..=599 => ModelportError::ProviderError {
            provider: provider.into(),
            status: status_u16,
            message: extract_error_message(body),
            retryable: true,
        },
        _ => ModelportError::ProviderError {
            provider: provider.into(),
            status: status_u16,
            message: extract_error_message(body),
            retryable: false,
        },
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
