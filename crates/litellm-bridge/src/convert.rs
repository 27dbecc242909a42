//! Response classification
//!
//! `LiteLLM` may return `finish_reason: "tool_calls"` for structured output
//! responses but place the payload in `message.content` instead of
//! `message.tool_calls`. The converter checks `tool_calls` first and falls
//! back to the content as a text result.

use std::pin::Pin;

use futures_util::Stream;
use http::StatusCode;
use litellm_protocol::response::{Choice, CompletionsBody, ErrorDetail};
use litellm_protocol::stream::StreamChunk;

use crate::error::BridgeError;
use crate::result::{CompletionResult, ToolCall};
use crate::stream::accumulate;

/// Lazy sequence of parsed stream chunks, as decoded by the transport
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, BridgeError>> + Send>>;

/// Raw HTTP response handed over by the transport
pub struct RawResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body, buffered or streamed
    pub body: ResponseBody,
}

/// Body of a raw response
pub enum ResponseBody {
    /// Fully parsed JSON body
    Buffered(serde_json::Value),
    /// Lazily decoded chunk sequence
    Streaming(ChunkStream),
}

impl ResponseBody {
    /// `error.message` from a buffered body, if present
    fn error_message(&self) -> Option<String> {
        let Self::Buffered(value) = self else {
            return None;
        };
        value
            .get("error")?
            .get("message")?
            .as_str()
            .map(ToOwned::to_owned)
    }
}

/// Conversion options
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Interpret the body as a streamed response
    pub stream: bool,
}

/// Classify a raw proxy response into a normalized result
///
/// HTTP-level conditions are checked before the body is inspected: 401, 400
/// and 429 map to their typed errors regardless of what the body contains.
pub fn convert_response(response: RawResponse, options: ConvertOptions) -> Result<CompletionResult, BridgeError> {
    let RawResponse { status, body } = response;

    if status == StatusCode::UNAUTHORIZED {
        let message = body.error_message().unwrap_or_else(|| "Unauthorized".to_owned());
        return Err(BridgeError::Authentication(message));
    }

    if status == StatusCode::BAD_REQUEST {
        let message = body.error_message().unwrap_or_else(|| "Bad Request".to_owned());
        return Err(BridgeError::BadRequest(message));
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(BridgeError::RateLimitExceeded);
    }

    if options.stream {
        return match body {
            ResponseBody::Streaming(chunks) => Ok(CompletionResult::Stream(accumulate(chunks))),
            ResponseBody::Buffered(_) => Err(BridgeError::Runtime(
                "Streaming conversion requires a chunked body.".to_owned(),
            )),
        };
    }

    let ResponseBody::Buffered(value) = body else {
        return Err(BridgeError::Runtime(
            "Buffered conversion requires a parsed body.".to_owned(),
        ));
    };

    let body: CompletionsBody =
        serde_json::from_value(value).map_err(|e| BridgeError::Runtime(format!("Malformed response body: {e}.")))?;

    if let Some(error) = body.error {
        return Err(convert_error(error));
    }

    let Some(choices) = body.choices else {
        return Err(BridgeError::Runtime("Response does not contain choices.".to_owned()));
    };

    let mut converted = choices
        .into_iter()
        .map(convert_choice)
        .collect::<Result<Vec<_>, _>>()?;

    // A single choice is returned unwrapped
    if converted.len() == 1 {
        return Ok(converted.remove(0));
    }
    Ok(CompletionResult::Choices(converted))
}

/// Map a body-level error to its typed form
///
/// `content_filter` gets its own kind; anything else becomes a generic
/// runtime error with each absent field rendered as `-`.
fn convert_error(error: ErrorDetail) -> BridgeError {
    if error.code.as_deref() == Some("content_filter") {
        return BridgeError::ContentFilter(error.message.unwrap_or_default());
    }

    let field = |value: Option<String>| value.unwrap_or_else(|| "-".to_owned());
    BridgeError::Runtime(format!(
        "Error \"{}\"-{} ({}): \"{}\".",
        field(error.code),
        field(error.error_type),
        field(error.param),
        field(error.message),
    ))
}

/// Convert one choice, handling the structured output quirk
fn convert_choice(choice: Choice) -> Result<CompletionResult, BridgeError> {
    let finish_reason = choice.finish_reason.unwrap_or_default();

    if finish_reason == "tool_calls" {
        if let Some(calls) = choice.message.tool_calls {
            let calls = calls
                .into_iter()
                .map(|call| ToolCall::from_raw(call.id, call.function.name, &call.function.arguments))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(CompletionResult::ToolCalls(calls));
        }

        // Structured output payload mis-tagged as tool_calls
        if let Some(content) = choice.message.content {
            return Ok(CompletionResult::Text(content));
        }
    }

    if finish_reason == "stop" || finish_reason == "length" {
        return Ok(CompletionResult::Text(choice.message.content.unwrap_or_default()));
    }

    Err(BridgeError::Runtime(format!(
        "Unsupported finish reason \"{finish_reason}\"."
    )))
}
