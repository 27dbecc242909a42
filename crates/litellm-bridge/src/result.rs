use std::fmt;
use std::pin::Pin;

use futures_util::Stream;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// A finalized tool call with decoded arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique tool call identifier
    pub id: String,
    /// Function name
    pub name: String,
    /// Decoded arguments
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Build a call from wire parts, decoding the JSON-encoded arguments
    /// string exactly once
    pub fn from_raw(id: String, name: String, arguments: &str) -> Result<Self, BridgeError> {
        let arguments = serde_json::from_str(arguments)?;
        Ok(Self { id, name, arguments })
    }
}

/// Item produced while draining a streamed completion
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    /// Incremental text token
    Token(String),
    /// Tool calls reassembled from the stream's deltas
    ToolCalls(Vec<ToolCall>),
}

/// Lazy sequence of stream items, pulled by the caller
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<StreamItem, BridgeError>> + Send>>;

/// Normalized completion result
pub enum CompletionResult {
    /// Plain text completion
    Text(String),
    /// The model requested one or more tool invocations
    ToolCalls(Vec<ToolCall>),
    /// Multiple choices, in response order
    Choices(Vec<CompletionResult>),
    /// Streamed completion, drained lazily by the caller
    Stream(TokenStream),
}

impl CompletionResult {
    /// Text content, if this is a text result
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(content) => Some(content),
            _ => None,
        }
    }

    /// Tool calls, if this is a tool call result
    pub fn as_tool_calls(&self) -> Option<&[ToolCall]> {
        match self {
            Self::ToolCalls(calls) => Some(calls),
            _ => None,
        }
    }

    /// Consume a streamed result
    pub fn into_stream(self) -> Option<TokenStream> {
        match self {
            Self::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

impl fmt::Debug for CompletionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(content) => f.debug_tuple("Text").field(content).finish(),
            Self::ToolCalls(calls) => f.debug_tuple("ToolCalls").field(calls).finish(),
            Self::Choices(choices) => f.debug_tuple("Choices").field(choices).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}
