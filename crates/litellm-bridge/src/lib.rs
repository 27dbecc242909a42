//! Response normalization for amazee.ai's `LiteLLM` proxy
//!
//! `LiteLLM` fronts many upstream providers behind an `OpenAI`-compatible API,
//! but its completion responses are not uniform: structured output responses
//! may report `finish_reason: "tool_calls"` while carrying the payload in
//! `message.content`, and streamed tool calls arrive as argument fragments
//! spread across delta chunks. This crate classifies buffered responses into
//! typed results, reassembles streamed tool calls, discovers the model
//! catalog from the proxy's `/model/info` endpoint, and ships a thin
//! transport client wiring the pieces together.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod catalog;
pub mod client;
pub mod convert;
pub mod error;
pub mod result;
pub mod stream;

pub use catalog::{Capability, DiscoveredModel, ModelCatalog, ModelKind};
pub use client::LiteLlmClient;
pub use convert::{ChunkStream, ConvertOptions, RawResponse, ResponseBody, convert_response};
pub use error::BridgeError;
pub use result::{CompletionResult, StreamItem, TokenStream, ToolCall};
pub use stream::{ToolCallAccumulator, accumulate, chunk_events};
