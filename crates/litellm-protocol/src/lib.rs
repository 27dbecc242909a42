//! Wire format types for amazee.ai's `LiteLLM` proxy
//!
//! The proxy speaks the `OpenAI` chat completions dialect. These types cover
//! the subset the bridge consumes and produces: buffered completion bodies,
//! streaming delta chunks, error bodies, the `/model/info` catalog response,
//! and the outbound chat request.

pub mod model_info;
pub mod request;
pub mod response;
pub mod stream;

pub use model_info::{ModelDescriptor, ModelFeatures, ModelInfoList};
pub use request::{ChatMessage, ChatRequest, FunctionDefinition, ToolDefinition};
pub use response::{Choice, ChoiceMessage, CompletionsBody, ErrorDetail, FunctionPayload, ToolCallPayload};
pub use stream::{StreamChoice, StreamChunk, StreamDelta, StreamFunctionCall, StreamToolCall};
