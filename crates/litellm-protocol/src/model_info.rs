use serde::{Deserialize, Serialize};

/// `/model/info` response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfoList {
    /// Model descriptors
    #[serde(default)]
    pub data: Vec<ModelDescriptor>,
}

/// One model advertised by the proxy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Public model name used in requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Feature flags for the model
    #[serde(default)]
    pub model_info: ModelFeatures,
}

/// Feature flags within a model descriptor
///
/// All flags are optional on the wire; defaulting is decided by the catalog,
/// not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelFeatures {
    /// API family ("chat", "embedding", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Accepts image input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_image_input: Option<bool>,
    /// Accepts audio input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_audio_input: Option<bool>,
    /// Supports tool calling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_tool_calling: Option<bool>,
    /// Legacy name for tool calling support
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_function_calling: Option<bool>,
    /// Supports schema-constrained output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_response_schema: Option<bool>,
    /// Embedding endpoint accepts multiple inputs per request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_multiple_inputs: Option<bool>,
}
