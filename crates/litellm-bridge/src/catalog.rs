//! Model catalog discovery over the proxy's `/model/info` endpoint
//!
//! Each advertised model is mapped to a completions or embeddings capability
//! set based on its `mode` field, so callers can route requests and check
//! feature support without hardcoding model lists.

use std::collections::HashMap;

use litellm_protocol::model_info::{ModelDescriptor, ModelFeatures, ModelInfoList};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::OnceCell;
use url::Url;

use crate::error::BridgeError;

/// Fine-grained model capability flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Accepts chat message input
    InputMessages,
    /// Accepts plain text input
    InputText,
    /// Accepts image input
    InputImage,
    /// Accepts audio input
    InputAudio,
    /// Accepts multiple inputs per request
    InputMultiple,
    /// Produces text output
    OutputText,
    /// Supports streamed output
    OutputStreaming,
    /// Supports schema-constrained output
    OutputStructured,
    /// Supports tool calling
    ToolCalling,
    /// Produces embedding vectors
    Embeddings,
}

/// API family a model belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Chat completions model
    Completions,
    /// Embeddings model
    Embeddings,
}

/// A model advertised by the proxy
#[derive(Debug, Clone)]
pub struct DiscoveredModel {
    /// Public model name used in requests
    pub name: String,
    /// API family
    pub kind: ModelKind,
    /// Derived capability flags
    pub capabilities: Vec<Capability>,
}

impl DiscoveredModel {
    /// Whether the model advertises the given capability
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Lazily discovered model catalog
///
/// The remote list is fetched once per catalog instance and cached for its
/// lifetime.
pub struct ModelCatalog {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    models: OnceCell<HashMap<String, DiscoveredModel>>,
}

impl ModelCatalog {
    /// Create a catalog for the proxy at `base_url`
    pub fn new(base_url: Url, api_key: Option<SecretString>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            models: OnceCell::new(),
        }
    }

    /// All models advertised by the proxy, keyed by name
    pub async fn models(&self) -> Result<&HashMap<String, DiscoveredModel>, BridgeError> {
        self.models.get_or_try_init(|| self.fetch_models()).await
    }

    /// Look up a single model by name
    pub async fn model(&self, name: &str) -> Result<&DiscoveredModel, BridgeError> {
        if name.is_empty() {
            return Err(BridgeError::InvalidArgument("model name must not be empty".to_owned()));
        }

        self.models().await?.get(name).ok_or_else(|| BridgeError::ModelNotFound {
            model: name.to_owned(),
        })
    }

    async fn fetch_models(&self) -> Result<HashMap<String, DiscoveredModel>, BridgeError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let url = format!("{base}/model/info");

        let mut builder = self.client.get(&url);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(error = %e, "model info request failed");
            BridgeError::Upstream(e.to_string())
        })?;

        if !response.status().is_success() {
            return Err(BridgeError::Upstream(format!(
                "model info returned {}",
                response.status()
            )));
        }

        let body: ModelInfoList = response
            .json()
            .await
            .map_err(|e| BridgeError::Upstream(format!("failed to parse model info: {e}")))?;

        let models: HashMap<_, _> = body
            .data
            .into_iter()
            .filter_map(describe_model)
            .map(|model| (model.name.clone(), model))
            .collect();

        tracing::debug!(count = models.len(), "discovered models");
        Ok(models)
    }
}

/// Map one descriptor to a discovered model
///
/// Descriptors without a `model_name` are skipped.
fn describe_model(descriptor: ModelDescriptor) -> Option<DiscoveredModel> {
    let name = descriptor.model_name?;
    let info = descriptor.model_info;

    let (kind, capabilities) = if info.mode.as_deref() == Some("embedding") {
        (ModelKind::Embeddings, embedding_capabilities(&info))
    } else {
        (ModelKind::Completions, completions_capabilities(&info))
    };

    Some(DiscoveredModel {
        name,
        kind,
        capabilities,
    })
}

fn embedding_capabilities(info: &ModelFeatures) -> Vec<Capability> {
    let mut capabilities = vec![Capability::Embeddings, Capability::InputText];

    // Multiple inputs default to supported for embedding models
    if info.supports_multiple_inputs.unwrap_or(true) {
        capabilities.push(Capability::InputMultiple);
    }

    capabilities
}

fn completions_capabilities(info: &ModelFeatures) -> Vec<Capability> {
    let mut capabilities = vec![
        Capability::InputMessages,
        Capability::OutputText,
        Capability::OutputStreaming,
    ];

    if info.supports_image_input.unwrap_or(false) {
        capabilities.push(Capability::InputImage);
    }
    if info.supports_audio_input.unwrap_or(false) {
        capabilities.push(Capability::InputAudio);
    }
    if info
        .supports_tool_calling
        .or(info.supports_function_calling)
        .unwrap_or(false)
    {
        capabilities.push(Capability::ToolCalling);
    }
    if info.supports_response_schema.unwrap_or(false) {
        capabilities.push(Capability::OutputStructured);
    }

    capabilities
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn descriptor(value: serde_json::Value) -> ModelDescriptor {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn chat_mode_maps_to_completions() {
        let model = describe_model(descriptor(json!({
            "model_name": "claude-3-5-sonnet",
            "model_info": {
                "mode": "chat",
                "supports_image_input": true,
                "supports_tool_calling": true,
                "supports_response_schema": true
            }
        })))
        .unwrap();

        assert_eq!(model.kind, ModelKind::Completions);
        assert!(model.supports(Capability::InputMessages));
        assert!(model.supports(Capability::OutputText));
        assert!(model.supports(Capability::OutputStreaming));
        assert!(model.supports(Capability::InputImage));
        assert!(model.supports(Capability::ToolCalling));
        assert!(model.supports(Capability::OutputStructured));
        assert!(!model.supports(Capability::InputAudio));
    }

    #[test]
    fn absent_mode_maps_to_completions() {
        let model = describe_model(descriptor(json!({"model_name": "mystery", "model_info": {}}))).unwrap();

        assert_eq!(model.kind, ModelKind::Completions);
        assert!(!model.supports(Capability::ToolCalling));
        assert!(!model.supports(Capability::OutputStructured));
    }

    #[test]
    fn legacy_function_calling_flag_is_honored() {
        let model = describe_model(descriptor(json!({
            "model_name": "older",
            "model_info": {"mode": "chat", "supports_function_calling": true}
        })))
        .unwrap();

        assert!(model.supports(Capability::ToolCalling));
    }

    #[test]
    fn embedding_mode_defaults_multiple_inputs_to_true() {
        let model = describe_model(descriptor(json!({
            "model_name": "titan-embed-text-v2:0",
            "model_info": {"mode": "embedding"}
        })))
        .unwrap();

        assert_eq!(model.kind, ModelKind::Embeddings);
        assert!(model.supports(Capability::Embeddings));
        assert!(model.supports(Capability::InputText));
        assert!(model.supports(Capability::InputMultiple));
    }

    #[test]
    fn embedding_can_opt_out_of_multiple_inputs() {
        let model = describe_model(descriptor(json!({
            "model_name": "single-input-embed",
            "model_info": {"mode": "embedding", "supports_multiple_inputs": false}
        })))
        .unwrap();

        assert!(!model.supports(Capability::InputMultiple));
    }

    #[test]
    fn descriptor_without_name_is_skipped() {
        assert!(describe_model(descriptor(json!({"model_info": {"mode": "chat"}}))).is_none());
    }

    #[tokio::test]
    async fn empty_model_name_is_invalid() {
        let catalog = ModelCatalog::new(Url::parse("https://litellm.example.com").unwrap(), None);

        let err = catalog.model("").await.unwrap_err();

        assert!(matches!(err, BridgeError::InvalidArgument(_)));
    }
}
