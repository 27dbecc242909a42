//! HTTP transport for the proxy's chat completions endpoint

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use litellm_protocol::request::ChatRequest;
use litellm_protocol::stream::StreamChunk;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::convert::{ChunkStream, ConvertOptions, RawResponse, ResponseBody, convert_response};
use crate::error::BridgeError;
use crate::result::CompletionResult;

/// Client for an `OpenAI`-compatible `LiteLLM` proxy
pub struct LiteLlmClient {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl LiteLlmClient {
    /// Create a client for the proxy at `base_url`
    pub fn new(base_url: Url, api_key: Option<SecretString>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    /// Build the chat completions URL
    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response, BridgeError> {
        let mut builder = self.client.post(self.completions_url()).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "proxy request failed");
            BridgeError::Upstream(e.to_string())
        })
    }

    /// Run a buffered completion and normalize the response
    pub async fn complete(&self, request: &ChatRequest) -> Result<CompletionResult, BridgeError> {
        let mut request = request.clone();
        request.stream = None;

        let response = self.send(&request).await?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BridgeError::Upstream(e.to_string()))?;

        let body = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) if status.is_success() => {
                return Err(BridgeError::Upstream(format!("failed to parse response: {e}")));
            }
            // Non-JSON error bodies still classify by status
            Err(_) => serde_json::Value::Object(serde_json::Map::new()),
        };

        convert_response(
            RawResponse {
                status,
                body: ResponseBody::Buffered(body),
            },
            ConvertOptions { stream: false },
        )
    }

    /// Run a streamed completion; the returned result wraps a lazy stream
    /// of text tokens and reassembled tool calls
    pub async fn complete_stream(&self, request: &ChatRequest) -> Result<CompletionResult, BridgeError> {
        let mut request = request.clone();
        request.stream = Some(true);

        let response = self.send(&request).await?;
        let status = response.status();

        if !status.is_success() {
            // Error responses are buffered so the status rules can read them
            let text = response.text().await.unwrap_or_default();
            let body =
                serde_json::from_str(&text).unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()));

            return convert_response(
                RawResponse {
                    status,
                    body: ResponseBody::Buffered(body),
                },
                ConvertOptions { stream: false },
            );
        }

        convert_response(
            RawResponse {
                status,
                body: ResponseBody::Streaming(chunk_stream(response)),
            },
            ConvertOptions { stream: true },
        )
    }
}

/// Decode an SSE response into a typed chunk stream
///
/// Unparseable data lines are skipped; `[DONE]` carries no chunk.
fn chunk_stream(response: reqwest::Response) -> ChunkStream {
    let events = response.bytes_stream().eventsource();

    let mapped = events
        .map(|result| match result {
            Ok(event) => {
                let data = event.data.trim().to_owned();
                if data == "[DONE]" {
                    return vec![];
                }

                match serde_json::from_str::<StreamChunk>(&data) {
                    Ok(chunk) => vec![Ok(chunk)],
                    Err(e) => {
                        tracing::debug!(error = %e, data = %data, "skipping unparseable SSE chunk");
                        vec![]
                    }
                }
            }
            Err(e) => vec![Err(BridgeError::Streaming(e.to_string()))],
        })
        .flat_map(futures_util::stream::iter);

    Box::pin(mapped)
}
