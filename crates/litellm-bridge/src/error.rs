use thiserror::Error;

/// Errors that can occur while talking to the proxy or normalizing its
/// responses
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Proxy rejected the credentials (HTTP 401)
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Proxy rejected the request (HTTP 400)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Proxy throttled the request (HTTP 429)
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Proxy refused the content
    #[error("content filtered: {0}")]
    ContentFilter(String),

    /// Response shape the converter cannot interpret
    #[error("{0}")]
    Runtime(String),

    /// Tool call arguments were not valid JSON at finalization
    #[error("invalid tool call arguments: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requested model is absent from the discovered catalog
    #[error("model not found: {model}")]
    ModelNotFound {
        /// The name that was looked up
        model: String,
    },

    /// Caller passed an unusable argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Upstream request failed before a response could be classified
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Error while draining a streamed response
    #[error("streaming error: {0}")]
    Streaming(String),
}
