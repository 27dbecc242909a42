//! Streaming response accumulation
//!
//! The proxy fragments tool call arguments across delta chunks: the first
//! fragment for a call carries its id and function name, later fragments
//! append to the arguments string. Text tokens are passed through as they
//! arrive; the reassembled calls are emitted once the stream reports
//! `finish_reason: "tool_calls"`.

use std::collections::BTreeMap;

use futures_util::StreamExt;
use litellm_protocol::stream::{StreamChunk, StreamToolCall};

use crate::convert::ChunkStream;
use crate::error::BridgeError;
use crate::result::{StreamItem, TokenStream, ToolCall};

/// Partially accumulated tool call
#[derive(Debug, Clone)]
struct PendingCall {
    id: String,
    name: String,
    arguments: String,
}

/// Fold state for streamed tool call fragments
///
/// Entries are keyed by array position within each delta's `tool_calls`
/// list. An entry is created exactly once, by the fragment that carries an
/// id; its arguments string is append-only until finalization.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    pending: BTreeMap<usize, PendingCall>,
}

impl ToolCallAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any fragments have been accumulated
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Fold one delta's tool call fragments into the accumulator
    ///
    /// A fragment with an id opens (or replaces) the call at its position,
    /// discarding any previously accumulated arguments there. An id-less
    /// fragment for a position that was never opened is a malformed stream.
    pub fn absorb(&mut self, fragments: Vec<StreamToolCall>) -> Result<(), BridgeError> {
        for (position, fragment) in fragments.into_iter().enumerate() {
            let function = fragment.function.unwrap_or_default();

            if let Some(id) = fragment.id {
                self.pending.insert(
                    position,
                    PendingCall {
                        id,
                        name: function.name.unwrap_or_default(),
                        arguments: function.arguments.unwrap_or_default(),
                    },
                );
                continue;
            }

            let Some(pending) = self.pending.get_mut(&position) else {
                return Err(BridgeError::Runtime(format!(
                    "Malformed stream: tool call fragment at position {position} arrived before its id."
                )));
            };
            if let Some(arguments) = function.arguments {
                pending.arguments.push_str(&arguments);
            }
        }

        Ok(())
    }

    /// Finalize all accumulated fragments in position order
    ///
    /// Consumes and clears the state; each arguments string is parsed as
    /// JSON exactly once. A parse failure here means the vendor signalled
    /// completion before all fragments arrived.
    pub fn finalize(&mut self) -> Result<Vec<ToolCall>, BridgeError> {
        let pending = std::mem::take(&mut self.pending);
        pending
            .into_values()
            .map(|call| ToolCall::from_raw(call.id, call.name, &call.arguments))
            .collect()
    }
}

/// Apply one chunk to the accumulator, producing the items it emits
///
/// A chunk can contribute fragments without emitting anything itself.
pub fn chunk_events(accumulator: &mut ToolCallAccumulator, chunk: StreamChunk) -> Result<Vec<StreamItem>, BridgeError> {
    let mut items = Vec::new();

    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(items);
    };

    if let Some(fragments) = choice.delta.tool_calls {
        accumulator.absorb(fragments)?;
    }

    if !accumulator.is_empty() && choice.finish_reason.as_deref() == Some("tool_calls") {
        items.push(StreamItem::ToolCalls(accumulator.finalize()?));
    }

    if let Some(content) = choice.delta.content {
        items.push(StreamItem::Token(content));
    }

    Ok(items)
}

/// Adapt a chunk stream into a lazy stream of tokens and tool call results
///
/// Consumption is pull-driven: requesting the next item pulls at most one
/// chunk from the transport, and the chunk sequence is never materialized.
pub fn accumulate(chunks: ChunkStream) -> TokenStream {
    let mut accumulator = ToolCallAccumulator::new();

    let mapped = chunks
        .map(move |result| match result {
            Ok(chunk) => match chunk_events(&mut accumulator, chunk) {
                Ok(items) => items.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            },
            Err(e) => vec![Err(e)],
        })
        .flat_map(futures_util::stream::iter);

    Box::pin(mapped)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn chunk(value: serde_json::Value) -> StreamChunk {
        serde_json::from_value(value).unwrap()
    }

    fn fragments(value: serde_json::Value) -> Vec<StreamToolCall> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn opening_fragment_then_append_then_finalize() {
        let mut accumulator = ToolCallAccumulator::new();

        accumulator
            .absorb(fragments(json!([
                {"id": "c1", "function": {"name": "get_weather", "arguments": "{\"city\":"}}
            ])))
            .unwrap();
        accumulator
            .absorb(fragments(json!([{"function": {"arguments": "\"Paris\"}"}}])))
            .unwrap();

        let calls = accumulator.finalize().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "c1");
        assert_eq!(calls[0].name, "get_weather");
        assert_eq!(calls[0].arguments, json!({"city": "Paris"}));
        assert!(accumulator.is_empty());
    }

    #[test]
    fn fragment_with_id_replaces_accumulated_arguments() {
        let mut accumulator = ToolCallAccumulator::new();

        accumulator
            .absorb(fragments(json!([
                {"id": "c1", "function": {"name": "first", "arguments": "{\"a\":1"}}
            ])))
            .unwrap();
        accumulator
            .absorb(fragments(json!([
                {"id": "c2", "function": {"name": "second", "arguments": "{}"}}
            ])))
            .unwrap();

        let calls = accumulator.finalize().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "c2");
        assert_eq!(calls[0].name, "second");
        assert_eq!(calls[0].arguments, json!({}));
    }

    #[test]
    fn parallel_calls_keep_position_order() {
        let mut accumulator = ToolCallAccumulator::new();

        accumulator
            .absorb(fragments(json!([
                {"id": "c1", "function": {"name": "alpha", "arguments": "{}"}},
                {"id": "c2", "function": {"name": "beta", "arguments": "{}"}}
            ])))
            .unwrap();

        let calls = accumulator.finalize().unwrap();
        assert_eq!(calls[0].name, "alpha");
        assert_eq!(calls[1].name, "beta");
    }

    #[test]
    fn fragment_before_id_is_malformed() {
        let mut accumulator = ToolCallAccumulator::new();

        let err = accumulator
            .absorb(fragments(json!([{"function": {"arguments": "oops"}}])))
            .unwrap_err();

        assert!(matches!(err, BridgeError::Runtime(ref m) if m.starts_with("Malformed stream")));
    }

    #[test]
    fn incomplete_arguments_fail_at_finalization() {
        let mut accumulator = ToolCallAccumulator::new();

        accumulator
            .absorb(fragments(json!([
                {"id": "c1", "function": {"name": "partial", "arguments": "{\"city\":"}}
            ])))
            .unwrap();

        assert!(matches!(accumulator.finalize(), Err(BridgeError::Serialization(_))));
    }

    #[test]
    fn content_delta_emits_token() {
        let mut accumulator = ToolCallAccumulator::new();

        let items = chunk_events(
            &mut accumulator,
            chunk(json!({"choices": [{"delta": {"content": "Hel"}}]})),
        )
        .unwrap();

        assert_eq!(items, vec![StreamItem::Token("Hel".to_owned())]);
    }

    #[test]
    fn fragment_chunk_emits_nothing() {
        let mut accumulator = ToolCallAccumulator::new();

        let items = chunk_events(
            &mut accumulator,
            chunk(json!({
                "choices": [{"delta": {"tool_calls": [
                    {"id": "c1", "function": {"name": "f", "arguments": "{"}}
                ]}}]
            })),
        )
        .unwrap();

        assert!(items.is_empty());
        assert!(!accumulator.is_empty());
    }

    #[test]
    fn finish_without_accumulated_calls_emits_nothing() {
        let mut accumulator = ToolCallAccumulator::new();

        let items = chunk_events(&mut accumulator, chunk(json!({"choices": [{"finish_reason": "stop"}]}))).unwrap();

        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn accumulates_fragmented_tool_call_across_chunks() {
        let chunks: ChunkStream = Box::pin(futures_util::stream::iter(
            [
                json!({"choices": [{"delta": {"tool_calls": [
                    {"id": "c1", "function": {"name": "get_weather", "arguments": "{\"city\":"}}
                ]}}]}),
                json!({"choices": [{"delta": {"tool_calls": [
                    {"function": {"arguments": "\"Paris\"}"}}
                ]}}]}),
                json!({"choices": [{"finish_reason": "tool_calls"}]}),
            ]
            .map(|value| Ok::<_, BridgeError>(chunk(value))),
        ));

        let items: Vec<_> = accumulate(chunks)
            .map(Result::unwrap)
            .collect::<Vec<_>>()
            .await;

        assert_eq!(
            items,
            vec![StreamItem::ToolCalls(vec![ToolCall {
                id: "c1".to_owned(),
                name: "get_weather".to_owned(),
                arguments: json!({"city": "Paris"}),
            }])]
        );
    }

    #[tokio::test]
    async fn passes_text_tokens_through_in_order() {
        let chunks: ChunkStream = Box::pin(futures_util::stream::iter(
            [
                json!({"choices": [{"delta": {"role": "assistant"}}]}),
                json!({"choices": [{"delta": {"content": "Hello"}}]}),
                json!({"choices": [{"delta": {"content": " world"}}]}),
                json!({"choices": [{"finish_reason": "stop"}]}),
            ]
            .map(|value| Ok::<_, BridgeError>(chunk(value))),
        ));

        let items: Vec<_> = accumulate(chunks)
            .map(Result::unwrap)
            .collect::<Vec<_>>()
            .await;

        assert_eq!(
            items,
            vec![
                StreamItem::Token("Hello".to_owned()),
                StreamItem::Token(" world".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn transport_error_surfaces_in_stream() {
        let chunks: ChunkStream = Box::pin(futures_util::stream::iter(vec![
            Ok(chunk(json!({"choices": [{"delta": {"content": "a"}}]}))),
            Err(BridgeError::Streaming("connection reset".to_owned())),
        ]));

        let items: Vec<_> = accumulate(chunks).collect::<Vec<_>>().await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(BridgeError::Streaming(_))));
    }
}
