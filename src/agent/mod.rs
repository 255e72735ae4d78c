pub mod echo;
pub mod scripted;

use crate::error::AgentError;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub use echo::EchoRuntime;
pub use scripted::ScriptedRuntime;

/// Name of the shell-execution tool whose results get the specialized view.
pub const SHELL_TOOL_NAME: &str = "exec_command";

pub type EventStream = BoxStream<'static, RenderEvent>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub id: String,
    pub name: String,
    pub result: String,
    #[serde(default)]
    pub is_error: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

impl Usage {
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// One step of an agent run, in the order the runtime emits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderEvent {
    ThinkingStart,
    ThinkingChunk { text: String },
    ThinkingEnd,
    OutputStart,
    OutputChunk { text: String },
    OutputEnd,
    ToolCall(ToolCall),
    ToolResult(ToolResult),
    Complete {
        #[serde(default)]
        response: String,
        #[serde(default)]
        usage: Usage,
    },
    Error { error: AgentError },
}

impl RenderEvent {
    pub fn thinking(text: impl Into<String>) -> Self {
        Self::ThinkingChunk { text: text.into() }
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self::OutputChunk { text: text.into() }
    }

    /// `complete` and `error` settle a run; nothing follows them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}

/// The agent side of the console: starts runs and accepts abort requests.
///
/// `abort` only signals; the runtime is expected to wind down and finish the
/// stream with `RenderEvent::Error { error: AgentError::Aborted }`.
pub trait AgentRuntime {
    fn run(&mut self, prompt: &str) -> EventStream;
    fn abort(&self);
}

impl<R: AgentRuntime + ?Sized> AgentRuntime for Box<R> {
    fn run(&mut self, prompt: &str) -> EventStream {
        (**self).run(prompt)
    }

    fn abort(&self) {
        (**self).abort()
    }
}

/// Yields `events` one by one, `delay` apart, until a terminal event or
/// until `cancel` fires, in which case the stream ends with an abort error.
pub(crate) fn paced_stream(
    events: Vec<RenderEvent>,
    delay: Duration,
    cancel: CancellationToken,
) -> EventStream {
    let queue: VecDeque<RenderEvent> = events.into();
    stream::unfold((queue, false), move |(mut queue, done)| {
        let cancel = cancel.clone();
        async move {
            if done {
                return None;
            }
            if !delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            if cancel.is_cancelled() {
                let aborted = RenderEvent::Error {
                    error: AgentError::Aborted,
                };
                return Some((aborted, (queue, true)));
            }
            let event = queue.pop_front()?;
            let done = event.is_terminal();
            Some((event, (queue, done)))
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_event_json_shape() {
        let event: RenderEvent = serde_json::from_str(
            r#"{"type":"tool_result","id":"t1","name":"exec_command","result":"{}"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            RenderEvent::ToolResult(ToolResult {
                id: "t1".to_string(),
                name: "exec_command".to_string(),
                result: "{}".to_string(),
                is_error: false,
            })
        );

        let error: RenderEvent =
            serde_json::from_str(r#"{"type":"error","error":{"failed":"boom"}}"#).unwrap();
        assert_eq!(
            error,
            RenderEvent::Error {
                error: AgentError::failed("boom")
            }
        );
        assert!(error.is_terminal());
        assert!(!RenderEvent::OutputEnd.is_terminal());
    }

    #[tokio::test]
    async fn test_paced_stream_stops_after_terminal_event() {
        let events = vec![
            RenderEvent::OutputStart,
            RenderEvent::Complete {
                response: String::new(),
                usage: Usage::default(),
            },
            RenderEvent::OutputEnd,
        ];
        let collected: Vec<_> = paced_stream(events, Duration::ZERO, CancellationToken::new())
            .collect()
            .await;
        assert_eq!(collected.len(), 2);
        assert!(collected[1].is_terminal());
    }

    #[tokio::test]
    async fn test_paced_stream_ends_with_abort_once_cancelled() {
        let cancel = CancellationToken::new();
        let mut stream = paced_stream(
            vec![RenderEvent::OutputStart, RenderEvent::output("a")],
            Duration::ZERO,
            cancel.clone(),
        );
        assert_eq!(stream.next().await, Some(RenderEvent::OutputStart));
        cancel.cancel();
        assert_eq!(
            stream.next().await,
            Some(RenderEvent::Error {
                error: AgentError::Aborted
            })
        );
        assert_eq!(stream.next().await, None);
    }
}
