use super::{paced_stream, AgentRuntime, EventStream, RenderEvent, Usage};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Stand-in runtime that streams the prompt back as the answer.
pub struct EchoRuntime {
    chunk_delay: Duration,
    cancel: CancellationToken,
}

impl EchoRuntime {
    pub fn new(chunk_delay: Duration) -> Self {
        Self {
            chunk_delay,
            cancel: CancellationToken::new(),
        }
    }

    fn script(prompt: &str) -> Vec<RenderEvent> {
        let mut events = vec![
            RenderEvent::ThinkingStart,
            RenderEvent::thinking("Echoing the prompt back."),
            RenderEvent::ThinkingEnd,
            RenderEvent::OutputStart,
        ];
        events.extend(
            prompt
                .split_inclusive([' ', '\n'])
                .map(RenderEvent::output),
        );
        events.push(RenderEvent::OutputEnd);

        let words = prompt.split_whitespace().count() as u64;
        events.push(RenderEvent::Complete {
            response: prompt.to_string(),
            usage: Usage {
                prompt_tokens: words,
                completion_tokens: words,
            },
        });
        events
    }
}

impl AgentRuntime for EchoRuntime {
    fn run(&mut self, prompt: &str) -> EventStream {
        self.cancel = CancellationToken::new();
        tracing::debug!(chars = prompt.len(), "echo run started");
        paced_stream(Self::script(prompt), self.chunk_delay, self.cancel.clone())
    }

    fn abort(&self) {
        self.cancel.cancel();
    }
}
