use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal failure reported by an agent runtime for one run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentError {
    /// The run stopped because the operator interrupted it.
    #[error("Aborted")]
    Aborted,
    #[error("Exceeded maximum steps")]
    MaxSteps,
    #[error("{0}")]
    Failed(String),
}

impl AgentError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}
