use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome classification of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Error,
    ChoicesNeeded,
}

/// The uniform reply of every alfred tool.
///
/// `message` is for humans; `next_prompt` is the text the calling agent
/// should act on next; `data` carries tool-specific payloads (turn
/// numbers, rankings, progress counters).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    pub status: ResponseStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_prompt: Option<String>,
}

impl ToolResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data: None,
            next_prompt: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            data: None,
            next_prompt: None,
        }
    }

    pub fn choices_needed(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::ChoicesNeeded,
            message: message.into(),
            data: None,
            next_prompt: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.next_prompt = Some(prompt.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == ResponseStatus::Error
    }
}
