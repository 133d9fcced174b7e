//! Request and outcome types for a single response.

use kcommon::{ThreadId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRequest {
    pub user_id: UserId,
    pub thread_id: ThreadId,
    pub username: String,
    pub message: String,
    pub timestamp: Option<String>,
    pub system_prompt: String,
}

impl ResponseRequest {
    pub fn new(
        user_id: impl Into<UserId>,
        thread_id: impl Into<ThreadId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            thread_id: thread_id.into(),
            username: String::new(),
            message: message.into(),
            timestamp: None,
            system_prompt: String::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }
}

/// `model_name` is the tier that produced the final text, which may differ
/// from the tier that first received the request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseOutcome {
    pub text: String,
    pub elapsed_ms: f64,
    pub model_name: String,
}
