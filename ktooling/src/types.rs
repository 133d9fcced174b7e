//! Tool execution context and textual result types.

use kcommon::{MetadataMap, ThreadId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExecutionContext {
    pub user_id: UserId,
    pub thread_id: ThreadId,
    pub metadata: MetadataMap,
}

impl ToolExecutionContext {
    pub fn new(user_id: impl Into<UserId>, thread_id: impl Into<ThreadId>) -> Self {
        Self {
            user_id: user_id.into(),
            thread_id: thread_id.into(),
            metadata: MetadataMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Always textual. A soft failure still carries user-facing `content`; the
/// `failure` diagnostic is for hooks and never reaches the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub content: String,
    pub failure: Option<String>,
}

impl ToolResult {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            failure: None,
        }
    }

    pub fn soft_failure(content: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            failure: Some(diagnostic.into()),
        }
    }

    pub fn is_soft_failure(&self) -> bool {
        self.failure.is_some()
    }
}
