//! Conversation turn types and the shared bounded-append rule.

use serde::{Deserialize, Serialize};

/// Persisted as `"user"` or `"model"`. Legacy `"assistant"` rows read back
/// as `Model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    #[serde(alias = "assistant")]
    Model,
}

impl TurnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            content: content.into(),
        }
    }
}

/// Appends one `(user, model)` pair and evicts from the front until at most
/// `max_pairs` pairs remain.
pub(crate) fn append_pair(
    turns: &mut Vec<ConversationTurn>,
    user_message: &str,
    model_message: &str,
    max_pairs: usize,
) {
    turns.push(ConversationTurn::user(user_message));
    turns.push(ConversationTurn::model(model_message));

    let limit = max_pairs.saturating_mul(2);
    if turns.len() > limit {
        let excess = turns.len() - limit;
        turns.drain(..excess);
    }
}

pub(crate) fn encode_turns(turns: &[ConversationTurn]) -> Result<String, crate::HistoryError> {
    serde_json::to_string(turns).map_err(|error| {
        crate::HistoryError::serialization(format!("failed to encode history: {error}"))
    })
}

pub(crate) fn decode_turns(json: &str) -> Result<Vec<ConversationTurn>, crate::HistoryError> {
    serde_json::from_str(json).map_err(|error| {
        crate::HistoryError::serialization(format!("failed to decode stored history: {error}"))
    })
}
