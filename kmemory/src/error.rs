//! History-store errors for conversation persistence operations.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryErrorKind {
    Storage,
    Serialization,
    Closed,
    InvalidRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryError {
    pub kind: HistoryErrorKind,
    pub message: String,
}

impl HistoryError {
    pub fn new(kind: HistoryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(HistoryErrorKind::Storage, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(HistoryErrorKind::Serialization, message)
    }

    pub fn closed() -> Self {
        Self::new(HistoryErrorKind::Closed, "history store is closed")
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(HistoryErrorKind::InvalidRequest, message)
    }
}

impl Display for HistoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for HistoryError {}
