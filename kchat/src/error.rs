//! Chat-layer errors, including the compound per-tier failure list.

use std::error::Error;
use std::fmt::{Display, Formatter};

use kprovider::ProviderError;
use ktooling::ToolError;

use crate::TierKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    /// Every tier the fallback rules allowed was tried and failed.
    ProviderChainExhausted,
    /// A tier failed in a way that does not fall through, or the follow-up
    /// call after a tool round trip failed.
    Provider,
    Tooling,
}

/// One attempted tier and why it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierFailure {
    pub tier: TierKind,
    pub model: String,
    pub error: ProviderError,
}

impl TierFailure {
    pub fn new(tier: TierKind, model: impl Into<String>, error: ProviderError) -> Self {
        Self {
            tier,
            model: model.into(),
            error,
        }
    }
}

impl Display for TierFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.tier, self.model, self.error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub failures: Vec<TierFailure>,
    /// Set when a hard tool error aborted the round trip.
    pub tool_error: Option<ToolError>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            failures: Vec::new(),
            tool_error: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn chain_exhausted(failures: Vec<TierFailure>) -> Self {
        Self {
            kind: ChatErrorKind::ProviderChainExhausted,
            message: format!("all {} attempted provider tiers failed", failures.len()),
            failures,
            tool_error: None,
        }
    }

    pub fn provider(message: impl Into<String>, failures: Vec<TierFailure>) -> Self {
        Self {
            kind: ChatErrorKind::Provider,
            message: message.into(),
            failures,
            tool_error: None,
        }
    }

    pub fn tooling(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Tooling, message)
    }

    pub fn attempted_tiers(&self) -> impl Iterator<Item = TierKind> + '_ {
        self.failures.iter().map(|failure| failure.tier)
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)?;
        for failure in &self.failures {
            write!(f, "; {failure}")?;
        }

        Ok(())
    }
}

impl Error for ChatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.tool_error.as_ref().map(|error| error as &(dyn Error + 'static))
    }
}

impl From<ToolError> for ChatError {
    fn from(value: ToolError) -> Self {
        let mut error = ChatError::tooling(value.to_string());
        error.tool_error = Some(value);
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_every_attempted_tier() {
        let error = ChatError::chain_exhausted(vec![
            TierFailure::new(
                TierKind::Primary,
                "gemini-2.0-flash",
                ProviderError::rate_limited("quota"),
            ),
            TierFailure::new(
                TierKind::LocalFallback,
                "llama3.2",
                ProviderError::unavailable("connection refused"),
            ),
        ]);

        assert_eq!(
            error.to_string(),
            "ProviderChainExhausted: all 2 attempted provider tiers failed; \
             primary (gemini-2.0-flash): RateLimited: quota; \
             local_fallback (llama3.2): Unavailable: connection refused"
        );
        assert_eq!(
            error.attempted_tiers().collect::<Vec<_>>(),
            vec![TierKind::Primary, TierKind::LocalFallback]
        );
    }

    #[test]
    fn tool_errors_keep_their_kind_and_tool_name() {
        let error = ChatError::from(
            ToolError::not_found("unknown tool `getTide`").with_tool_name("getTide"),
        );

        assert_eq!(error.kind, ChatErrorKind::Tooling);
        let cause = error.tool_error.as_ref().expect("tool error should be kept");
        assert_eq!(cause.kind, ktooling::ToolErrorKind::NotFound);
        assert_eq!(cause.tool_name.as_deref(), Some("getTide"));
        assert!(cause.is_model_error());
        assert!(error.source().is_some());
        assert!(ChatError::invalid_request("empty").source().is_none());
    }
}
