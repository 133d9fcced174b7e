//! Lifecycle hooks for response orchestration.
//!
//! ```rust
//! use kchat::{NoopOrchestratorHooks, OrchestratorHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn OrchestratorHooks) {}
//!
//! assert_hooks_trait(&NoopOrchestratorHooks);
//! ```

use std::fmt::{Display, Formatter};
use std::time::Duration;

use kcommon::{ThreadId, UserId};
use kmemory::HistoryError;
use kprovider::{ProviderError, ToolCall};

use crate::{ChatError, TierKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOperation {
    Read,
    Write,
}

impl Display for HistoryOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

pub trait OrchestratorHooks: Send + Sync {
    fn on_request_start(&self, _user_id: &UserId, _thread_id: &ThreadId) {}

    fn on_tier_failure(&self, _tier: TierKind, _model: &str, _error: &ProviderError) {}

    fn on_tier_fallback(&self, _from: TierKind, _to: TierKind, _error: &ProviderError) {}

    fn on_tool_call(&self, _tier: TierKind, _tool_call: &ToolCall) {}

    /// Extra function calls in one response beyond the first are dropped.
    fn on_ignored_function_calls(&self, _tier: TierKind, _ignored: &[ToolCall]) {}

    fn on_unrecognized_part(&self, _tier: TierKind, _kind: &str) {}

    /// History failures never fail the request.
    fn on_history_error(
        &self,
        _operation: HistoryOperation,
        _user_id: &UserId,
        _thread_id: &ThreadId,
        _error: &HistoryError,
    ) {
    }

    fn on_response_complete(
        &self,
        _tier: TierKind,
        _model: &str,
        _elapsed: Duration,
        _persisted: bool,
    ) {
    }

    fn on_request_failure(&self, _error: &ChatError, _elapsed: Duration) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOrchestratorHooks;

impl OrchestratorHooks for NoopOrchestratorHooks {}
