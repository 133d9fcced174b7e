//! Structured `tracing` events for provider, tool, and chat phases.
//!
//! ```rust
//! use kchat::OrchestratorHooks;
//! use kobserve::TracingObservabilityHooks;
//!
//! fn accepts_chat_hooks(_hooks: &dyn OrchestratorHooks) {}
//!
//! accepts_chat_hooks(&TracingObservabilityHooks);
//! ```

use std::time::Duration;

use kchat::{ChatError, HistoryOperation, OrchestratorHooks, TierKind};
use kcommon::{ThreadId, UserId};
use kmemory::HistoryError;
use kprovider::{ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ktooling::{ToolError, ToolExecutionContext, ToolResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, model: &str) {
        tracing::info!(phase = "provider", event = "attempt_start", provider = %provider, model);
    }

    fn on_success(&self, provider: ProviderId, model: &str, elapsed: Duration) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider = %provider,
            model,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        model: &str,
        error: &ProviderError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider = %provider,
            model,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            quota = error.is_quota(),
            error = %error
        );
    }
}

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_execution_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "tool",
            event = "execution_start",
            tool_name = tool_call.name,
            user_id = %context.user_id,
            thread_id = %context.thread_id
        );
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        result: &ToolResult,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "execution_success",
            tool_name = tool_call.name,
            user_id = %context.user_id,
            thread_id = %context.thread_id,
            elapsed_ms = elapsed.as_millis() as u64,
            result_chars = result.content.chars().count()
        );
    }

    fn on_soft_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        diagnostic: &str,
        elapsed: Duration,
    ) {
        tracing::warn!(
            phase = "tool",
            event = "soft_failure",
            tool_name = tool_call.name,
            user_id = %context.user_id,
            thread_id = %context.thread_id,
            elapsed_ms = elapsed.as_millis() as u64,
            diagnostic
        );
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "tool",
            event = "execution_failure",
            tool_name = tool_call.name,
            user_id = %context.user_id,
            thread_id = %context.thread_id,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }
}

impl OrchestratorHooks for TracingObservabilityHooks {
    fn on_request_start(&self, user_id: &UserId, thread_id: &ThreadId) {
        tracing::info!(
            phase = "chat",
            event = "request_start",
            user_id = %user_id,
            thread_id = %thread_id
        );
    }

    fn on_tier_failure(&self, tier: TierKind, model: &str, error: &ProviderError) {
        tracing::error!(
            phase = "chat",
            event = "tier_failure",
            tier = %tier,
            model,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_tier_fallback(&self, from: TierKind, to: TierKind, error: &ProviderError) {
        tracing::warn!(
            phase = "chat",
            event = "tier_fallback",
            from = %from,
            to = %to,
            error_kind = ?error.kind
        );
    }

    fn on_tool_call(&self, tier: TierKind, tool_call: &ToolCall) {
        tracing::info!(
            phase = "chat",
            event = "tool_call",
            tier = %tier,
            tool_name = tool_call.name
        );
    }

    fn on_ignored_function_calls(&self, tier: TierKind, ignored: &[ToolCall]) {
        let names = ignored
            .iter()
            .map(|call| call.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        tracing::warn!(
            phase = "chat",
            event = "ignored_function_calls",
            tier = %tier,
            count = ignored.len(),
            tool_names = names
        );
    }

    fn on_unrecognized_part(&self, tier: TierKind, kind: &str) {
        tracing::warn!(phase = "chat", event = "unrecognized_part", tier = %tier, part_kind = kind);
    }

    fn on_history_error(
        &self,
        operation: HistoryOperation,
        user_id: &UserId,
        thread_id: &ThreadId,
        error: &HistoryError,
    ) {
        tracing::error!(
            phase = "chat",
            event = "history_error",
            operation = %operation,
            user_id = %user_id,
            thread_id = %thread_id,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_response_complete(
        &self,
        tier: TierKind,
        model: &str,
        elapsed: Duration,
        persisted: bool,
    ) {
        tracing::info!(
            phase = "chat",
            event = "response_complete",
            tier = %tier,
            model,
            elapsed_ms = elapsed.as_millis() as u64,
            persisted
        );
    }

    fn on_request_failure(&self, error: &ChatError, elapsed: Duration) {
        tracing::error!(
            phase = "chat",
            event = "request_failure",
            error_kind = ?error.kind,
            attempted_tiers = error.failures.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            error = %error
        );
    }
}
