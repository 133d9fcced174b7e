//! Wrappers that keep a panicking hook from taking a request down with it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use kchat::{ChatError, HistoryOperation, OrchestratorHooks, TierKind};
use kcommon::{ThreadId, UserId};
use kmemory::HistoryError;
use kprovider::{ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ktooling::{ToolError, ToolExecutionContext, ToolResult, ToolRuntimeHooks};

fn isolate(hook: impl FnOnce()) {
    let _ = catch_unwind(AssertUnwindSafe(hook));
}

pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ProviderOperationHooks for SafeProviderHooks<H>
where
    H: ProviderOperationHooks,
{
    fn on_attempt_start(&self, provider: ProviderId, model: &str) {
        isolate(|| self.inner.on_attempt_start(provider, model));
    }

    fn on_success(&self, provider: ProviderId, model: &str, elapsed: Duration) {
        isolate(|| self.inner.on_success(provider, model, elapsed));
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        model: &str,
        error: &ProviderError,
        elapsed: Duration,
    ) {
        isolate(|| self.inner.on_failure(provider, model, error, elapsed));
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_execution_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        isolate(|| self.inner.on_execution_start(tool_call, context));
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        result: &ToolResult,
        elapsed: Duration,
    ) {
        isolate(|| {
            self.inner
                .on_execution_success(tool_call, context, result, elapsed)
        });
    }

    fn on_soft_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        diagnostic: &str,
        elapsed: Duration,
    ) {
        isolate(|| {
            self.inner
                .on_soft_failure(tool_call, context, diagnostic, elapsed)
        });
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        isolate(|| {
            self.inner
                .on_execution_failure(tool_call, context, error, elapsed)
        });
    }
}

pub struct SafeOrchestratorHooks<H> {
    inner: H,
}

impl<H> SafeOrchestratorHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> OrchestratorHooks for SafeOrchestratorHooks<H>
where
    H: OrchestratorHooks,
{
    fn on_request_start(&self, user_id: &UserId, thread_id: &ThreadId) {
        isolate(|| self.inner.on_request_start(user_id, thread_id));
    }

    fn on_tier_failure(&self, tier: TierKind, model: &str, error: &ProviderError) {
        isolate(|| self.inner.on_tier_failure(tier, model, error));
    }

    fn on_tier_fallback(&self, from: TierKind, to: TierKind, error: &ProviderError) {
        isolate(|| self.inner.on_tier_fallback(from, to, error));
    }

    fn on_tool_call(&self, tier: TierKind, tool_call: &ToolCall) {
        isolate(|| self.inner.on_tool_call(tier, tool_call));
    }

    fn on_ignored_function_calls(&self, tier: TierKind, ignored: &[ToolCall]) {
        isolate(|| self.inner.on_ignored_function_calls(tier, ignored));
    }

    fn on_unrecognized_part(&self, tier: TierKind, kind: &str) {
        isolate(|| self.inner.on_unrecognized_part(tier, kind));
    }

    fn on_history_error(
        &self,
        operation: HistoryOperation,
        user_id: &UserId,
        thread_id: &ThreadId,
        error: &HistoryError,
    ) {
        isolate(|| {
            self.inner
                .on_history_error(operation, user_id, thread_id, error)
        });
    }

    fn on_response_complete(
        &self,
        tier: TierKind,
        model: &str,
        elapsed: Duration,
        persisted: bool,
    ) {
        isolate(|| {
            self.inner
                .on_response_complete(tier, model, elapsed, persisted)
        });
    }

    fn on_request_failure(&self, error: &ChatError, elapsed: Duration) {
        isolate(|| self.inner.on_request_failure(error, elapsed));
    }
}
