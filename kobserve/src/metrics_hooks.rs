//! `metrics` counters and histograms for provider, tool, and chat phases.
//!
//! ```rust
//! use kobserve::MetricsObservabilityHooks;
//! use kprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! accepts_provider_hooks(&MetricsObservabilityHooks);
//! ```

use std::time::Duration;

use kchat::{ChatError, HistoryOperation, OrchestratorHooks, TierKind};
use kcommon::{ThreadId, UserId};
use kmemory::HistoryError;
use kprovider::{ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ktooling::{ToolError, ToolExecutionContext, ToolResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, model: &str) {
        metrics::counter!(
            "kazamidori_provider_attempt_start_total",
            "provider" => provider.to_string(),
            "model" => model.to_string()
        )
        .increment(1);
    }

    fn on_success(&self, provider: ProviderId, model: &str, elapsed: Duration) {
        metrics::counter!(
            "kazamidori_provider_success_total",
            "provider" => provider.to_string(),
            "model" => model.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "kazamidori_provider_duration_seconds",
            "provider" => provider.to_string(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        model: &str,
        error: &ProviderError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "kazamidori_provider_failure_total",
            "provider" => provider.to_string(),
            "model" => model.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "kazamidori_provider_duration_seconds",
            "provider" => provider.to_string(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl ToolRuntimeHooks for MetricsObservabilityHooks {
    fn on_execution_start(&self, tool_call: &ToolCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "kazamidori_tool_execution_start_total",
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolResult,
        elapsed: Duration,
    ) {
        record_tool_outcome(tool_call, "success", elapsed);
    }

    fn on_soft_failure(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _diagnostic: &str,
        elapsed: Duration,
    ) {
        record_tool_outcome(tool_call, "soft_failure", elapsed);
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "kazamidori_tool_hard_error_total",
            "tool_name" => tool_call.name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        record_tool_outcome(tool_call, "failure", elapsed);
    }
}

fn record_tool_outcome(tool_call: &ToolCall, status: &'static str, elapsed: Duration) {
    metrics::counter!(
        "kazamidori_tool_execution_total",
        "tool_name" => tool_call.name.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "kazamidori_tool_execution_duration_seconds",
        "tool_name" => tool_call.name.clone(),
        "status" => status
    )
    .record(elapsed.as_secs_f64());
}

impl OrchestratorHooks for MetricsObservabilityHooks {
    fn on_request_start(&self, _user_id: &UserId, _thread_id: &ThreadId) {
        metrics::counter!("kazamidori_chat_request_total").increment(1);
    }

    fn on_tier_failure(&self, tier: TierKind, _model: &str, error: &ProviderError) {
        metrics::counter!(
            "kazamidori_chat_tier_failure_total",
            "tier" => tier.as_str(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }

    fn on_tier_fallback(&self, from: TierKind, to: TierKind, _error: &ProviderError) {
        metrics::counter!(
            "kazamidori_chat_tier_fallback_total",
            "from" => from.as_str(),
            "to" => to.as_str()
        )
        .increment(1);
    }

    fn on_tool_call(&self, tier: TierKind, tool_call: &ToolCall) {
        metrics::counter!(
            "kazamidori_chat_tool_call_total",
            "tier" => tier.as_str(),
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
    }

    fn on_ignored_function_calls(&self, tier: TierKind, ignored: &[ToolCall]) {
        metrics::counter!("kazamidori_chat_ignored_function_call_total", "tier" => tier.as_str())
            .increment(ignored.len() as u64);
    }

    fn on_unrecognized_part(&self, tier: TierKind, kind: &str) {
        metrics::counter!(
            "kazamidori_chat_unrecognized_part_total",
            "tier" => tier.as_str(),
            "part_kind" => kind.to_string()
        )
        .increment(1);
    }

    fn on_history_error(
        &self,
        operation: HistoryOperation,
        _user_id: &UserId,
        _thread_id: &ThreadId,
        error: &HistoryError,
    ) {
        metrics::counter!(
            "kazamidori_chat_history_error_total",
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }

    fn on_response_complete(
        &self,
        tier: TierKind,
        _model: &str,
        elapsed: Duration,
        _persisted: bool,
    ) {
        metrics::counter!("kazamidori_chat_response_total", "tier" => tier.as_str()).increment(1);
        metrics::histogram!(
            "kazamidori_chat_response_duration_seconds",
            "tier" => tier.as_str(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_request_failure(&self, error: &ChatError, elapsed: Duration) {
        metrics::counter!(
            "kazamidori_chat_request_failure_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "kazamidori_chat_response_duration_seconds",
            "tier" => "none",
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}
