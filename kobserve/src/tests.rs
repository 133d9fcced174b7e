use std::sync::{Arc, Mutex};
use std::time::Duration;

use kchat::{ChatError, HistoryOperation, OrchestratorHooks, TierFailure, TierKind};
use kcommon::{ThreadId, UserId};
use kmemory::HistoryError;
use kprovider::{ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ktooling::{ToolError, ToolExecutionContext, ToolResult, ToolRuntimeHooks};
use serde_json::Map;

use crate::{
    MetricsObservabilityHooks, SafeOrchestratorHooks, SafeProviderHooks, SafeToolHooks,
    TracingObservabilityHooks,
};

fn sample_tool_call() -> ToolCall {
    ToolCall::new("getWeather", Map::new())
}

fn sample_tool_context() -> ToolExecutionContext {
    ToolExecutionContext::new("user-1", "thread-1").with_metadata("username", "alice")
}

fn sample_chat_error() -> ChatError {
    ChatError::chain_exhausted(vec![TierFailure::new(
        TierKind::Primary,
        "gemini-2.0-flash",
        ProviderError::rate_limited("quota"),
    )])
}

fn exercise_provider_hooks(hooks: &dyn ProviderOperationHooks) {
    let error = ProviderError::timeout("provider timeout");
    hooks.on_attempt_start(ProviderId::Gemini, "gemini-2.0-flash");
    hooks.on_success(ProviderId::Gemini, "gemini-2.0-flash", Duration::from_millis(10));
    hooks.on_failure(
        ProviderId::Ollama,
        "llama3.2",
        &error,
        Duration::from_millis(10),
    );
}

fn exercise_tool_hooks(hooks: &dyn ToolRuntimeHooks) {
    let call = sample_tool_call();
    let context = sample_tool_context();
    hooks.on_execution_start(&call, &context);
    hooks.on_execution_success(
        &call,
        &context,
        &ToolResult::ok("sunny"),
        Duration::from_millis(20),
    );
    hooks.on_soft_failure(&call, &context, "http 503", Duration::from_millis(20));
    hooks.on_execution_failure(
        &call,
        &context,
        &ToolError::invalid_arguments("missing location"),
        Duration::from_millis(20),
    );
}

fn exercise_chat_hooks(hooks: &dyn OrchestratorHooks) {
    let user = UserId::from("user-1");
    let thread = ThreadId::from("thread-1");
    let quota = ProviderError::rate_limited("quota");

    hooks.on_request_start(&user, &thread);
    hooks.on_tier_failure(TierKind::Primary, "gemini-2.5-pro", &quota);
    hooks.on_tier_fallback(TierKind::Primary, TierKind::Secondary, &quota);
    hooks.on_tool_call(TierKind::Secondary, &sample_tool_call());
    hooks.on_ignored_function_calls(TierKind::Secondary, &[sample_tool_call()]);
    hooks.on_unrecognized_part(TierKind::Secondary, "executableCode");
    hooks.on_history_error(
        HistoryOperation::Write,
        &user,
        &thread,
        &HistoryError::storage("disk full"),
    );
    hooks.on_response_complete(
        TierKind::Secondary,
        "gemini-2.0-flash",
        Duration::from_millis(30),
        true,
    );
    hooks.on_request_failure(&sample_chat_error(), Duration::from_millis(30));
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    exercise_provider_hooks(&TracingObservabilityHooks);
    exercise_tool_hooks(&TracingObservabilityHooks);
    exercise_chat_hooks(&TracingObservabilityHooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    exercise_provider_hooks(&MetricsObservabilityHooks);
    exercise_tool_hooks(&MetricsObservabilityHooks);
    exercise_chat_hooks(&MetricsObservabilityHooks);
}

#[derive(Default, Clone)]
struct Recorder {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl Recorder {
    fn push(&self, event: &'static str) {
        self.events.lock().expect("events lock").push(event);
    }

    fn count(&self) -> usize {
        self.events.lock().expect("events lock").len()
    }
}

impl ProviderOperationHooks for Recorder {
    fn on_attempt_start(&self, _provider: ProviderId, _model: &str) {
        self.push("attempt_start");
    }

    fn on_success(&self, _provider: ProviderId, _model: &str, _elapsed: Duration) {
        self.push("success");
    }

    fn on_failure(
        &self,
        _provider: ProviderId,
        _model: &str,
        _error: &ProviderError,
        _elapsed: Duration,
    ) {
        self.push("failure");
    }
}

impl ToolRuntimeHooks for Recorder {
    fn on_execution_start(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {
        self.push("start");
    }

    fn on_execution_success(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolResult,
        _elapsed: Duration,
    ) {
        self.push("success");
    }

    fn on_soft_failure(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _diagnostic: &str,
        _elapsed: Duration,
    ) {
        self.push("soft_failure");
    }

    fn on_execution_failure(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
        self.push("failure");
    }
}

impl OrchestratorHooks for Recorder {
    fn on_tier_fallback(&self, _from: TierKind, _to: TierKind, _error: &ProviderError) {
        self.push("fallback");
    }

    fn on_history_error(
        &self,
        _operation: HistoryOperation,
        _user_id: &UserId,
        _thread_id: &ThreadId,
        _error: &HistoryError,
    ) {
        self.push("history_error");
    }

    fn on_request_failure(&self, _error: &ChatError, _elapsed: Duration) {
        self.push("request_failure");
    }
}

struct Panicker;

impl ProviderOperationHooks for Panicker {
    fn on_attempt_start(&self, _provider: ProviderId, _model: &str) {
        panic!("attempt_start panic");
    }

    fn on_success(&self, _provider: ProviderId, _model: &str, _elapsed: Duration) {
        panic!("success panic");
    }

    fn on_failure(
        &self,
        _provider: ProviderId,
        _model: &str,
        _error: &ProviderError,
        _elapsed: Duration,
    ) {
        panic!("failure panic");
    }
}

impl ToolRuntimeHooks for Panicker {
    fn on_execution_start(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {
        panic!("start panic");
    }

    fn on_soft_failure(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _diagnostic: &str,
        _elapsed: Duration,
    ) {
        panic!("soft failure panic");
    }
}

impl OrchestratorHooks for Panicker {
    fn on_tier_fallback(&self, _from: TierKind, _to: TierKind, _error: &ProviderError) {
        panic!("fallback panic");
    }

    fn on_history_error(
        &self,
        _operation: HistoryOperation,
        _user_id: &UserId,
        _thread_id: &ThreadId,
        _error: &HistoryError,
    ) {
        panic!("history panic");
    }
}

#[test]
fn safe_wrappers_delegate_when_inner_succeeds() {
    let recorder = Recorder::default();

    exercise_provider_hooks(&SafeProviderHooks::new(recorder.clone()));
    assert_eq!(recorder.count(), 3);

    exercise_tool_hooks(&SafeToolHooks::new(recorder.clone()));
    assert_eq!(recorder.count(), 7);

    exercise_chat_hooks(&SafeOrchestratorHooks::new(recorder.clone()));
    assert_eq!(recorder.count(), 10);
}

#[test]
fn safe_wrappers_swallow_panics() {
    exercise_provider_hooks(&SafeProviderHooks::new(Panicker));
    exercise_tool_hooks(&SafeToolHooks::new(Panicker));
    exercise_chat_hooks(&SafeOrchestratorHooks::new(Panicker));
}
