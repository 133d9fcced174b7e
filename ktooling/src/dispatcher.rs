//! Tool dispatcher trait and default registry-backed implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_timer::Delay;
use futures_util::future::{Either, select};
use kprovider::{ToolCall, ToolDefinition};

use crate::{
    NoopToolRuntimeHooks, ToolError, ToolExecutionContext, ToolFuture, ToolRegistry, ToolResult,
    ToolRuntimeHooks,
};

pub trait ToolDispatcher: Send + Sync {
    /// Declarations advertised to the model.
    fn definitions(&self) -> Vec<ToolDefinition>;

    fn dispatch<'a>(
        &'a self,
        tool_call: &'a ToolCall,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>>;
}

#[derive(Clone)]
pub struct DefaultToolDispatcher {
    registry: Arc<ToolRegistry>,
    hooks: Arc<dyn ToolRuntimeHooks>,
    timeout: Option<Duration>,
}

impl DefaultToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopToolRuntimeHooks),
            timeout: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Bounds each dispatch. Expiry is a soft failure, not an error.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    async fn run_tool(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
    ) -> Result<ToolResult, ToolError> {
        let tool = self.registry.get(&tool_call.name).ok_or_else(|| {
            ToolError::not_found(format!("tool '{}' is not registered", tool_call.name))
        })?;

        let invocation = tool.invoke(&tool_call.args, context);
        let Some(timeout) = self.timeout else {
            return invocation.await;
        };

        match select(invocation, Box::pin(Delay::new(timeout))).await {
            Either::Left((result, _)) => result,
            Either::Right(_) => Ok(ToolResult::soft_failure(
                format!(
                    "Sorry, the {} lookup took too long and was cancelled.",
                    tool_call.name
                ),
                format!("timed out after {}ms", timeout.as_millis()),
            )),
        }
    }
}

impl std::fmt::Debug for DefaultToolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultToolDispatcher")
            .field("registry", &self.registry)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ToolDispatcher for DefaultToolDispatcher {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    fn dispatch<'a>(
        &'a self,
        tool_call: &'a ToolCall,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
        Box::pin(async move {
            self.hooks.on_execution_start(tool_call, context);
            let started = Instant::now();

            let result = self
                .run_tool(tool_call, context)
                .await
                .map_err(|error| error.with_tool_name(tool_call.name.clone()));

            let elapsed = started.elapsed();
            match &result {
                Ok(output) => match &output.failure {
                    Some(diagnostic) => {
                        self.hooks
                            .on_soft_failure(tool_call, context, diagnostic, elapsed)
                    }
                    None => self
                        .hooks
                        .on_execution_success(tool_call, context, output, elapsed),
                },
                Err(error) => self
                    .hooks
                    .on_execution_failure(tool_call, context, error, elapsed),
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use kprovider::ToolDefinition;
    use serde_json::{Map, Value, json};

    use super::*;
    use crate::{Tool, ToolErrorKind, required_string};

    #[derive(Debug)]
    struct EchoTool;

    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(
                "echo",
                "Echoes the text argument",
                json!({"type": "object"}),
            )
        }

        fn invoke<'a>(
            &'a self,
            args: &'a Map<String, Value>,
            context: &'a ToolExecutionContext,
        ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
            Box::pin(async move {
                let text = required_string(args, "text")?;
                Ok(ToolResult::ok(format!("user={} text={text}", context.user_id)))
            })
        }
    }

    #[derive(Debug)]
    struct FlakyUpstreamTool;

    impl Tool for FlakyUpstreamTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("flaky", "Upstream always fails", json!({"type": "object"}))
        }

        fn invoke<'a>(
            &'a self,
            _args: &'a Map<String, Value>,
            _context: &'a ToolExecutionContext,
        ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
            Box::pin(async move {
                Ok(ToolResult::soft_failure(
                    "Sorry, that service is down.",
                    "connection refused",
                ))
            })
        }
    }

    #[derive(Debug)]
    struct StalledTool;

    impl Tool for StalledTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("stalled", "Never answers", json!({"type": "object"}))
        }

        fn invoke<'a>(
            &'a self,
            _args: &'a Map<String, Value>,
            _context: &'a ToolExecutionContext,
        ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
            Box::pin(async move {
                Delay::new(Duration::from_secs(30)).await;
                Ok(ToolResult::ok("too late"))
            })
        }
    }

    #[derive(Default)]
    struct RecordingHooks {
        events: Mutex<Vec<String>>,
    }

    impl ToolRuntimeHooks for RecordingHooks {
        fn on_execution_start(&self, tool_call: &ToolCall, _context: &ToolExecutionContext) {
            self.push(format!("start:{}", tool_call.name));
        }

        fn on_execution_success(
            &self,
            tool_call: &ToolCall,
            _context: &ToolExecutionContext,
            _result: &ToolResult,
            _elapsed: Duration,
        ) {
            self.push(format!("success:{}", tool_call.name));
        }

        fn on_soft_failure(
            &self,
            tool_call: &ToolCall,
            _context: &ToolExecutionContext,
            diagnostic: &str,
            _elapsed: Duration,
        ) {
            self.push(format!("soft:{}:{diagnostic}", tool_call.name));
        }

        fn on_execution_failure(
            &self,
            tool_call: &ToolCall,
            _context: &ToolExecutionContext,
            error: &ToolError,
            _elapsed: Duration,
        ) {
            self.push(format!("failure:{}:{:?}", tool_call.name, error.kind));
        }
    }

    impl RecordingHooks {
        fn push(&self, event: String) {
            self.events.lock().expect("events lock").push(event);
        }
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall::new(name, args.as_object().cloned().expect("object args"))
    }

    fn dispatcher_with(hooks: Arc<RecordingHooks>) -> DefaultToolDispatcher {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        registry.register(FlakyUpstreamTool);
        registry.register(StalledTool);
        DefaultToolDispatcher::new(Arc::new(registry)).with_hooks(hooks)
    }

    #[tokio::test]
    async fn dispatch_runs_registered_tool() {
        let hooks = Arc::new(RecordingHooks::default());
        let dispatcher = dispatcher_with(hooks.clone());

        let result = dispatcher
            .dispatch(
                &call("echo", json!({"text": "hello"})),
                &ToolExecutionContext::new("user-1", "thread-1"),
            )
            .await
            .expect("dispatch should succeed");

        assert_eq!(result, ToolResult::ok("user=user-1 text=hello"));
        assert_eq!(
            *hooks.events.lock().expect("events lock"),
            vec!["start:echo".to_string(), "success:echo".to_string()]
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_a_hard_error() {
        let hooks = Arc::new(RecordingHooks::default());
        let dispatcher = dispatcher_with(hooks.clone());

        let error = dispatcher
            .dispatch(
                &call("getTides", json!({})),
                &ToolExecutionContext::new("user-1", "thread-1"),
            )
            .await
            .expect_err("unknown tool should fail");

        assert_eq!(error.kind, ToolErrorKind::NotFound);
        assert_eq!(error.tool_name.as_deref(), Some("getTides"));
        assert!(
            hooks
                .events
                .lock()
                .expect("events lock")
                .contains(&"failure:getTides:NotFound".to_string())
        );
    }

    #[tokio::test]
    async fn malformed_arguments_are_a_hard_error() {
        let dispatcher = dispatcher_with(Arc::new(RecordingHooks::default()));

        let error = dispatcher
            .dispatch(
                &call("echo", json!({"text": 42})),
                &ToolExecutionContext::new("user-1", "thread-1"),
            )
            .await
            .expect_err("bad args should fail");

        assert_eq!(error.kind, ToolErrorKind::InvalidArguments);
    }

    #[tokio::test]
    async fn downstream_failure_stays_soft() {
        let hooks = Arc::new(RecordingHooks::default());
        let dispatcher = dispatcher_with(hooks.clone());

        let result = dispatcher
            .dispatch(
                &call("flaky", json!({})),
                &ToolExecutionContext::new("user-1", "thread-1"),
            )
            .await
            .expect("soft failures are not errors");

        assert_eq!(result.content, "Sorry, that service is down.");
        assert!(result.is_soft_failure());
        assert!(
            hooks
                .events
                .lock()
                .expect("events lock")
                .contains(&"soft:flaky:connection refused".to_string())
        );
    }

    #[tokio::test]
    async fn timeout_is_reported_as_soft_failure() {
        let dispatcher = dispatcher_with(Arc::new(RecordingHooks::default()))
            .with_timeout(Duration::from_millis(20));

        let result = dispatcher
            .dispatch(
                &call("stalled", json!({})),
                &ToolExecutionContext::new("user-1", "thread-1"),
            )
            .await
            .expect("timeouts are soft");

        assert!(result.is_soft_failure());
        assert!(result.content.contains("stalled"));
    }

    #[test]
    fn definitions_come_from_registry_in_name_order() {
        let dispatcher = dispatcher_with(Arc::new(RecordingHooks::default()));
        let names = dispatcher
            .definitions()
            .into_iter()
            .map(|definition| definition.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["echo", "flaky", "stalled"]);
    }
}
