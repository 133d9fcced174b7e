//! Tool trait contract for registry-managed capabilities.
//!
//! ```rust
//! use kprovider::ToolDefinition;
//! use ktooling::{FunctionTool, Tool, ToolResult};
//! use serde_json::json;
//!
//! let tool = FunctionTool::new(
//!     ToolDefinition::new("echo", "Echoes input", json!({"type": "object"})),
//!     |args, _ctx| async move { Ok(ToolResult::ok(format!("{args:?}"))) },
//! );
//!
//! assert_eq!(tool.definition().name, "echo");
//! ```

use std::future::Future;
use std::sync::Arc;

use kcommon::BoxFuture;
use kprovider::ToolDefinition;
use serde_json::{Map, Value};

use crate::{ToolError, ToolExecutionContext, ToolResult};

pub type ToolFuture<'a, T> = BoxFuture<'a, T>;

pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// Returns `Err` only for malformed calls. Downstream failures must be
    /// returned as a soft [`ToolResult`].
    fn invoke<'a>(
        &'a self,
        args: &'a Map<String, Value>,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>>;
}

type ToolHandler = dyn Fn(Map<String, Value>, ToolExecutionContext) -> ToolFuture<'static, Result<ToolResult, ToolError>>
    + Send
    + Sync;

pub struct FunctionTool {
    definition: ToolDefinition,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    pub fn new<F, Fut>(definition: ToolDefinition, handler: F) -> Self
    where
        F: Fn(Map<String, Value>, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolResult, ToolError>> + Send + 'static,
    {
        let handler: Arc<ToolHandler> =
            Arc::new(move |args, context| Box::pin(handler(args, context)));

        Self {
            definition,
            handler,
        }
    }
}

impl Tool for FunctionTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    fn invoke<'a>(
        &'a self,
        args: &'a Map<String, Value>,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
        (self.handler)(args.clone(), context.clone())
    }
}
