//! Tool declarations, registry, and dispatch with hard and soft failures.
//!
//! A dispatched tool never fails because an external lookup broke: that
//! becomes a soft [`ToolResult`] with apology text. Only malformed calls
//! (unknown tool, bad arguments) surface as a [`ToolError`].

mod args;
mod dispatcher;
mod error;
mod hooks;
mod registry;
mod tool;
pub mod tools;
mod types;

pub mod prelude {
    pub use crate::{
        DefaultToolDispatcher, FunctionTool, NoopToolRuntimeHooks, Tool, ToolDispatcher,
        ToolError, ToolErrorKind, ToolExecutionContext, ToolFuture, ToolRegistry, ToolResult,
        ToolRuntimeHooks,
    };
}

pub use args::{required_string, string_parameters};
pub use dispatcher::{DefaultToolDispatcher, ToolDispatcher};
pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
pub use registry::ToolRegistry;
pub use tool::{FunctionTool, Tool, ToolFuture};
pub use types::{ToolExecutionContext, ToolResult};
