//! Unified facade over the kazamidori workspace crates.
//!
//! Applications depend on this crate alone: it re-exports the response
//! core and adds `model.json` configuration, logging bootstrap, and runtime
//! wiring from configuration to a ready [`ResponseOrchestrator`].
//!
//! ```rust,no_run
//! use kazamidori::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! init_logging();
//! let config = ModelConfig::load("json/model.json")?;
//! let runtime = build_runtime(&config, RuntimeOptions::from_env())?;
//!
//! let request = runtime.request("user-1", "thread-1", "alice", "Will it rain in Tokyo?");
//! let outcome = runtime.orchestrator.get_response(request).await?;
//! println!("{} ({})", outcome.text, outcome.model_name);
//!
//! runtime.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod logging;

pub mod prelude;
pub mod providers;
pub mod runtime;

pub use kchat;
pub use kcommon;
pub use kmemory;
pub use kobserve;
pub use kprovider;
pub use ktooling;

pub use kchat::{
    ChatError, ChatErrorKind, HistoryOperation, NoopOrchestratorHooks, OrchestratorHooks,
    PromptAssembler, ProviderTier, ResponseOrchestrator, ResponseOrchestratorBuilder,
    ResponseOutcome, ResponseRequest, TierFailure, TierKind,
};
pub use kcommon::{BoxFuture, GenerationOptions, ThreadId, UserId};
pub use kmemory::{
    ConversationTurn, HistoryBackendConfig, HistoryError, HistoryErrorKind, HistoryStore,
    InMemoryHistoryStore, SqliteHistoryStore, TurnRole, create_history_store,
};
pub use kobserve::{
    MetricsObservabilityHooks, SafeOrchestratorHooks, SafeProviderHooks, SafeToolHooks,
    TracingObservabilityHooks,
};
pub use kprovider::{
    ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderErrorKind, ProviderId,
    ProviderOperationHooks, SecretString, ToolCall, ToolDefinition,
};
pub use ktooling::{
    DefaultToolDispatcher, Tool, ToolDispatcher, ToolError, ToolErrorKind, ToolExecutionContext,
    ToolRegistry, ToolResult, ToolRuntimeHooks,
};

pub use config::{
    AboutConfig, CUSTOM_PROMPTS_FILE_NAME, ConfigError, ConfigErrorKind, CustomPrompts,
    DEFAULT_OLLAMA_ENDPOINT, DEFAULT_PROMPT_KEY, MODEL_CONFIG_FILE_NAME, ModelConfig,
    OllamaConfig, TimeoutConfig, resolve_system_prompt,
};
pub use logging::{DEFAULT_LOG_FILTER, init_logging};
pub use providers::{build_gemini_provider, build_http_client, build_ollama_provider};
pub use runtime::{
    GEMINI_API_KEY_ENV, RuntimeBundle, RuntimeError, RuntimeErrorKind, RuntimeOptions,
    RuntimeProviders, build_runtime, build_runtime_with, default_tool_registry, weather_client,
};
