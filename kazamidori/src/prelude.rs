//! Common imports for most kazamidori applications.

pub use crate::{
    CustomPrompts, ModelConfig, RuntimeBundle, RuntimeError, RuntimeOptions, RuntimeProviders,
    build_runtime, build_runtime_with, default_tool_registry, init_logging,
    resolve_system_prompt,
};
pub use crate::{
    ChatError, ChatErrorKind, ConversationTurn, HistoryBackendConfig, HistoryStore,
    ModelProvider, OrchestratorHooks, ProviderError, ProviderTier, ResponseOrchestrator,
    ResponseOutcome, ResponseRequest, ThreadId, TierKind, ToolRegistry, TurnRole, UserId,
};
