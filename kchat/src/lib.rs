//! Response orchestration over a fallback chain of model providers.
//!
//! A request walks the configured tiers (primary, secondary, local
//! fallback), runs at most one tool round trip on the tier that answered,
//! and writes the turn pair back to history.

mod error;
mod hooks;
mod orchestrator;
mod prompt;
mod tiers;
mod types;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, HistoryOperation, NoopOrchestratorHooks, OrchestratorHooks,
        PromptAssembler, ProviderTier, ResponseOrchestrator, ResponseOrchestratorBuilder,
        ResponseOutcome, ResponseRequest, TierFailure, TierKind,
    };
    pub use kcommon::{ThreadId, UserId};
    pub use kmemory::{ConversationTurn, HistoryStore};
    pub use ktooling::{DefaultToolDispatcher, ToolDispatcher, ToolRegistry};
}

pub use error::{ChatError, ChatErrorKind, TierFailure};
pub use hooks::{HistoryOperation, NoopOrchestratorHooks, OrchestratorHooks};
pub use orchestrator::{
    FUNCTION_RESPONSE_CHAR_LIMIT, ResponseOrchestrator, ResponseOrchestratorBuilder,
};
pub use prompt::{PromptAssembler, render_tool_instructions};
pub use tiers::{DEFAULT_PROVIDER_TIMEOUT, ProviderTier, TierKind};
pub use types::{ResponseOutcome, ResponseRequest};
