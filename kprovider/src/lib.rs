//! Provider abstraction for the response core: shared content model, error
//! classification, deadlines, and the Gemini and Ollama adapters.

pub mod adapters;
mod credentials;
mod error;
mod model;
mod provider;
mod resilience;

pub mod prelude {
    pub use crate::{
        Content, ContentRole, FunctionResponse, ModelProvider, ModelRequest, ModelRequestBuilder,
        ModelResponse, NoopOperationHooks, Part, ProviderError, ProviderErrorKind, ProviderFuture,
        ProviderId, ProviderOperationHooks, ResponsePart, ToolCall, ToolDefinition,
        execute_with_deadline,
    };
    pub use kcommon::{BoxFuture, GenerationOptions, MetadataMap};
}

pub use credentials::SecretString;
pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    Content, ContentRole, FunctionResponse, ModelRequest, ModelRequestBuilder, ModelResponse,
    Part, ProviderId, ResponsePart, ToolCall, ToolDefinition,
};
pub use provider::{ModelProvider, ProviderFuture};
pub use resilience::{NoopOperationHooks, ProviderOperationHooks, execute_with_deadline};
