//! Gemini adapter types and provider-agnostic conversion logic.

use kcommon::GenerationOptions;

use crate::{Content, ModelRequest, ModelResponse, ProviderId, ResponsePart, ToolDefinition};

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiRequest {
    pub model: String,
    pub contents: Vec<Content>,
    pub tools: Vec<ToolDefinition>,
    pub options: GenerationOptions,
}

impl From<ModelRequest> for GeminiRequest {
    fn from(value: ModelRequest) -> Self {
        Self {
            model: value.model,
            contents: value.contents,
            tools: value.tools,
            options: value.options,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiResponse {
    pub model: String,
    pub parts: Vec<ResponsePart>,
    pub finish_reason: Option<String>,
}

impl GeminiResponse {
    pub fn into_model_response(self) -> ModelResponse {
        ModelResponse {
            provider: ProviderId::Gemini,
            model: self.model,
            parts: self.parts,
        }
    }
}
