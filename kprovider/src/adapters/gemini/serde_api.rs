//! Gemini `generateContent` payload serde models and conversion helpers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ContentRole, Part, ProviderError, ResponsePart, ToolCall};

use super::types::{GeminiRequest, GeminiResponse};

pub(crate) fn build_api_request(request: GeminiRequest) -> Result<GeminiApiRequest, ProviderError> {
    if request.contents.is_empty() {
        return Err(ProviderError::invalid_request(
            "Gemini request requires at least one content turn",
        ));
    }

    let contents = request
        .contents
        .into_iter()
        .map(|content| GeminiApiContent {
            role: role_to_str(content.role).to_string(),
            parts: content.parts.into_iter().map(GeminiApiPart::from).collect(),
        })
        .collect();

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(vec![GeminiApiTool {
            function_declarations: request
                .tools
                .into_iter()
                .map(|tool| GeminiApiFunctionDeclaration {
                    name: tool.name,
                    description: tool.description,
                    parameters: tool.parameters,
                })
                .collect(),
        }])
    };

    let generation_config = if request.options.temperature.is_none()
        && request.options.max_output_tokens.is_none()
    {
        None
    } else {
        Some(GeminiApiGenerationConfig {
            temperature: request.options.temperature,
            max_output_tokens: request.options.max_output_tokens,
        })
    };

    Ok(GeminiApiRequest {
        contents,
        tools,
        generation_config,
    })
}

pub(crate) fn parse_api_response(model: String, response: GeminiApiResponse) -> GeminiResponse {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return GeminiResponse {
            model: response.model_version.unwrap_or(model),
            parts: Vec::new(),
            finish_reason: None,
        };
    };

    let parts = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .map(GeminiApiResponsePart::into_response_part)
        .collect();

    GeminiResponse {
        model: response.model_version.unwrap_or(model),
        parts,
        finish_reason: candidate.finish_reason,
    }
}

/// Returns `(message, status)` from a Gemini error envelope.
pub(crate) fn extract_error(body: &str) -> Option<(String, Option<String>)> {
    let parsed = serde_json::from_str::<GeminiApiErrorEnvelope>(body).ok()?;
    Some((parsed.error.message, parsed.error.status))
}

fn role_to_str(role: ContentRole) -> &'static str {
    match role {
        ContentRole::User => "user",
        ContentRole::Model => "model",
        ContentRole::Function => "function",
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiApiErrorEnvelope {
    pub error: GeminiApiError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiApiError {
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiRequest {
    pub contents: Vec<GeminiApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<GeminiApiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiApiGenerationConfig>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GeminiApiContent {
    pub role: String,
    pub parts: Vec<GeminiApiPart>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<GeminiApiFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_response: Option<GeminiApiFunctionResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiApiResponseContent {
    #[serde(default)]
    pub parts: Vec<GeminiApiResponsePart>,
}

/// Known fields are lifted out; anything else lands in `other` so an
/// unrecognized part can still be named.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub function_call: Option<GeminiApiFunctionCall>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl GeminiApiResponsePart {
    fn into_response_part(self) -> ResponsePart {
        if let Some(call) = self.function_call {
            return ResponsePart::FunctionCall(ToolCall::new(call.name, call.args));
        }

        if let Some(text) = self.text {
            return ResponsePart::Text(text);
        }

        let kind = self
            .other
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(|| "empty".to_string());

        ResponsePart::Unsupported { kind }
    }
}

impl From<Part> for GeminiApiPart {
    fn from(value: Part) -> Self {
        match value {
            Part::Text(text) => Self {
                text: Some(text),
                ..Self::default()
            },
            Part::FunctionCall(call) => Self {
                function_call: Some(GeminiApiFunctionCall {
                    name: call.name,
                    args: call.args,
                }),
                ..Self::default()
            },
            Part::FunctionResponse(response) => Self {
                function_response: Some(GeminiApiFunctionResponse {
                    name: response.name,
                    response: GeminiApiFunctionResponseBody {
                        content: response.content,
                    },
                }),
                ..Self::default()
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GeminiApiFunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GeminiApiFunctionResponse {
    pub name: String,
    pub response: GeminiApiFunctionResponseBody,
}

#[derive(Debug, Serialize)]
pub(crate) struct GeminiApiFunctionResponseBody {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiTool {
    pub function_declarations: Vec<GeminiApiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GeminiApiFunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiApiCandidate>,
    #[serde(default)]
    pub model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiCandidate {
    #[serde(default)]
    pub content: Option<GeminiApiResponseContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}
