//! Provider-agnostic request, response, and content model types.
//!
//! ```rust
//! use kprovider::{Content, ModelRequest, ProviderErrorKind};
//!
//! let ok = ModelRequest::new_validated("gemini-2.0-flash", vec![Content::user_text("hi")]);
//! assert!(ok.is_ok());
//!
//! let err = ModelRequest::new_validated("", vec![Content::user_text("hi")])
//!     .err()
//!     .expect("empty model should fail");
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//! ```

use std::fmt::{Display, Formatter};

use kcommon::GenerationOptions;
use serde_json::{Map, Value};

use crate::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Gemini,
    Ollama,
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        };

        f.write_str(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRole {
    User,
    Model,
    Function,
}

/// Function declaration advertised to the model. `parameters` is a JSON
/// schema object.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub args: Map<String, Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Sent back as `{name, response: {content}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionResponse {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    FunctionCall(ToolCall),
    FunctionResponse(FunctionResponse),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub role: ContentRole,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: ContentRole, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(ContentRole::User, vec![Part::Text(text.into())])
    }

    pub fn function_response(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(
            ContentRole::Function,
            vec![Part::FunctionResponse(FunctionResponse {
                name: name.into(),
                content: content.into(),
            })],
        )
    }

    /// Concatenated text of every text part.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePart {
    Text(String),
    FunctionCall(ToolCall),
    /// A part shape this crate does not model. `kind` names the wire field.
    Unsupported { kind: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub provider: ProviderId,
    pub model: String,
    pub parts: Vec<ResponsePart>,
}

impl ModelResponse {
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ResponsePart::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn function_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.parts.iter().filter_map(|part| match part {
            ResponsePart::FunctionCall(call) => Some(call),
            _ => None,
        })
    }

    /// The model turn as it must be replayed alongside the response to
    /// `dispatched`: its text parts plus that single call, in the position
    /// of the first call. Other calls and unsupported parts are dropped.
    pub fn to_model_content(&self, dispatched: &ToolCall) -> Content {
        let mut call_placed = false;
        let parts = self
            .parts
            .iter()
            .filter_map(|part| match part {
                ResponsePart::Text(text) => Some(Part::Text(text.clone())),
                ResponsePart::FunctionCall(_) if !call_placed => {
                    call_placed = true;
                    Some(Part::FunctionCall(dispatched.clone()))
                }
                ResponsePart::FunctionCall(_) | ResponsePart::Unsupported { .. } => None,
            })
            .collect();

        Content::new(ContentRole::Model, parts)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub contents: Vec<Content>,
    pub tools: Vec<ToolDefinition>,
    pub options: GenerationOptions,
}

impl ModelRequest {
    pub fn builder(model: impl Into<String>) -> ModelRequestBuilder {
        ModelRequestBuilder::new(model)
    }

    pub fn new(model: impl Into<String>, contents: Vec<Content>) -> Self {
        Self {
            model: model.into(),
            contents,
            tools: Vec::new(),
            options: GenerationOptions::default(),
        }
    }

    pub fn new_validated(
        model: impl Into<String>,
        contents: Vec<Content>,
    ) -> Result<Self, ProviderError> {
        let request = Self::new(model, contents);
        request.validate()?;
        Ok(request)
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Every text and function-response part flattened into one prompt
    /// string, for providers that only accept plain text.
    pub fn flatten_text(&self) -> String {
        let mut lines = Vec::new();
        for content in &self.contents {
            for part in &content.parts {
                match part {
                    Part::Text(text) => lines.push(text.clone()),
                    Part::FunctionResponse(response) => {
                        lines.push(format!("{} result: {}", response.name, response.content))
                    }
                    Part::FunctionCall(_) => {}
                }
            }
        }

        lines.join("\n")
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if self.contents.is_empty() {
            return Err(ProviderError::invalid_request(
                "at least one content turn is required",
            ));
        }

        if self.contents.iter().any(|content| content.parts.is_empty()) {
            return Err(ProviderError::invalid_request(
                "content turns must carry at least one part",
            ));
        }

        if let Some(max_output_tokens) = self.options.max_output_tokens
            && max_output_tokens == 0
        {
            return Err(ProviderError::invalid_request(
                "max_output_tokens must be greater than zero",
            ));
        }

        if let Some(temperature) = self.options.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(ProviderError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequestBuilder {
    model: String,
    contents: Vec<Content>,
    tools: Vec<ToolDefinition>,
    options: GenerationOptions,
}

impl ModelRequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            contents: Vec::new(),
            tools: Vec::new(),
            options: GenerationOptions::default(),
        }
    }

    pub fn content(mut self, content: Content) -> Self {
        self.contents.push(content);
        self
    }

    pub fn contents(mut self, contents: Vec<Content>) -> Self {
        self.contents.extend(contents);
        self
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.options.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<ModelRequest, ProviderError> {
        let request = ModelRequest {
            model: self.model,
            contents: self.contents,
            tools: self.tools,
            options: self.options,
        };

        request.validate()?;
        Ok(request)
    }
}
