//! Ollama local fallback provider over the `/api/generate` NDJSON stream.

use std::sync::Arc;

use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderFuture, ProviderId,
    ResponsePart,
};

pub const OLLAMA_GENERATE_URL: &str = "http://localhost:11434/api/generate";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OllamaRequest {
    pub model: String,
    pub prompt: String,
}

pub trait OllamaTransport: Send + Sync + std::fmt::Debug {
    /// Sends one generate request and returns the concatenated response text.
    fn generate<'a>(
        &'a self,
        request: OllamaRequest,
    ) -> ProviderFuture<'a, Result<String, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct OllamaHttpTransport {
    client: Client,
    endpoint: String,
}

impl OllamaHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            endpoint: OLLAMA_GENERATE_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl OllamaTransport for OllamaHttpTransport {
    fn generate<'a>(
        &'a self,
        request: OllamaRequest,
    ) -> ProviderFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            if self.endpoint.trim().is_empty() {
                return Err(ProviderError::invalid_request(
                    "Ollama endpoint must not be empty",
                ));
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(&request)
                .send()
                .await
                .map_err(map_reqwest_error)?;

            if !response.status().is_success() {
                let code = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::unavailable(format!(
                    "Ollama returned http {code}: {}",
                    truncate(&body, 4096)
                )));
            }

            let chunks = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(map_reqwest_error));
            collect_ndjson_response(chunks).await
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(err.to_string())
    } else {
        ProviderError::transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Reads newline-delimited JSON chunks, concatenating each `response` field
/// until a chunk reports `done`. Lines that are not valid chunks are skipped.
pub async fn collect_ndjson_response<S, B>(stream: S) -> Result<String, ProviderError>
where
    S: Stream<Item = Result<B, ProviderError>>,
    B: AsRef<[u8]>,
{
    let mut stream = std::pin::pin!(stream);
    let mut buffer: Vec<u8> = Vec::new();
    let mut output = String::new();

    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(chunk?.as_ref());

        while let Some(newline) = buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = buffer.drain(..=newline).collect();
            if apply_line(&line, &mut output) {
                return Ok(output);
            }
        }
    }

    apply_line(&buffer, &mut output);
    Ok(output)
}

/// Returns true once the stream reports completion.
fn apply_line(line: &[u8], output: &mut String) -> bool {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return false;
    }

    match serde_json::from_str::<OllamaChunk>(line) {
        Ok(chunk) => {
            output.push_str(&chunk.response);
            chunk.done
        }
        Err(_) => false,
    }
}

fn truncate(input: &str, max: usize) -> String {
    match input.char_indices().nth(max) {
        Some((index, _)) => format!("{}...", &input[..index]),
        None => input.to_string(),
    }
}

/// Text-only provider. Tool declarations are never sent and the whole
/// conversation is flattened into a single prompt.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    transport: Arc<dyn OllamaTransport>,
    model: String,
}

impl OllamaProvider {
    pub fn new(transport: Arc<dyn OllamaTransport>, model: impl Into<String>) -> Self {
        Self {
            transport,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: &ModelRequest) -> Result<OllamaRequest, ProviderError> {
        let model = if request.model.trim().is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        if model.trim().is_empty() {
            return Err(ProviderError::invalid_request(
                "Ollama model name must not be empty",
            ));
        }

        Ok(OllamaRequest {
            model,
            prompt: request.flatten_text(),
        })
    }
}

impl ModelProvider for OllamaProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn supports_tools(&self) -> bool {
        false
    }

    fn invoke<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            let ollama_request = self.build_request(&request)?;
            let model = ollama_request.model.clone();
            let text = self.transport.generate(ollama_request).await?;

            Ok(ModelResponse {
                provider: ProviderId::Ollama,
                model,
                parts: vec![ResponsePart::Text(text)],
            })
        })
    }
}
