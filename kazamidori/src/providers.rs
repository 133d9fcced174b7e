//! Stable provider construction surface for facade consumers.

use std::sync::Arc;
use std::time::Duration;

use kprovider::{ModelProvider, ProviderError};
use reqwest::Client;

pub fn build_http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))
}

/// One Gemini provider serves both cloud tiers; the tier picks the model.
pub fn build_gemini_provider(
    api_key: impl Into<String>,
    http: Client,
) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    let api_key = api_key.into().trim().to_string();
    if api_key.is_empty() {
        return Err(ProviderError::authentication(
            "Gemini API key must not be empty",
        ));
    }

    gemini_provider(api_key, http)
}

pub fn build_ollama_provider(
    endpoint: impl Into<String>,
    model: impl Into<String>,
    http: Client,
) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    let endpoint = endpoint.into();
    let model = model.into();
    if model.trim().is_empty() {
        return Err(ProviderError::invalid_request(
            "Ollama model name must not be empty",
        ));
    }

    ollama_provider(endpoint, model, http)
}

#[cfg(feature = "provider-gemini")]
fn gemini_provider(api_key: String, http: Client) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    use kprovider::adapters::gemini::{GeminiHttpTransport, GeminiProvider};

    let transport = Arc::new(GeminiHttpTransport::new(http));
    Ok(Arc::new(GeminiProvider::new(api_key, transport)))
}

#[cfg(not(feature = "provider-gemini"))]
fn gemini_provider(
    _api_key: String,
    _http: Client,
) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    Err(ProviderError::invalid_request(
        "provider-gemini feature is not enabled on kazamidori",
    ))
}

#[cfg(feature = "provider-ollama")]
fn ollama_provider(
    endpoint: String,
    model: String,
    http: Client,
) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    use kprovider::adapters::ollama::{OllamaHttpTransport, OllamaProvider};

    let transport = Arc::new(OllamaHttpTransport::new(http).with_endpoint(endpoint));
    Ok(Arc::new(OllamaProvider::new(transport, model)))
}

#[cfg(not(feature = "provider-ollama"))]
fn ollama_provider(
    _endpoint: String,
    _model: String,
    _http: Client,
) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    Err(ProviderError::invalid_request(
        "provider-ollama feature is not enabled on kazamidori",
    ))
}
