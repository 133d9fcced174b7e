//! Gemini provider implementation over transport and shared models.

use std::sync::Arc;

use crate::{
    ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderFuture, ProviderId,
    SecretString,
};

use super::transport::GeminiTransport;
use super::types::GeminiRequest;

#[derive(Clone)]
pub struct GeminiProvider {
    api_key: Arc<SecretString>,
    transport: Arc<dyn GeminiTransport>,
    fallback_model: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<SecretString>, transport: Arc<dyn GeminiTransport>) -> Self {
        Self {
            api_key: Arc::new(api_key.into()),
            transport,
            fallback_model: "gemini-2.0-flash".to_string(),
        }
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    pub(crate) fn build_gemini_request(
        &self,
        mut request: ModelRequest,
    ) -> Result<GeminiRequest, ProviderError> {
        if request.model.trim().is_empty() {
            request.model = self.fallback_model.clone();
        }

        request.validate()?;
        Ok(GeminiRequest::from(request))
    }
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &self.api_key)
            .field("transport", &self.transport)
            .field("fallback_model", &self.fallback_model)
            .finish()
    }
}

impl ModelProvider for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn invoke<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                return Err(ProviderError::authentication(
                    "Gemini API key must not be empty",
                ));
            }

            let gemini_request = self.build_gemini_request(request)?;
            let response = self
                .transport
                .generate_content(gemini_request, &self.api_key)
                .await?;
            Ok(response.into_model_response())
        })
    }
}
