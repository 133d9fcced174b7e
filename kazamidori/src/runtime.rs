//! Runtime wiring from `model.json` to a ready response orchestrator.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use chrono::{Local, SecondsFormat};
use kchat::{ChatError, ProviderTier, ResponseOrchestrator, ResponseRequest};
use kcommon::{ThreadId, UserId};
use kmemory::{HistoryBackendConfig, HistoryError, HistoryStore, create_history_store};
use kobserve::{SafeOrchestratorHooks, SafeProviderHooks, SafeToolHooks, TracingObservabilityHooks};
use kprovider::{ModelProvider, ProviderError};
use ktooling::tools::url_reader::{HttpPageFetcher, UrlReaderTool};
use ktooling::tools::weather::{ZutoolClient, register_weather_tools};
use ktooling::{DefaultToolDispatcher, ToolError, ToolRegistry};

use crate::config::{ConfigError, CustomPrompts, ModelConfig, resolve_system_prompt};
use crate::providers::{build_gemini_provider, build_http_client, build_ollama_provider};

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    Config,
    Provider,
    History,
    Tooling,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RuntimeError {}

impl From<ConfigError> for RuntimeError {
    fn from(value: ConfigError) -> Self {
        Self::new(RuntimeErrorKind::Config, value.to_string())
    }
}

impl From<ProviderError> for RuntimeError {
    fn from(value: ProviderError) -> Self {
        Self::new(RuntimeErrorKind::Provider, value.to_string())
    }
}

impl From<HistoryError> for RuntimeError {
    fn from(value: HistoryError) -> Self {
        Self::new(RuntimeErrorKind::History, value.to_string())
    }
}

impl From<ToolError> for RuntimeError {
    fn from(value: ToolError) -> Self {
        Self::new(RuntimeErrorKind::Tooling, value.to_string())
    }
}

impl From<ChatError> for RuntimeError {
    fn from(value: ChatError) -> Self {
        Self::new(RuntimeErrorKind::Chat, value.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    pub gemini_api_key: Option<String>,
    pub history: HistoryBackendConfig,
    pub weather_base_url: Option<String>,
}

impl RuntimeOptions {
    /// Reads `GEMINI_API_KEY`; the history path honours the `KAZAMIDORI_*`
    /// variables through [`HistoryBackendConfig::default`].
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: std::env::var(GEMINI_API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty()),
            ..Self::default()
        }
    }

    pub fn with_gemini_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(api_key.into());
        self
    }

    pub fn with_history(mut self, history: HistoryBackendConfig) -> Self {
        self.history = history;
        self
    }

    pub fn with_weather_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.weather_base_url = Some(base_url.into());
        self
    }
}

/// Providers backing the tiers. The cloud provider serves both the primary
/// and the secondary model.
#[derive(Clone)]
pub struct RuntimeProviders {
    pub cloud: Arc<dyn ModelProvider>,
    pub local: Option<Arc<dyn ModelProvider>>,
}

#[derive(Clone)]
pub struct RuntimeBundle {
    pub orchestrator: Arc<ResponseOrchestrator>,
    pub history: Arc<dyn HistoryStore>,
    pub config: Arc<ModelConfig>,
    pub custom_prompts: Arc<CustomPrompts>,
}

impl RuntimeBundle {
    pub fn with_custom_prompts(mut self, custom_prompts: Arc<CustomPrompts>) -> Self {
        self.custom_prompts = custom_prompts;
        self
    }

    /// Builds a request stamped with the local time and the prompt resolved
    /// for `username`.
    pub fn request(
        &self,
        user_id: impl Into<UserId>,
        thread_id: impl Into<ThreadId>,
        username: &str,
        message: impl Into<String>,
    ) -> ResponseRequest {
        let system_prompt = resolve_system_prompt(&self.config, &self.custom_prompts, username);
        ResponseRequest::new(user_id, thread_id, message)
            .with_username(username)
            .with_timestamp(Local::now().to_rfc3339_opts(SecondsFormat::Secs, true))
            .with_system_prompt(system_prompt)
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.history.close().await?;
        Ok(())
    }
}

impl std::fmt::Debug for RuntimeBundle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeBundle")
            .field("orchestrator", &self.orchestrator)
            .field("config", &self.config)
            .field("custom_prompts", &self.custom_prompts)
            .finish()
    }
}

pub fn build_runtime(
    config: &ModelConfig,
    options: RuntimeOptions,
) -> Result<RuntimeBundle, RuntimeError> {
    config.validate()?;

    let api_key = options
        .gemini_api_key
        .clone()
        .ok_or_else(|| ConfigError::missing_environment(GEMINI_API_KEY_ENV))?;

    let provider_http = build_http_client(config.timeouts.provider())?;
    let cloud = build_gemini_provider(api_key, provider_http.clone())?;
    let local = if config.ollama.enabled {
        Some(build_ollama_provider(
            config.ollama.api_endpoint.clone(),
            config.ollama.model_name.clone(),
            provider_http,
        )?)
    } else {
        None
    };

    let tools = default_tool_registry(config, &options)?;
    let history = create_history_store(options.history, config.max_history_size)?;

    build_runtime_with(config, RuntimeProviders { cloud, local }, history, tools)
}

/// Weather tools over the zutool client and the URL reader over a client
/// bounded by the configured tool timeout.
pub fn default_tool_registry(
    config: &ModelConfig,
    options: &RuntimeOptions,
) -> Result<ToolRegistry, RuntimeError> {
    let tool_http = build_http_client(config.timeouts.tool())?;

    let mut registry = ToolRegistry::new();
    register_weather_tools(&mut registry, Arc::new(weather_client(options)?));
    registry.register(UrlReaderTool::new(Arc::new(HttpPageFetcher::new(tool_http))));
    Ok(registry)
}

/// Zutool client with its own 10 second timeout, pointed at
/// `weather_base_url` when one is set.
pub fn weather_client(options: &RuntimeOptions) -> Result<ZutoolClient, RuntimeError> {
    let client = ZutoolClient::with_default_timeout()?;
    Ok(match options.weather_base_url.as_ref() {
        Some(base_url) => client.with_base_url(base_url.clone()),
        None => client,
    })
}

pub fn build_runtime_with(
    config: &ModelConfig,
    providers: RuntimeProviders,
    history: Arc<dyn HistoryStore>,
    tools: ToolRegistry,
) -> Result<RuntimeBundle, RuntimeError> {
    config.validate()?;

    let provider_timeout = config.timeouts.provider();
    let dispatcher = DefaultToolDispatcher::new(Arc::new(tools))
        .with_hooks(Arc::new(SafeToolHooks::new(TracingObservabilityHooks)))
        .with_timeout(config.timeouts.tool());

    let mut builder = ResponseOrchestrator::builder(Arc::new(dispatcher), Arc::clone(&history))
        .hooks(Arc::new(SafeOrchestratorHooks::new(TracingObservabilityHooks)))
        .provider_hooks(Arc::new(SafeProviderHooks::new(TracingObservabilityHooks)))
        .tier(
            ProviderTier::primary(config.model_name.clone(), Arc::clone(&providers.cloud))
                .with_timeout(provider_timeout),
        );

    if let Some(secondary) = config.secondary_model() {
        builder = builder.tier(
            ProviderTier::secondary(secondary, Arc::clone(&providers.cloud))
                .with_timeout(provider_timeout),
        );
    }

    if let Some(local) = providers.local {
        builder = builder.tier(
            ProviderTier::local_fallback(config.ollama.model_name.clone(), local)
                .with_timeout(provider_timeout),
        );
    }

    let orchestrator = builder.build()?;
    tracing::info!(
        phase = "runtime",
        event = "ready",
        name = %config.name,
        tiers = orchestrator.tiers().len(),
        max_history_size = config.max_history_size
    );

    Ok(RuntimeBundle {
        orchestrator: Arc::new(orchestrator),
        history,
        config: Arc::new(config.clone()),
        custom_prompts: Arc::new(CustomPrompts::empty()),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use kchat::{ChatErrorKind, TierKind};
    use kmemory::{HistoryBackendConfig, HistoryStore, InMemoryHistoryStore, TurnRole};
    use kprovider::{
        ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderFuture, ProviderId,
        ResponsePart,
    };
    use ktooling::tools::url_reader::GET_URL_CONTENT;
    use ktooling::tools::weather::{
        GET_WEATHER, SEARCH_WEATHER_POINT, ZUTOOL_BASE_URL, ZUTOOL_TIMEOUT,
    };
    use ktooling::{ToolError, ToolRegistry};

    use super::{
        RuntimeErrorKind, RuntimeOptions, RuntimeProviders, build_runtime, build_runtime_with,
        default_tool_registry, weather_client,
    };
    use crate::config::{CustomPrompts, ModelConfig};

    #[derive(Debug, Default)]
    struct EchoProvider {
        models: Mutex<Vec<String>>,
        fail_with_quota: bool,
    }

    impl ModelProvider for EchoProvider {
        fn id(&self) -> ProviderId {
            ProviderId::Gemini
        }

        fn invoke<'a>(
            &'a self,
            request: ModelRequest,
        ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
            Box::pin(async move {
                let model = request.model.clone();
                self.models.lock().expect("models lock").push(model.clone());
                if self.fail_with_quota && model == "gemini-2.5-pro" {
                    return Err(ProviderError::rate_limited("quota exhausted"));
                }
                Ok(ModelResponse {
                    provider: ProviderId::Gemini,
                    parts: vec![ResponsePart::Text(format!("reply from {model}"))],
                    model,
                })
            })
        }
    }

    fn config(raw: &str) -> ModelConfig {
        ModelConfig::from_json(raw).expect("config should parse")
    }

    fn two_tier_config() -> ModelConfig {
        config(
            r#"{
                "name": "kazamidori",
                "model_name": "gemini-2.5-pro",
                "secondary_model_name": "gemini-2.0-flash",
                "max_history_size": 3,
                "prompts": { "default": "Be helpful.", "alice": "Be terse." }
            }"#,
        )
    }

    #[test]
    fn build_runtime_requires_an_api_key() {
        let error = build_runtime(
            &two_tier_config(),
            RuntimeOptions::default().with_history(HistoryBackendConfig::InMemory),
        )
        .expect_err("missing key should fail");

        assert_eq!(error.kind, RuntimeErrorKind::Config);
        assert!(error.message.contains("GEMINI_API_KEY"));
    }

    #[cfg(all(feature = "provider-gemini", feature = "provider-ollama"))]
    #[test]
    fn build_runtime_wires_every_configured_tier() {
        let config = config(
            r#"{
                "name": "kazamidori",
                "model_name": "gemini-2.5-pro",
                "secondary_model_name": "gemini-2.0-flash",
                "prompts": { "default": "Be helpful." },
                "ollama": { "enabled": true, "model_name": "llama3.2" }
            }"#,
        );

        let runtime = build_runtime(
            &config,
            RuntimeOptions::default()
                .with_gemini_api_key("AIza-test")
                .with_history(HistoryBackendConfig::InMemory),
        )
        .expect("runtime should build");

        let kinds = runtime
            .orchestrator
            .tiers()
            .iter()
            .map(|tier| (tier.kind, tier.model_name.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                (TierKind::Primary, "gemini-2.5-pro"),
                (TierKind::Secondary, "gemini-2.0-flash"),
                (TierKind::LocalFallback, "llama3.2"),
            ]
        );
    }

    #[tokio::test]
    async fn quota_on_primary_is_answered_by_secondary_and_persisted() {
        let provider = Arc::new(EchoProvider {
            fail_with_quota: true,
            ..EchoProvider::default()
        });
        let history: Arc<dyn HistoryStore> =
            Arc::new(InMemoryHistoryStore::new(3).expect("store should build"));

        let runtime = build_runtime_with(
            &two_tier_config(),
            RuntimeProviders {
                cloud: provider.clone(),
                local: None,
            },
            Arc::clone(&history),
            ToolRegistry::new(),
        )
        .expect("runtime should build");

        let outcome = runtime
            .orchestrator
            .get_response(runtime.request("u1", "t1", "bob", "hello"))
            .await
            .expect("secondary should answer");

        assert_eq!(outcome.text, "reply from gemini-2.0-flash");
        assert_eq!(outcome.model_name, "gemini-2.0-flash");
        assert_eq!(
            provider.models.lock().expect("models lock").clone(),
            vec!["gemini-2.5-pro", "gemini-2.0-flash"]
        );

        let turns = history
            .get(&"u1".into(), &"t1".into())
            .await
            .expect("history should load");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[1].content, "reply from gemini-2.0-flash");
    }

    #[tokio::test]
    async fn single_tier_quota_exhausts_the_chain() {
        let config = config(
            r#"{ "name": "k", "model_name": "gemini-2.5-pro", "prompts": { "default": "hi" } }"#,
        );
        let runtime = build_runtime_with(
            &config,
            RuntimeProviders {
                cloud: Arc::new(EchoProvider {
                    fail_with_quota: true,
                    ..EchoProvider::default()
                }),
                local: None,
            },
            Arc::new(InMemoryHistoryStore::new(10).expect("store should build")),
            ToolRegistry::new(),
        )
        .expect("runtime should build");

        let error = runtime
            .orchestrator
            .get_response(runtime.request("u1", "t1", "bob", "hello"))
            .await
            .expect_err("only tier is out of quota");

        assert_eq!(error.kind, ChatErrorKind::ProviderChainExhausted);
        assert_eq!(error.failures.len(), 1);
    }

    #[test]
    fn request_resolves_custom_prompt_and_stamps_time() {
        let runtime = build_runtime_with(
            &two_tier_config(),
            RuntimeProviders {
                cloud: Arc::new(EchoProvider::default()),
                local: None,
            },
            Arc::new(InMemoryHistoryStore::new(3).expect("store should build")),
            ToolRegistry::new(),
        )
        .expect("runtime should build");

        let request = runtime.request("u1", "t1", "alice", "hi");
        assert_eq!(request.system_prompt, "Be terse.");
        assert!(request.timestamp.is_some());

        let custom = Arc::new(CustomPrompts::empty());
        custom.set("alice", "Answer in haiku.").expect("set");
        let runtime = runtime.with_custom_prompts(custom);
        assert_eq!(
            runtime.request("u1", "t1", "alice", "hi").system_prompt,
            "Answer in haiku."
        );
        assert_eq!(runtime.request("u2", "t1", "carol", "hi").username, "carol");
    }

    #[tokio::test]
    async fn shutdown_closes_history() {
        let runtime = build_runtime_with(
            &two_tier_config(),
            RuntimeProviders {
                cloud: Arc::new(EchoProvider::default()),
                local: None,
            },
            Arc::new(InMemoryHistoryStore::new(3).expect("store should build")),
            ToolRegistry::new(),
        )
        .expect("runtime should build");

        runtime.shutdown().await.expect("first close succeeds");
        runtime.shutdown().await.expect("second close is a no-op");
        assert!(runtime.history.get(&"u1".into(), &"t1".into()).await.is_err());
    }

    #[test]
    fn weather_client_keeps_its_own_timeout() {
        let client = weather_client(&RuntimeOptions::default()).expect("client should build");
        assert_eq!(client.timeout(), Some(ZUTOOL_TIMEOUT));
        assert_eq!(client.base_url(), ZUTOOL_BASE_URL);

        let client = weather_client(
            &RuntimeOptions::default().with_weather_base_url("http://localhost:9/api"),
        )
        .expect("client should build");
        assert_eq!(client.timeout(), Some(ZUTOOL_TIMEOUT));
        assert_eq!(client.base_url(), "http://localhost:9/api");
    }

    #[test]
    fn default_registry_carries_weather_and_url_tools() {
        let registry = default_tool_registry(&two_tier_config(), &RuntimeOptions::default())
            .expect("registry should build");
        assert!(registry.contains(GET_WEATHER));
        assert!(registry.contains(SEARCH_WEATHER_POINT));
        assert!(registry.contains(GET_URL_CONTENT));
    }

    #[test]
    fn tool_errors_map_to_the_tooling_kind() {
        let error = super::RuntimeError::from(ToolError::execution("no client"));
        assert_eq!(error.kind, RuntimeErrorKind::Tooling);
        assert_eq!(error.message, "Execution: no client");
    }
}
