//! Provider fallback chain with a single tool round trip.

use std::sync::Arc;
use std::time::Instant;

use kcommon::GenerationOptions;
use kmemory::{ConversationTurn, HistoryStore};
use kprovider::{
    Content, ModelRequest, ModelResponse, NoopOperationHooks, ProviderError,
    ProviderOperationHooks, ResponsePart, ToolCall, ToolDefinition, execute_with_deadline,
};
use ktooling::{ToolDispatcher, ToolExecutionContext};

use crate::{
    ChatError, HistoryOperation, NoopOrchestratorHooks, OrchestratorHooks, PromptAssembler,
    ProviderTier, ResponseOutcome, ResponseRequest, TierFailure, TierKind,
    render_tool_instructions,
};

/// Cap on the tool result echoed back to the model, in characters.
pub const FUNCTION_RESPONSE_CHAR_LIMIT: usize = 1800;

pub struct ResponseOrchestrator {
    tiers: Vec<ProviderTier>,
    dispatcher: Arc<dyn ToolDispatcher>,
    history: Arc<dyn HistoryStore>,
    hooks: Arc<dyn OrchestratorHooks>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
    options: GenerationOptions,
    function_response_limit: usize,
}

impl ResponseOrchestrator {
    pub fn builder(
        dispatcher: Arc<dyn ToolDispatcher>,
        history: Arc<dyn HistoryStore>,
    ) -> ResponseOrchestratorBuilder {
        ResponseOrchestratorBuilder::new(dispatcher, history)
    }

    pub fn tiers(&self) -> &[ProviderTier] {
        &self.tiers
    }

    pub fn history(&self) -> Arc<dyn HistoryStore> {
        Arc::clone(&self.history)
    }

    /// Produces one reply for `request`, persisting the turn pair when the
    /// reply is non-empty. History failures are reported through hooks and
    /// never fail the request.
    pub async fn get_response(
        &self,
        request: ResponseRequest,
    ) -> Result<ResponseOutcome, ChatError> {
        let started = Instant::now();
        let result = self.respond(&request, started).await;
        if let Err(error) = &result {
            self.hooks.on_request_failure(error, started.elapsed());
        }

        result
    }

    async fn respond(
        &self,
        request: &ResponseRequest,
        started: Instant,
    ) -> Result<ResponseOutcome, ChatError> {
        if request.message.trim().is_empty() {
            return Err(ChatError::invalid_request("message must not be empty"));
        }

        self.hooks
            .on_request_start(&request.user_id, &request.thread_id);

        let history = self.load_history(request).await;
        let definitions = self.dispatcher.definitions();
        let prompt = Content::user_text(PromptAssembler::build(
            &request.system_prompt,
            request.timestamp.as_deref(),
            &render_tool_instructions(&definitions),
            &history,
            &request.message,
        ));

        let (tier, response) = self.invoke_chain(&prompt, &definitions).await?;
        let text = self
            .interpret(tier, request, &prompt, &definitions, response)
            .await?;

        let persisted = self.persist(request, &text).await;
        let elapsed = started.elapsed();
        self.hooks
            .on_response_complete(tier.kind, &tier.model_name, elapsed, persisted);

        Ok(ResponseOutcome {
            text,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            model_name: tier.model_name.clone(),
        })
    }

    /// Walks the tiers in order. A primary failure falls through only when
    /// it is a quota rejection; later tiers fall through on any failure.
    async fn invoke_chain(
        &self,
        prompt: &Content,
        definitions: &[ToolDefinition],
    ) -> Result<(&ProviderTier, ModelResponse), ChatError> {
        let mut failures = Vec::new();

        for (index, tier) in self.tiers.iter().enumerate() {
            let error = match self
                .invoke_tier(tier, vec![prompt.clone()], definitions)
                .await
            {
                Ok(response) => return Ok((tier, response)),
                Err(error) => error,
            };

            self.hooks
                .on_tier_failure(tier.kind, &tier.model_name, &error);
            let falls_through = tier.kind != TierKind::Primary || error.is_quota();

            match self.tiers.get(index + 1) {
                Some(next) if falls_through => {
                    self.hooks.on_tier_fallback(tier.kind, next.kind, &error);
                    failures.push(TierFailure::new(tier.kind, tier.model_name.clone(), error));
                }
                _ => {
                    failures.push(TierFailure::new(tier.kind, tier.model_name.clone(), error));
                    return Err(if falls_through {
                        ChatError::chain_exhausted(failures)
                    } else {
                        ChatError::provider(
                            format!("{} tier failed with a non-quota error", tier.kind),
                            failures,
                        )
                    });
                }
            }
        }

        Err(ChatError::chain_exhausted(failures))
    }

    async fn invoke_tier(
        &self,
        tier: &ProviderTier,
        contents: Vec<Content>,
        definitions: &[ToolDefinition],
    ) -> Result<ModelResponse, ProviderError> {
        let mut builder = ModelRequest::builder(tier.model_name.clone())
            .contents(contents)
            .options(self.options);
        if tier.provider.supports_tools() {
            builder = builder.tools(definitions.to_vec());
        }

        let request = builder.build()?;
        execute_with_deadline(
            tier.provider.id(),
            &tier.model_name,
            tier.timeout,
            self.provider_hooks.as_ref(),
            tier.provider.invoke(request),
        )
        .await
    }

    async fn interpret(
        &self,
        tier: &ProviderTier,
        request: &ResponseRequest,
        prompt: &Content,
        definitions: &[ToolDefinition],
        response: ModelResponse,
    ) -> Result<String, ChatError> {
        self.report_unrecognized(tier.kind, &response);
        if !tier.provider.supports_tools() {
            return Ok(response.text());
        }

        let mut calls = response.function_calls().cloned();
        let Some(tool_call) = calls.next() else {
            return Ok(response.text());
        };

        let ignored = calls.collect::<Vec<_>>();
        if !ignored.is_empty() {
            self.hooks.on_ignored_function_calls(tier.kind, &ignored);
        }

        self.tool_round_trip(tier, request, prompt, definitions, &response, &tool_call)
            .await
    }

    /// Dispatches the call, then asks the same tier to phrase the result.
    /// Intro text next to the function call is discarded.
    async fn tool_round_trip(
        &self,
        tier: &ProviderTier,
        request: &ResponseRequest,
        prompt: &Content,
        definitions: &[ToolDefinition],
        response: &ModelResponse,
        tool_call: &ToolCall,
    ) -> Result<String, ChatError> {
        self.hooks.on_tool_call(tier.kind, tool_call);

        let context =
            ToolExecutionContext::new(request.user_id.clone(), request.thread_id.clone())
                .with_metadata("username", request.username.clone());
        let result = self.dispatcher.dispatch(tool_call, &context).await?;

        let contents = vec![
            prompt.clone(),
            response.to_model_content(tool_call),
            Content::function_response(
                tool_call.name.clone(),
                truncate_chars(&result.content, self.function_response_limit),
            ),
        ];

        let follow_up = match self.invoke_tier(tier, contents, definitions).await {
            Ok(follow_up) => follow_up,
            Err(error) => {
                self.hooks
                    .on_tier_failure(tier.kind, &tier.model_name, &error);
                return Err(ChatError::provider(
                    format!("follow-up call after tool '{}' failed", tool_call.name),
                    vec![TierFailure::new(tier.kind, tier.model_name.clone(), error)],
                ));
            }
        };

        self.report_unrecognized(tier.kind, &follow_up);
        let ignored = follow_up.function_calls().cloned().collect::<Vec<_>>();
        if !ignored.is_empty() {
            self.hooks.on_ignored_function_calls(tier.kind, &ignored);
        }

        let text = follow_up.text();
        if text.trim().is_empty() {
            return Ok(tool_fallback_reply(&tool_call.name, &result.content));
        }

        Ok(text)
    }

    fn report_unrecognized(&self, tier: TierKind, response: &ModelResponse) {
        for part in &response.parts {
            if let ResponsePart::Unsupported { kind } = part {
                self.hooks.on_unrecognized_part(tier, kind);
            }
        }
    }

    async fn load_history(&self, request: &ResponseRequest) -> Vec<ConversationTurn> {
        match self
            .history
            .get(&request.user_id, &request.thread_id)
            .await
        {
            Ok(turns) => turns,
            Err(error) => {
                self.hooks.on_history_error(
                    HistoryOperation::Read,
                    &request.user_id,
                    &request.thread_id,
                    &error,
                );
                Vec::new()
            }
        }
    }

    async fn persist(&self, request: &ResponseRequest, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        match self
            .history
            .add(&request.user_id, &request.thread_id, &request.message, text)
            .await
        {
            Ok(()) => true,
            Err(error) => {
                self.hooks.on_history_error(
                    HistoryOperation::Write,
                    &request.user_id,
                    &request.thread_id,
                    &error,
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for ResponseOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseOrchestrator")
            .field("tiers", &self.tiers)
            .field("options", &self.options)
            .field("function_response_limit", &self.function_response_limit)
            .finish()
    }
}

pub struct ResponseOrchestratorBuilder {
    tiers: Vec<ProviderTier>,
    dispatcher: Arc<dyn ToolDispatcher>,
    history: Arc<dyn HistoryStore>,
    hooks: Arc<dyn OrchestratorHooks>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
    options: GenerationOptions,
    function_response_limit: usize,
}

impl ResponseOrchestratorBuilder {
    pub fn new(dispatcher: Arc<dyn ToolDispatcher>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            tiers: Vec::new(),
            dispatcher,
            history,
            hooks: Arc::new(NoopOrchestratorHooks),
            provider_hooks: Arc::new(NoopOperationHooks),
            options: GenerationOptions::default(),
            function_response_limit: FUNCTION_RESPONSE_CHAR_LIMIT,
        }
    }

    pub fn tier(mut self, tier: ProviderTier) -> Self {
        self.tiers.push(tier);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn OrchestratorHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn provider_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.provider_hooks = hooks;
        self
    }

    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn function_response_limit(mut self, limit: usize) -> Self {
        self.function_response_limit = limit;
        self
    }

    pub fn build(self) -> Result<ResponseOrchestrator, ChatError> {
        match self.tiers.first() {
            None => {
                return Err(ChatError::invalid_request(
                    "at least one provider tier is required",
                ));
            }
            Some(first) if first.kind != TierKind::Primary => {
                return Err(ChatError::invalid_request(
                    "the first provider tier must be the primary tier",
                ));
            }
            Some(_) => {}
        }

        if !self.tiers.windows(2).all(|pair| pair[0].kind < pair[1].kind) {
            return Err(ChatError::invalid_request(
                "provider tiers must be ordered primary, secondary, local_fallback without repeats",
            ));
        }

        if let Some(tier) = self
            .tiers
            .iter()
            .find(|tier| tier.model_name.trim().is_empty())
        {
            return Err(ChatError::invalid_request(format!(
                "{} tier has an empty model name",
                tier.kind
            )));
        }

        if self.function_response_limit == 0 {
            return Err(ChatError::invalid_request(
                "function_response_limit must be greater than zero",
            ));
        }

        Ok(ResponseOrchestrator {
            tiers: self.tiers,
            dispatcher: self.dispatcher,
            history: self.history,
            hooks: self.hooks,
            provider_hooks: self.provider_hooks,
            options: self.options,
            function_response_limit: self.function_response_limit,
        })
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}

fn tool_fallback_reply(tool_name: &str, raw_result: &str) -> String {
    format!("I checked {tool_name} but couldn't put the answer into words, so here is what it returned:\n{raw_result}")
}
