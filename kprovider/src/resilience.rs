//! Deadline enforcement and operational hook contracts for provider calls.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::{ProviderError, ProviderId};

pub trait ProviderOperationHooks: Send + Sync {
    fn on_attempt_start(&self, _provider: ProviderId, _model: &str) {}

    fn on_success(&self, _provider: ProviderId, _model: &str, _elapsed: Duration) {}

    fn on_failure(
        &self,
        _provider: ProviderId,
        _model: &str,
        _error: &ProviderError,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationHooks;

impl ProviderOperationHooks for NoopOperationHooks {}

/// Runs `operation` under `deadline`, reporting the outcome to `hooks`.
///
/// Expiry drops the inner future, which aborts any in-flight request, and
/// surfaces as [`ProviderError::timeout`].
pub async fn execute_with_deadline<T, Op>(
    provider: ProviderId,
    model: &str,
    deadline: Duration,
    hooks: &dyn ProviderOperationHooks,
    operation: Op,
) -> Result<T, ProviderError>
where
    Op: Future<Output = Result<T, ProviderError>>,
{
    hooks.on_attempt_start(provider, model);
    let started = Instant::now();

    let result = match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::timeout(format!(
            "{provider} call for model '{model}' exceeded {}ms",
            deadline.as_millis()
        ))),
    };

    match &result {
        Ok(_) => hooks.on_success(provider, model, started.elapsed()),
        Err(error) => hooks.on_failure(provider, model, error, started.elapsed()),
    }

    result
}
