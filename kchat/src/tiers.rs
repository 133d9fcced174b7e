//! Provider tiers walked in order by the orchestrator.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use kprovider::ModelProvider;

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(90);

/// Ordered: a chain must list tiers in this order, each at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TierKind {
    Primary,
    Secondary,
    LocalFallback,
}

impl TierKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::LocalFallback => "local_fallback",
        }
    }
}

impl Display for TierKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct ProviderTier {
    pub kind: TierKind,
    pub model_name: String,
    pub provider: Arc<dyn ModelProvider>,
    pub timeout: Duration,
}

impl ProviderTier {
    pub fn new(
        kind: TierKind,
        model_name: impl Into<String>,
        provider: Arc<dyn ModelProvider>,
    ) -> Self {
        Self {
            kind,
            model_name: model_name.into(),
            provider,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn primary(model_name: impl Into<String>, provider: Arc<dyn ModelProvider>) -> Self {
        Self::new(TierKind::Primary, model_name, provider)
    }

    pub fn secondary(model_name: impl Into<String>, provider: Arc<dyn ModelProvider>) -> Self {
        Self::new(TierKind::Secondary, model_name, provider)
    }

    pub fn local_fallback(
        model_name: impl Into<String>,
        provider: Arc<dyn ModelProvider>,
    ) -> Self {
        Self::new(TierKind::LocalFallback, model_name, provider)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for ProviderTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderTier")
            .field("kind", &self.kind)
            .field("model_name", &self.model_name)
            .field("provider", &self.provider.id())
            .field("timeout", &self.timeout)
            .finish()
    }
}
