//! Provider Registry
//!
//! Owns one adapter per provider for the lifetime of an orchestrator.
//! Adapters are created lazily on first use through [`create_provider`] and
//! reused across requests until [`ProviderRegistry::close_all`] tears them down.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::{T2SError, T2SResult};
use super::options::Provider;
use super::provider::{T2SProvider, create_provider};
use crate::config::T2SConfig;

pub struct ProviderRegistry {
    config: Arc<T2SConfig>,
    adapters: Mutex<HashMap<Provider, Arc<dyn T2SProvider>>>,
}

impl ProviderRegistry {
    pub fn new(config: Arc<T2SConfig>) -> Self {
        Self {
            config,
            adapters: Mutex::new(HashMap::new()),
        }
    }

    /// Install a pre-built adapter, replacing any cached one for its provider.
    ///
    /// Registered providers are considered enabled even when the
    /// configuration does not list them.
    pub async fn register(&self, adapter: Arc<dyn T2SProvider>) {
        let provider = adapter.provider();
        debug!(provider = %provider, "Registering provider adapter");
        self.adapters.lock().await.insert(provider, adapter);
    }

    /// Providers taking part in voice resolution: configured ones plus any
    /// registered explicitly, in configuration order.
    pub async fn providers(&self) -> Vec<Provider> {
        let adapters = self.adapters.lock().await;
        let mut providers = self.config.enabled_providers.clone();
        for provider in Provider::ALL {
            if adapters.contains_key(&provider) && !providers.contains(&provider) {
                providers.push(provider);
            }
        }
        providers
    }

    /// Cached adapter for `provider`, creating and connecting it on first use.
    pub async fn get_or_create(&self, provider: Provider) -> T2SResult<Arc<dyn T2SProvider>> {
        let mut adapters = self.adapters.lock().await;
        if let Some(adapter) = adapters.get(&provider) {
            return Ok(adapter.clone());
        }

        if !self.config.enabled_providers.contains(&provider) {
            return Err(T2SError::Configuration(format!(
                "Provider {provider} is not enabled"
            )));
        }

        let adapter = create_provider(provider, &self.config).await?;
        info!(provider = %provider, "Provider adapter created");
        adapters.insert(provider, adapter.clone());
        Ok(adapter)
    }

    /// Adapters for every enabled provider. Providers whose adapter cannot
    /// be created are skipped with a warning.
    pub async fn available(&self) -> Vec<Arc<dyn T2SProvider>> {
        let mut available = Vec::new();
        for provider in self.providers().await {
            match self.get_or_create(provider).await {
                Ok(adapter) => available.push(adapter),
                Err(e) => warn!(provider = %provider, error = %e, "Provider unavailable"),
            }
        }
        available
    }

    /// Close every cached adapter exactly once.
    ///
    /// All adapters are closed even when some fail; the failures are
    /// returned together as [`T2SError::Shutdown`].
    pub async fn close_all(&self) -> T2SResult<()> {
        let adapters: Vec<_> = self.adapters.lock().await.drain().collect();
        let mut errors = Vec::new();

        for (provider, adapter) in adapters {
            match adapter.close().await {
                Ok(()) => debug!(provider = %provider, "Provider adapter closed"),
                Err(e) => {
                    warn!(provider = %provider, error = %e, "Failed to close provider adapter");
                    errors.push(e);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(T2SError::Shutdown(errors))
        }
    }

    pub async fn len(&self) -> usize {
        self.adapters.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.adapters.lock().await.is_empty()
    }
}
