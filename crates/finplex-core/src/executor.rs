use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use crate::fetcher::{AnyFetcher, FetchOptions, PlainCredentials};
use crate::provider::Provider;
use crate::registry::Registry;
use crate::schema::Params;
use crate::secret::SecretMap;
use crate::CoreError;

/// Resolves provider and fetcher for a request and runs the fetch pipeline.
///
/// Holds only a shared read-only registry; cloning is cheap and concurrent use needs no locking.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    registry: Arc<Registry>,
}

impl QueryExecutor {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn get_provider(&self, provider_name: &str) -> Result<Arc<Provider>, CoreError> {
        self.registry.get_provider(provider_name)
    }

    pub fn get_fetcher(&self, provider: &Provider, model_name: &str) -> Result<Arc<dyn AnyFetcher>, CoreError> {
        self.registry.get_fetcher(provider, model_name)
    }

    /// Keeps only the credentials `provider` declares, unwrapped to plain strings.
    ///
    /// An absent or blank credential fails with `MissingCredential` when
    /// `require_credentials` is set and is otherwise omitted.
    pub fn filter_credentials(
        credentials: Option<&SecretMap>,
        provider: &Provider,
        require_credentials: bool,
    ) -> Result<PlainCredentials, CoreError> {
        let mut filtered = PlainCredentials::new();

        for name in provider.credentials() {
            let value = credentials
                .and_then(|supplied| supplied.get(name))
                .filter(|secret| !secret.is_empty());
            match value {
                Some(secret) => {
                    filtered.insert(name.clone(), secret.expose_secret().to_owned());
                }
                None if require_credentials => {
                    return Err(CoreError::MissingCredential { name: name.clone() });
                }
                None => {}
            }
        }

        Ok(filtered)
    }

    /// Runs `provider_name`'s fetcher for `model_name`.
    ///
    /// Any failure inside the fetch pipeline surfaces as `CoreError::Provider`.
    pub async fn execute(
        &self,
        provider_name: &str,
        model_name: &str,
        params: Params,
        credentials: Option<&SecretMap>,
        options: FetchOptions,
    ) -> Result<Vec<Value>, CoreError> {
        let provider = self.get_provider(provider_name)?;
        let fetcher = self.get_fetcher(&provider, model_name)?;
        let filtered = Self::filter_credentials(credentials, &provider, fetcher.require_credentials())?;

        let started = Instant::now();
        debug!(
            provider = provider.name(),
            model = model_name,
            credentials = filtered.len(),
            "executing query"
        );
        let records = fetcher
            .fetch_data(params, filtered, options)
            .await
            .map_err(|source| {
                warn!(
                    provider = provider.name(),
                    model = model_name,
                    code = source.code(),
                    "fetch pipeline failed"
                );
                CoreError::Provider {
                    provider: provider.name().to_owned(),
                    model: model_name.to_owned(),
                    source,
                }
            })?;
        debug!(
            provider = provider.name(),
            model = model_name,
            records = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query completed"
        );

        Ok(records)
    }
}
