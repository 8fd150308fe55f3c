use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, error};

use crate::fetcher::AnyFetcher;
use crate::http_client::HttpClient;
use crate::provider::Provider;
use crate::{CoreError, ValidationError};

/// Shared resources handed to provider loaders.
#[derive(Clone)]
pub struct ProviderContext {
    pub http_client: Arc<dyn HttpClient>,
}

pub type ProviderLoadFn = fn(&ProviderContext) -> Result<Provider, ValidationError>;

/// One entry of the installed provider table.
#[derive(Clone, Copy)]
pub struct ProviderExtension {
    pub name: &'static str,
    pub load: ProviderLoadFn,
}

impl ProviderExtension {
    pub const fn new(name: &'static str, load: ProviderLoadFn) -> Self {
        Self { name, load }
    }
}

/// Immutable provider lookup keyed by lowercase provider name.
#[derive(Debug, Default)]
pub struct Registry {
    providers: BTreeMap<String, Arc<Provider>>,
}

impl Registry {
    pub fn from_providers(providers: impl IntoIterator<Item = Provider>) -> Result<Self, CoreError> {
        let mut registry = Self::default();
        for provider in providers {
            let name = provider.name().to_owned();
            if registry.providers.contains_key(&name) {
                return Err(CoreError::loading(&name, "provider registered more than once"));
            }
            registry.providers.insert(name, Arc::new(provider));
        }
        Ok(registry)
    }

    pub fn providers(&self) -> impl Iterator<Item = &Arc<Provider>> {
        self.providers.values()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Case-insensitive provider lookup.
    pub fn get_provider(&self, name: &str) -> Result<Arc<Provider>, CoreError> {
        self.providers
            .get(&name.trim().to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| CoreError::ProviderNotFound {
                name: name.to_owned(),
                available: self.provider_names(),
            })
    }

    pub fn get_fetcher(&self, provider: &Provider, model: &str) -> Result<Arc<dyn AnyFetcher>, CoreError> {
        provider
            .fetcher(model)
            .ok_or_else(|| CoreError::FetcherNotFound {
                provider: provider.name().to_owned(),
                model: model.to_owned(),
            })
    }

    /// Provider name to its sorted model names.
    pub fn model_map(&self) -> BTreeMap<String, Vec<String>> {
        self.providers
            .iter()
            .map(|(name, provider)| {
                let models = provider.models().into_iter().map(str::to_owned).collect();
                (name.clone(), models)
            })
            .collect()
    }

    /// Every credential declared by any provider.
    pub fn credentials(&self) -> BTreeSet<String> {
        self.providers
            .values()
            .flat_map(|provider| provider.credentials().iter().cloned())
            .collect()
    }
}

/// Builds a [`Registry`] from the installed provider table.
pub struct RegistryLoader;

impl RegistryLoader {
    /// Loads every extension; any failure aborts the whole load.
    pub fn from_extensions(
        extensions: &[ProviderExtension],
        context: &ProviderContext,
    ) -> Result<Registry, CoreError> {
        let mut ordered = extensions.to_vec();
        ordered.sort_by_key(|extension| extension.name);

        let mut providers = Vec::with_capacity(ordered.len());
        for extension in ordered {
            let provider = (extension.load)(context).map_err(|err| {
                error!(extension = extension.name, error = %err, "provider extension failed to load");
                CoreError::loading(extension.name, err)
            })?;
            if !provider.name().eq_ignore_ascii_case(extension.name) {
                return Err(CoreError::loading(
                    extension.name,
                    format!("extension loads provider '{}'", provider.name()),
                ));
            }
            debug!(provider = provider.name(), models = ?provider.models(), "provider loaded");
            providers.push(provider);
        }

        Registry::from_providers(providers)
    }
}
