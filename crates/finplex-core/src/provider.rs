use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::fetcher::{AnyFetcher, Fetcher};
use crate::provider_policy::ProviderPolicy;
use crate::ValidationError;

/// A named data vendor: its credentials and one fetcher per supported standard model.
pub struct Provider {
    name: String,
    description: String,
    website: Option<String>,
    credentials: Vec<String>,
    fetchers: BTreeMap<String, Arc<dyn AnyFetcher>>,
    policy: Option<ProviderPolicy>,
}

impl Provider {
    pub fn builder(name: &str) -> ProviderBuilder {
        ProviderBuilder {
            name: name.trim().to_ascii_lowercase(),
            description: String::new(),
            website: None,
            credentials: Vec::new(),
            fetchers: BTreeMap::new(),
            policy: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn website(&self) -> Option<&str> {
        self.website.as_deref()
    }

    /// Full credential names, each prefixed with `<provider>_`.
    pub fn credentials(&self) -> &[String] {
        &self.credentials
    }

    pub fn policy(&self) -> Option<&ProviderPolicy> {
        self.policy.as_ref()
    }

    pub fn fetcher(&self, model: &str) -> Option<Arc<dyn AnyFetcher>> {
        self.fetchers.get(model).cloned()
    }

    pub fn fetchers(&self) -> impl Iterator<Item = (&str, &Arc<dyn AnyFetcher>)> {
        self.fetchers
            .iter()
            .map(|(model, fetcher)| (model.as_str(), fetcher))
    }

    /// Supported standard model names, sorted.
    pub fn models(&self) -> Vec<&str> {
        self.fetchers.keys().map(String::as_str).collect()
    }
}

impl Debug for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("credentials", &self.credentials)
            .field("models", &self.models())
            .finish()
    }
}

/// Builder for [`Provider`].
pub struct ProviderBuilder {
    name: String,
    description: String,
    website: Option<String>,
    credentials: Vec<String>,
    fetchers: BTreeMap<String, Arc<dyn AnyFetcher>>,
    policy: Option<ProviderPolicy>,
}

impl ProviderBuilder {
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    pub fn website(mut self, website: &str) -> Self {
        self.website = Some(website.to_owned());
        self
    }

    /// Declares a credential by short name; it is stored as `<provider>_<name>`.
    pub fn credential(mut self, short_name: &str) -> Self {
        let full = format!("{}_{}", self.name, short_name.trim().to_ascii_lowercase());
        if !self.credentials.contains(&full) {
            self.credentials.push(full);
        }
        self
    }

    pub fn fetcher<F: Fetcher>(self, model: &str, fetcher: F) -> Self {
        self.fetcher_arc(model, Arc::new(fetcher))
    }

    pub fn fetcher_arc(mut self, model: &str, fetcher: Arc<dyn AnyFetcher>) -> Self {
        self.fetchers.insert(model.trim().to_owned(), fetcher);
        self
    }

    pub fn policy(mut self, policy: ProviderPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn build(self) -> Result<Provider, ValidationError> {
        let valid_name = !self.name.is_empty()
            && self
                .name
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_');
        if !valid_name {
            return Err(ValidationError::InvalidProviderName { value: self.name });
        }
        if self.fetchers.keys().any(|model| model.is_empty()) {
            return Err(ValidationError::EmptyModelName { provider: self.name });
        }
        if self
            .credentials
            .iter()
            .any(|credential| credential.len() <= self.name.len() + 1)
        {
            return Err(ValidationError::EmptyCredentialName { provider: self.name });
        }

        Ok(Provider {
            name: self.name,
            description: self.description,
            website: self.website,
            credentials: self.credentials,
            fetchers: self.fetchers,
            policy: self.policy,
        })
    }
}
