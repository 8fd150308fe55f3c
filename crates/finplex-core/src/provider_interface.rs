//! Catalogue of what the installed providers can do, per standard model.
//!
//! Built once from a [`Registry`] and the standard model catalogue. Construction is
//! where provider schemas are checked against the standard schemas they claim.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::registry::Registry;
use crate::schema::{FieldKind, Schema};
use crate::standard_models::{ModelInfo, ResultShape};
use crate::CoreError;

/// A provider-specific query field, with every provider that accepts it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtraParam {
    pub name: String,
    pub kind: FieldKind,
    pub description: String,
    pub providers: Vec<String>,
}

/// Query and data schemas of one provider for one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSchemas {
    pub query: Schema,
    pub data: Schema,
}

/// Everything known about one standard model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelEntry {
    pub info: ModelInfo,
    pub providers: BTreeMap<String, ProviderSchemas>,
    pub extra_params: Vec<ExtraParam>,
}

impl ModelEntry {
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProviderInterface {
    models: BTreeMap<String, ModelEntry>,
    credentials: BTreeSet<String>,
    providers: Vec<String>,
}

impl ProviderInterface {
    /// Indexes `registry` against `catalogue`.
    ///
    /// Fails with `LoadingError` naming the provider when a fetcher targets a model
    /// outside the catalogue or its schemas do not extend the standard ones, or when
    /// two providers declare the same extra parameter with different kinds.
    pub fn new(registry: &Registry, catalogue: &[ModelInfo]) -> Result<Self, CoreError> {
        let mut models = catalogue
            .iter()
            .map(|info| {
                let entry = ModelEntry {
                    info: info.clone(),
                    providers: BTreeMap::new(),
                    extra_params: Vec::new(),
                };
                (info.name.clone(), entry)
            })
            .collect::<BTreeMap<_, _>>();

        for provider in registry.providers() {
            for (model, fetcher) in provider.fetchers() {
                let Some(entry) = models.get_mut(model) else {
                    return Err(CoreError::loading(
                        provider.name(),
                        format!("fetcher declared for unknown model '{model}'"),
                    ));
                };

                let query = fetcher.query_schema();
                let data = fetcher.data_schema();
                for schema in [&query, &data] {
                    schema
                        .validate()
                        .map_err(|err| CoreError::loading(provider.name(), err))?;
                }
                query
                    .check_extends(&entry.info.query)
                    .and_then(|_| data.check_extends(&entry.info.data))
                    .map_err(|err| CoreError::loading(provider.name(), err))?;

                for field in &query.fields {
                    if entry.info.query.field(&field.name).is_some() {
                        continue;
                    }
                    match entry
                        .extra_params
                        .iter_mut()
                        .find(|extra| extra.name == field.name)
                    {
                        Some(extra) if extra.kind != field.kind => {
                            return Err(CoreError::loading(
                                provider.name(),
                                format!(
                                    "extra parameter '{}' of model '{model}' is {} but another provider declares {}",
                                    field.name,
                                    field.kind.type_name(),
                                    extra.kind.type_name()
                                ),
                            ));
                        }
                        Some(extra) => extra.providers.push(provider.name().to_owned()),
                        None => entry.extra_params.push(ExtraParam {
                            name: field.name.clone(),
                            kind: field.kind,
                            description: field.description.clone(),
                            providers: vec![provider.name().to_owned()],
                        }),
                    }
                }

                entry
                    .providers
                    .insert(provider.name().to_owned(), ProviderSchemas { query, data });
            }
        }

        for entry in models.values_mut() {
            entry.extra_params.sort_by(|a, b| a.name.cmp(&b.name));
        }
        debug!(models = models.len(), providers = registry.len(), "provider interface built");

        Ok(Self {
            models,
            credentials: registry.credentials(),
            providers: registry.provider_names(),
        })
    }

    /// Every catalogued model name, sorted.
    pub fn models(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    pub fn model(&self, model: &str) -> Option<&ModelEntry> {
        self.models.get(model)
    }

    /// Providers implementing `model`, sorted.
    pub fn model_providers(&self, model: &str) -> Vec<String> {
        self.models
            .get(model)
            .map(ModelEntry::provider_names)
            .unwrap_or_default()
    }

    pub fn standard_params(&self, model: &str) -> Option<&Schema> {
        self.models.get(model).map(|entry| &entry.info.query)
    }

    pub fn extra_params(&self, model: &str) -> &[ExtraParam] {
        self.models
            .get(model)
            .map(|entry| entry.extra_params.as_slice())
            .unwrap_or_default()
    }

    pub fn return_schema(&self, model: &str) -> Option<&Schema> {
        self.models.get(model).map(|entry| &entry.info.data)
    }

    pub fn result_shape(&self, model: &str) -> Option<ResultShape> {
        self.models.get(model).map(|entry| entry.info.shape)
    }

    pub fn credentials(&self) -> &BTreeSet<String> {
        &self.credentials
    }

    /// Every installed provider, sorted.
    pub fn provider_choices(&self) -> &[String] {
        &self.providers
    }

    /// Provider name to the models it implements.
    pub fn provider_coverage(&self) -> BTreeMap<String, Vec<String>> {
        let mut coverage = self
            .providers
            .iter()
            .map(|provider| (provider.clone(), Vec::new()))
            .collect::<BTreeMap<_, Vec<String>>>();
        for (model, entry) in &self.models {
            for provider in entry.providers.keys() {
                if let Some(models) = coverage.get_mut(provider) {
                    models.push(model.clone());
                }
            }
        }
        coverage
    }

    /// Model to provider to schemas.
    pub fn map(&self) -> BTreeMap<&str, &BTreeMap<String, ProviderSchemas>> {
        self.models
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.providers))
            .collect()
    }
}
