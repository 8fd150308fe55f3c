use serde_json::Value;
use tracing::{debug, warn};

use crate::envelope::Warning;
use crate::fetcher::FetchOptions;
use crate::provider_interface::ExtraParam;
use crate::router::command_context::CommandContext;
use crate::router::handler::CommandInput;
use crate::router::Route;
use crate::schema::{Field, Params, Schema};
use crate::secret::SecretMap;
use crate::{CoreError, ValidationError};

/// One model command invocation resolved against its route.
///
/// Provider choice, in order: the caller's explicit choice, the route default from
/// configuration, the first provider implementing the model. Extra parameters the
/// chosen provider does not accept are dropped with a platform warning.
#[derive(Debug)]
pub struct Query<'a> {
    cc: &'a CommandContext,
    model: &'a str,
    provider: String,
    standard_params: Params,
    extra_params: Params,
    credentials: SecretMap,
    passthrough: Params,
    warnings: Vec<Warning>,
}

impl<'a> Query<'a> {
    pub fn new(
        cc: &'a CommandContext,
        route: &'a Route,
        model: &'a str,
        input: CommandInput,
    ) -> Result<Self, CoreError> {
        let choices = route.provider_choices();
        let provider = Self::choose_provider(
            &choices,
            input.provider.as_deref(),
            cc.default_provider(&route.path),
        )?;

        let standard_schema = route
            .standard_params()
            .cloned()
            .unwrap_or_else(|| Schema::new(model, Vec::new()));
        let (standard, extra, warnings) =
            Self::split_params(&standard_schema, route.extra_params(), &provider, input.params)?;

        let standard_params = standard_schema.coerce_params(&standard)?;
        let extra_params = Self::extra_schema(route.extra_params(), &provider).coerce_params(&extra)?;

        let mut credentials = cc.credentials.clone();
        credentials.extend(input.credentials.unwrap_or_default());

        Ok(Self {
            cc,
            model,
            provider,
            standard_params,
            extra_params,
            credentials,
            passthrough: input.passthrough,
            warnings,
        })
    }

    /// Picks the provider for this call from `choices`.
    pub fn choose_provider(
        choices: &[String],
        explicit: Option<&str>,
        route_default: Option<&str>,
    ) -> Result<String, CoreError> {
        if let Some(explicit) = explicit.map(str::trim).filter(|name| !name.is_empty()) {
            let explicit = explicit.to_ascii_lowercase();
            if choices.contains(&explicit) {
                return Ok(explicit);
            }
            return Err(CoreError::ProviderNotFound {
                name: explicit,
                available: choices.to_vec(),
            });
        }

        if let Some(default) = route_default {
            let default = default.to_ascii_lowercase();
            if choices.contains(&default) {
                return Ok(default);
            }
            warn!(provider = %default, "configured default provider does not serve this route");
        }

        choices.first().cloned().ok_or_else(|| CoreError::ProviderNotFound {
            name: String::from("<none>"),
            available: Vec::new(),
        })
    }

    fn split_params(
        standard: &Schema,
        extras: &[ExtraParam],
        provider: &str,
        params: Params,
    ) -> Result<(Params, Params, Vec<Warning>), CoreError> {
        let mut standard_params = Params::new();
        let mut extra_params = Params::new();
        let mut warnings = Vec::new();

        for (name, value) in params {
            if standard.field(&name).is_some() {
                standard_params.insert(name, value);
                continue;
            }
            let Some(extra) = extras.iter().find(|extra| extra.name == name) else {
                return Err(ValidationError::UnknownParameter { name }.into());
            };
            if extra.providers.iter().any(|supported| supported == provider) {
                extra_params.insert(name, value);
            } else if !value.is_null() {
                debug!(parameter = %name, provider, "dropping unsupported extra parameter");
                warnings.push(Warning::platform(format!(
                    "Parameter '{name}' is not supported by provider '{provider}'. It will be ignored."
                ))?);
            }
        }

        Ok((standard_params, extra_params, warnings))
    }

    fn extra_schema(extras: &[ExtraParam], provider: &str) -> Schema {
        let fields = extras
            .iter()
            .filter(|extra| extra.providers.iter().any(|supported| supported == provider))
            .map(|extra| Field::optional(&extra.name, extra.kind, &extra.description))
            .collect();
        Schema::new("ExtraParams", fields)
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn standard_params(&self) -> &Params {
        &self.standard_params
    }

    pub fn extra_params(&self) -> &Params {
        &self.extra_params
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Standard and extra parameters merged into the fetcher's flat input.
    pub fn params(&self) -> Params {
        let mut merged = self.standard_params.clone();
        merged.extend(self.extra_params.clone());
        merged
    }

    /// Runs the query through the executor, returning records and accumulated warnings.
    pub async fn execute(self) -> Result<(Vec<Value>, Vec<Warning>), CoreError> {
        let options = FetchOptions {
            timeout_ms: self.cc.settings.timeout_ms,
            passthrough: self.passthrough.clone(),
        };
        let records = self
            .cc
            .executor
            .execute(
                &self.provider,
                self.model,
                self.params(),
                Some(&self.credentials),
                options,
            )
            .await?;
        Ok((records, self.warnings))
    }
}
