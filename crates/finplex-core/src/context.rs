//! Assembled platform: registry, provider interface, credentials and command map.
//!
//! A [`Platform`] is built once and shared read-only. The process-wide instance
//! lives behind [`Platform::global`]; [`Platform::replace_global`] builds a fresh
//! one and swaps the cached reference atomically.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::adapters;
use crate::config::{process_env, EnvLookup, PlatformConfig};
use crate::credentials::{Credentials, CredentialsLoader};
use crate::envelope::{Envelope, ErrorResponse};
use crate::executor::QueryExecutor;
use crate::extension::{EnvelopeExtension, INSTALLED_ENVELOPE_EXTENSIONS};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::provider_interface::ProviderInterface;
use crate::registry::{ProviderContext, ProviderExtension, Registry, RegistryLoader};
use crate::retry::RetryingHttpClient;
use crate::router::{CommandContext, CommandInput, CommandMap, RegistrationContext, RouterExtension, RouterLoader};
use crate::routers;
use crate::secret::SecretString;
use crate::standard_models::{self, ModelInfo};
use crate::{CoreError, ValidationError};

/// Init-once, swappable shared value.
pub struct Shared<T> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T> Shared<T> {
    pub const fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the cached value, building it with `init` on first use.
    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<Arc<T>, E> {
        if let Some(value) = self.get() {
            return Ok(value);
        }
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(init()?);
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    /// Replaces the cached value, returning the previous one.
    pub fn swap(&self, value: T) -> Option<Arc<T>> {
        self.swap_arc(Arc::new(value))
    }

    pub fn swap_arc(&self, value: Arc<T>) -> Option<Arc<T>> {
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(value)
    }
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self::new()
    }
}

static PLATFORM: Shared<Platform> = Shared::new();

/// Status and JSON body of a command response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResponse {
    pub status: u16,
    pub body: Value,
}

#[derive(Debug)]
pub struct Platform {
    config: PlatformConfig,
    registry: Arc<Registry>,
    interface: Arc<ProviderInterface>,
    credentials: Credentials,
    command_map: Arc<CommandMap>,
}

impl Platform {
    pub fn builder() -> PlatformBuilder {
        PlatformBuilder::default()
    }

    /// The process-wide platform, built from the environment on first use.
    pub fn global() -> Result<Arc<Self>, CoreError> {
        PLATFORM.get_or_try_init(|| Self::builder().build())
    }

    /// Installs `platform` as the process-wide instance.
    pub fn replace_global(platform: Platform) -> Arc<Self> {
        let platform = Arc::new(platform);
        PLATFORM.swap_arc(Arc::clone(&platform));
        platform
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn interface(&self) -> &ProviderInterface {
        &self.interface
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn set_credential(&mut self, name: &str, value: impl Into<SecretString>) -> Result<(), ValidationError> {
        self.credentials.set(name, value)
    }

    pub fn command_map(&self) -> &CommandMap {
        &self.command_map
    }

    /// Context handed to handlers as `cc`.
    pub fn command_context(&self) -> CommandContext {
        CommandContext::new(
            QueryExecutor::new(Arc::clone(&self.registry)),
            Arc::clone(&self.interface),
        )
        .with_credentials(self.credentials.to_secret_map())
        .with_defaults(Arc::new(self.config.defaults.routes.clone()))
        .with_settings(self.config.system_settings())
        .with_commands(Arc::clone(&self.command_map))
    }

    /// Invokes the route at `path`.
    pub async fn call(&self, path: &str, input: CommandInput) -> Result<Envelope<Value>, CoreError> {
        let route = self
            .command_map
            .get_command(path)
            .ok_or_else(|| CoreError::RouteNotFound {
                path: path.to_owned(),
            })?;
        let cc = self.command_context();
        debug!(route = %route.path, provider = ?input.provider, "calling route");
        route.handler.call(&cc, route, input).await
    }

    /// Invokes the route at `path` and renders the envelope or the error body.
    pub async fn respond(&self, path: &str, input: CommandInput) -> CommandResponse {
        let outcome = self
            .call(path, input)
            .await
            .and_then(|envelope| serde_json::to_value(envelope).map_err(CoreError::from));
        match outcome {
            Ok(body) => CommandResponse { status: 200, body },
            Err(error) => CommandResponse {
                status: error.status_code(),
                body: serde_json::to_value(ErrorResponse::from_error(&error)).unwrap_or(Value::Null),
            },
        }
    }
}

/// Builds a [`Platform`] from extension tables and configuration.
pub struct PlatformBuilder {
    config: Option<PlatformConfig>,
    http_client: Option<Arc<dyn HttpClient>>,
    provider_extensions: Vec<ProviderExtension>,
    router_extensions: Vec<RouterExtension>,
    envelope_extensions: Vec<EnvelopeExtension>,
    models: Vec<ModelInfo>,
    env: EnvLookup,
}

impl Default for PlatformBuilder {
    fn default() -> Self {
        Self {
            config: None,
            http_client: None,
            provider_extensions: adapters::INSTALLED_PROVIDERS.to_vec(),
            router_extensions: routers::INSTALLED_ROUTERS.to_vec(),
            envelope_extensions: INSTALLED_ENVELOPE_EXTENSIONS.to_vec(),
            models: standard_models::catalogue(),
            env: process_env(),
        }
    }
}

impl PlatformBuilder {
    /// Uses `config` instead of loading settings file and environment.
    pub fn with_config(mut self, config: PlatformConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn with_provider_extensions(mut self, extensions: &[ProviderExtension]) -> Self {
        self.provider_extensions = extensions.to_vec();
        self
    }

    pub fn with_router_extensions(mut self, extensions: &[RouterExtension]) -> Self {
        self.router_extensions = extensions.to_vec();
        self
    }

    pub fn with_envelope_extensions(mut self, extensions: &[EnvelopeExtension]) -> Self {
        self.envelope_extensions = extensions.to_vec();
        self
    }

    /// Standard models that providers may serve and routes may bind to.
    pub fn with_models(mut self, models: Vec<ModelInfo>) -> Self {
        self.models = models;
        self
    }

    /// Environment used for configuration and credential values.
    pub fn with_env_lookup(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    pub fn build(self) -> Result<Platform, CoreError> {
        let config = match self.config {
            Some(config) => config,
            None => PlatformConfig::load_with(&self.env)?,
        };

        let http_client = self.http_client.unwrap_or_else(|| {
            Arc::new(RetryingHttpClient::new(
                Arc::new(ReqwestHttpClient::new()),
                config.http.retry.to_retry_config(),
            ))
        });
        let registry = Arc::new(RegistryLoader::from_extensions(
            &self.provider_extensions,
            &ProviderContext { http_client },
        )?);
        let interface = Arc::new(ProviderInterface::new(&registry, &self.models)?);

        let mut loader = CredentialsLoader::new();
        loader.from_providers(&interface);
        loader.from_extensions(&self.envelope_extensions)?;
        let mut credentials = loader.load();
        credentials.apply_configured(&config.credentials);
        credentials.load_values(|name| config.credential_value(name, &self.env));

        let router = RouterLoader::from_extensions(
            &self.router_extensions,
            &RegistrationContext {
                interface: &interface,
                debug_mode: config.debug_mode,
            },
        )?;
        let command_map = Arc::new(CommandMap::new(router, Arc::clone(&interface)));

        info!(
            providers = registry.len(),
            routes = command_map.len(),
            credentials = credentials.names().count(),
            debug_mode = config.debug_mode,
            "platform ready"
        );

        Ok(Platform {
            config,
            registry,
            interface,
            credentials,
            command_map,
        })
    }
}
