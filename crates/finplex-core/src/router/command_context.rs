use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::RouteDefaults;
use crate::executor::QueryExecutor;
use crate::provider_interface::ProviderInterface;
use crate::router::command_map::CommandMap;
use crate::secret::SecretMap;

/// Platform settings visible to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SystemSettings {
    pub debug_mode: bool,
    pub timeout_ms: u64,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            debug_mode: false,
            timeout_ms: 10_000,
        }
    }
}

/// State handed to every command as `cc`.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub executor: QueryExecutor,
    pub interface: Arc<ProviderInterface>,
    pub credentials: SecretMap,
    /// Route path to its configured defaults.
    pub defaults: Arc<BTreeMap<String, RouteDefaults>>,
    pub settings: SystemSettings,
    /// Every registered command, once composition has finished.
    pub commands: Option<Arc<CommandMap>>,
}

impl CommandContext {
    pub fn new(executor: QueryExecutor, interface: Arc<ProviderInterface>) -> Self {
        Self {
            executor,
            interface,
            credentials: SecretMap::new(),
            defaults: Arc::new(BTreeMap::new()),
            settings: SystemSettings::default(),
            commands: None,
        }
    }

    pub fn with_credentials(mut self, credentials: SecretMap) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_defaults(mut self, defaults: Arc<BTreeMap<String, RouteDefaults>>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_settings(mut self, settings: SystemSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_commands(mut self, commands: Arc<CommandMap>) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Configured default provider for `path`, if any.
    pub fn default_provider(&self, path: &str) -> Option<&str> {
        self.defaults
            .get(path)
            .and_then(|defaults| defaults.provider.as_deref())
            .filter(|provider| !provider.trim().is_empty())
    }
}
