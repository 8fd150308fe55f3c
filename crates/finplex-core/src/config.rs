//! Platform configuration.
//!
//! Sources, lowest to highest precedence: built-in defaults, the user settings file,
//! environment variables. CLI flags are applied on top by the caller.
//!
//! | Setting | Environment variable |
//! |---------|----------------------|
//! | settings file | `FINPLEX_USER_SETTINGS` (default `~/.finplex/user_settings.json`) |
//! | debug mode | `FINPLEX_DEBUG_MODE` |
//! | HTTP timeout | `FINPLEX_TIMEOUT_MS` |
//! | credential `<name>` | `FINPLEX_<NAME>`, falling back to `<NAME>` |

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::retry::RetryConfig;
use crate::router::SystemSettings;
use crate::secret::SecretMap;
use crate::CoreError;

pub const SETTINGS_ENV: &str = "FINPLEX_USER_SETTINGS";
pub const DEBUG_MODE_ENV: &str = "FINPLEX_DEBUG_MODE";
pub const TIMEOUT_ENV: &str = "FINPLEX_TIMEOUT_MS";
const ENV_PREFIX: &str = "FINPLEX_";

/// Environment lookup, replaceable in tests.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads the process environment.
pub fn process_env() -> EnvLookup {
    Arc::new(|name| std::env::var(name).ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Skip routes bound to unknown models instead of failing startup.
    pub debug_mode: bool,
    pub http: HttpSettings,
    pub defaults: DefaultsSettings,
    /// Credential name to value. Values here are overridden by the environment.
    pub credentials: SecretMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_ms: u64,
    pub retry: RetrySettings,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            retry: RetrySettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 100,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        if self.max_retries == 0 {
            return RetryConfig::no_retry();
        }
        RetryConfig::exponential(self.max_retries, Duration::from_millis(self.base_delay_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsSettings {
    /// Route path to its defaults.
    pub routes: BTreeMap<String, RouteDefaults>,
}

/// Per-route defaults, keyed by route path.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouteDefaults {
    #[serde(default)]
    pub provider: Option<String>,
}

impl PlatformConfig {
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let raw = fs::read_to_string(path)
            .map_err(|err| CoreError::Config(format!("cannot read '{}': {err}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|err| CoreError::Config(format!("invalid settings in '{}': {err}", path.display())))
    }

    /// `~/.finplex/user_settings.json`, when a home directory is known.
    pub fn default_settings_path(lookup: &EnvLookup) -> Option<PathBuf> {
        lookup("HOME")
            .or_else(|| lookup("USERPROFILE"))
            .filter(|home| !home.trim().is_empty())
            .map(|home| PathBuf::from(home).join(".finplex").join("user_settings.json"))
    }

    /// Defaults, then the settings file, then the process environment.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_with(&process_env())
    }

    /// Same as [`PlatformConfig::load`] with an explicit environment.
    ///
    /// An explicitly named settings file must exist; the default one is optional.
    pub fn load_with(lookup: &EnvLookup) -> Result<Self, CoreError> {
        let mut config = match lookup(SETTINGS_ENV).filter(|path| !path.trim().is_empty()) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => match Self::default_settings_path(lookup) {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env_with(lookup)?;
        Ok(config)
    }

    pub fn apply_env_with(&mut self, lookup: &EnvLookup) -> Result<(), CoreError> {
        if let Some(raw) = lookup(DEBUG_MODE_ENV) {
            self.debug_mode = parse_flag(DEBUG_MODE_ENV, &raw)?;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            self.http.timeout_ms = raw
                .trim()
                .parse()
                .map_err(|_| CoreError::Config(format!("{TIMEOUT_ENV} must be an integer, got '{raw}'")))?;
        }
        debug!(debug_mode = self.debug_mode, timeout_ms = self.http.timeout_ms, "configuration loaded");
        Ok(())
    }

    /// Value for credential `name`: `FINPLEX_<NAME>`, then `<NAME>`, then the settings file.
    pub fn credential_value(&self, name: &str, lookup: &EnvLookup) -> Option<String> {
        let upper = name.to_ascii_uppercase();
        lookup(&format!("{ENV_PREFIX}{upper}"))
            .or_else(|| lookup(&upper))
            .filter(|value| !value.trim().is_empty())
            .or_else(|| {
                self.credentials
                    .get(name)
                    .map(|secret| secret.expose_secret().to_owned())
            })
    }

    pub fn system_settings(&self) -> SystemSettings {
        SystemSettings {
            debug_mode: self.debug_mode,
            timeout_ms: self.http.timeout_ms,
        }
    }

    pub fn set_default_provider(&mut self, path: &str, provider: &str) {
        self.defaults
            .routes
            .entry(path.to_owned())
            .or_default()
            .provider = Some(provider.to_owned());
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, CoreError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => {
            warn!(variable = name, value = other, "unrecognized boolean value");
            Err(CoreError::Config(format!("{name} must be a boolean, got '{other}'")))
        }
    }
}
