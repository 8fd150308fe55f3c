use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::Serialize;
use tracing::{debug, warn};

use crate::extension::EnvelopeExtension;
use crate::provider_interface::ProviderInterface;
use crate::secret::{SecretMap, SecretString};
use crate::{CoreError, ValidationError};

/// Which declaration claimed a credential name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialOrigin {
    Providers,
    Extensions,
}

impl CredentialOrigin {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Providers => "providers",
            Self::Extensions => "extensions",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialField {
    pub origin: CredentialOrigin,
    pub value: Option<SecretString>,
}

/// Collects credential names: providers first, then envelope extensions.
///
/// A name already claimed keeps its first origin; later declarations of it are merged.
#[derive(Debug, Default)]
pub struct CredentialsLoader {
    names: BTreeMap<String, CredentialOrigin>,
}

impl CredentialsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_providers(&mut self, interface: &ProviderInterface) {
        for name in interface.credentials() {
            self.claim(name, CredentialOrigin::Providers);
        }
    }

    pub fn from_extensions(&mut self, extensions: &[EnvelopeExtension]) -> Result<(), CoreError> {
        let mut ordered = extensions.to_vec();
        ordered.sort_by_key(|extension| extension.name);
        for extension in ordered {
            extension.validate()?;
            for name in extension.credentials {
                self.claim(name, CredentialOrigin::Extensions);
            }
        }
        Ok(())
    }

    fn claim(&mut self, name: &str, origin: CredentialOrigin) {
        let name = name.trim();
        match self.names.get(name) {
            Some(existing) if *existing != origin => {
                debug!(credential = name, kept = existing.as_str(), "credential name already claimed");
            }
            Some(_) => {}
            None => {
                self.names.insert(name.to_owned(), origin);
            }
        }
    }

    pub fn load(self) -> Credentials {
        Credentials {
            fields: self
                .names
                .into_iter()
                .map(|(name, origin)| (name, CredentialField { origin, value: None }))
                .collect(),
        }
    }
}

/// Every known credential name with its optional, masked value.
///
/// `Display` and `Debug` never print a value; use [`Credentials::reveal`] for that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Credentials {
    fields: BTreeMap<String, CredentialField>,
}

impl Credentials {
    /// Sorted credential names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn origin(&self, name: &str) -> Option<CredentialOrigin> {
        self.fields.get(name).map(|field| field.origin)
    }

    pub fn get(&self, name: &str) -> Option<&SecretString> {
        self.fields.get(name).and_then(|field| field.value.as_ref())
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|secret| !secret.is_empty())
    }

    /// Assigns a value to a known credential.
    pub fn set(&mut self, name: &str, value: impl Into<SecretString>) -> Result<(), ValidationError> {
        let field = self
            .fields
            .get_mut(name)
            .ok_or_else(|| ValidationError::UnknownCredential {
                name: name.to_owned(),
            })?;
        field.value = Some(value.into());
        Ok(())
    }

    /// Fills values from `lookup`, which is asked once per known name.
    /// Names `lookup` does not know keep their current value.
    pub fn load_values<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (name, field) in &mut self.fields {
            if let Some(value) = lookup(name).filter(|value| !value.trim().is_empty()) {
                field.value = Some(SecretString::new(value));
            }
        }
    }

    /// Applies configured values, skipping names no provider or extension declares.
    pub fn apply_configured(&mut self, values: &SecretMap) {
        for (name, value) in values {
            if self.set(name, value.clone()).is_err() {
                warn!(credential = %name, "ignoring configured value for unknown credential");
            }
        }
    }

    /// Present values, as handed to the executor.
    pub fn to_secret_map(&self) -> SecretMap {
        self.fields
            .iter()
            .filter_map(|(name, field)| field.value.clone().map(|value| (name.clone(), value)))
            .collect()
    }

    /// Renders every value unmasked, one `name: value` line per credential, sorted by name.
    pub fn reveal(&self) -> String {
        self.render(|field| {
            field
                .value
                .as_ref()
                .map(|secret| secret.expose_secret().to_owned())
                .unwrap_or_else(|| String::from("None"))
        })
    }

    /// Masked rendering with each credential's origin.
    pub fn describe(&self) -> String {
        self.render(|field| {
            let value = field
                .value
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| String::from("None"));
            format!("{value} ({})", field.origin.as_str())
        })
    }

    fn render(&self, value: impl Fn(&CredentialField) -> String) -> String {
        let mut out = String::from("Credentials\n");
        for (name, field) in &self.fields {
            out.push('\n');
            out.push_str(name);
            out.push_str(": ");
            out.push_str(&value(field));
        }
        out
    }
}

impl Display for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(|field| {
            field
                .value
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| String::from("None"))
        }))
    }
}
