//! Envelope extensions: optional add-ons that only contribute credential names.
//!
//! Router extensions live in [`crate::router::RouterExtension`] and provider
//! extensions in [`crate::registry::ProviderExtension`].

use crate::CoreError;

/// One entry of the installed envelope-extension table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeExtension {
    pub name: &'static str,
    pub description: &'static str,
    /// Full credential names, used as given.
    pub credentials: &'static [&'static str],
}

impl EnvelopeExtension {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        credentials: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            description,
            credentials,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::loading(self.name, "extension name cannot be empty"));
        }
        if self.credentials.iter().any(|name| name.trim().is_empty()) {
            return Err(CoreError::loading(self.name, "extension declares an empty credential name"));
        }
        Ok(())
    }
}

/// Envelope extensions compiled into this build. None ship by default.
pub const INSTALLED_ENVELOPE_EXTENSIONS: &[EnvelopeExtension] = &[];
