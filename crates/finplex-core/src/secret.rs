use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const MASK: &str = "**********";

/// Credential-name to secret mapping as supplied by callers.
pub type SecretMap = BTreeMap<String, SecretString>;

/// String secret whose `Debug`, `Display` and `Serialize` forms are always redacted.
///
/// The raw value is only reachable through [`SecretString::expose_secret`].
#[derive(Clone, PartialEq, Eq, Default)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Debug for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretString(\"{MASK}\")")
    }
}

impl Display for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(MASK)
    }
}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(MASK)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting_never_reveals_value() {
        let secret = SecretString::new("hunter2");

        assert_eq!(secret.to_string(), MASK);
        assert!(!format!("{secret:?}").contains("hunter2"));
        assert_eq!(
            serde_json::to_string(&secret).expect("serializes"),
            format!("\"{MASK}\"")
        );
        assert_eq!(secret.expose_secret(), "hunter2");
    }

    #[test]
    fn deserializes_raw_value() {
        let secret: SecretString = serde_json::from_str("\"abc\"").expect("deserializes");
        assert_eq!(secret.expose_secret(), "abc");
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        assert!(SecretString::new("  ").is_empty());
        assert!(!SecretString::new("k").is_empty());
    }
}
