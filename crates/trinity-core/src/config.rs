//! Configuration passed to unit factories

use serde::{Deserialize, Serialize};
use std::env;

use crate::dna::{Dna, DEFAULT_VERSION};
use crate::error::Result;

/// Everything a unit factory needs to build an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitConfig {
    /// Unit id (lowercase, `[a-z][a-z0-9-]*`)
    pub id: String,
    /// Dotted numeric version (default: 1.0.0)
    pub version: String,
    /// Optional human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Enforce schemas on validated execution
    #[serde(default)]
    pub strict: bool,
}

impl UnitConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: DEFAULT_VERSION.to_string(),
            description: None,
            strict: false,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Load version and strictness from the environment
    ///
    /// - `TRINITY_UNIT_VERSION` - version (default: 1.0.0)
    /// - `TRINITY_STRICT` - `1`/`true` enables strict mode
    pub fn from_env(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: env::var("TRINITY_UNIT_VERSION")
                .unwrap_or_else(|_| DEFAULT_VERSION.to_string()),
            description: None,
            strict: env::var("TRINITY_STRICT")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    /// Validated identity for this configuration
    pub fn dna(&self) -> Result<Dna> {
        let dna = Dna::new(&self.id, &self.version)?;
        Ok(match &self.description {
            Some(description) => dna.with_description(description),
            None => dna,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnitError;

    #[test]
    fn test_defaults() {
        let config = UnitConfig::new("calculator");
        assert_eq!(config.version, "1.0.0");
        assert!(!config.strict);
        assert!(config.description.is_none());
    }

    #[test]
    fn test_dna_carries_description() {
        let dna = UnitConfig::new("calculator")
            .with_version("2.1.0")
            .with_description("Basic arithmetic")
            .dna()
            .unwrap();
        assert_eq!(dna.version(), "2.1.0");
        assert_eq!(dna.description(), Some("Basic arithmetic"));
    }

    #[test]
    fn test_dna_rejects_bad_id() {
        let err = UnitConfig::new("Calculator").dna().unwrap_err();
        assert!(matches!(err, UnitError::InvalidIdentity { .. }));
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: UnitConfig =
            serde_json::from_str(r#"{"id": "math", "version": "0.3.0"}"#).unwrap();
        assert_eq!(config.id, "math");
        assert!(!config.strict);
    }
}
