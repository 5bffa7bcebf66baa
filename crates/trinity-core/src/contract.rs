//! Teaching contracts exchanged between units
//!
//! A contract is a snapshot: `teach()` copies the teacher's registries at
//! call time. Capability handles inside are shared (`Arc`), the maps are not,
//! so later changes to the teacher never leak into a contract.

use serde::Serialize;

use crate::capability::CapabilityRegistry;
use crate::schema::SchemaRegistry;

/// Capabilities and schemas a unit exposes for others to learn
#[derive(Debug, Clone)]
pub struct TeachingContract {
    /// Id of the teaching unit; becomes the namespace of learned entries
    pub unit_id: String,
    pub capabilities: CapabilityRegistry,
    pub schema: SchemaRegistry,
}

impl TeachingContract {
    pub fn new(
        unit_id: impl Into<String>,
        capabilities: CapabilityRegistry,
        schema: SchemaRegistry,
    ) -> Self {
        Self {
            unit_id: unit_id.into(),
            capabilities,
            schema,
        }
    }

    /// Narrow the contract to `names`; unknown names are ignored
    pub fn only<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let keep = |name: &str| names.iter().any(|n| n.as_ref() == name);

        let mut narrowed = self.clone();
        narrowed.capabilities.retain(keep);
        narrowed.schema.retain(keep);
        narrowed
    }

    /// Capability names carried by the contract
    pub fn names(&self) -> Vec<String> {
        self.capabilities.list()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty() && self.schema.is_empty()
    }
}

/// Advisory outcome of [`Validator::validate_compatibility`](crate::Validator::validate_compatibility)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Compatibility {
    pub is_compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Compatibility {
    pub fn compatible() -> Self {
        Self {
            is_compatible: true,
            reason: None,
        }
    }

    pub fn incompatible(reason: impl Into<String>) -> Self {
        Self {
            is_compatible: false,
            reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capability;
    use crate::schema::ToolSchema;
    use serde_json::json;

    fn contract() -> TeachingContract {
        let mut capabilities = CapabilityRegistry::new("text");
        let mut schema = SchemaRegistry::new("text");
        for name in ["upper", "lower", "reverse"] {
            capabilities
                .add(name, Capability::sync(|_| Ok(json!(null))))
                .unwrap();
            schema
                .add(name, ToolSchema::new(name, format!("{name} a string")))
                .unwrap();
        }
        TeachingContract::new("text", capabilities, schema)
    }

    #[test]
    fn test_only_filters_both_registries() {
        let subset = contract().only(&["upper", "reverse", "missing"]);

        assert_eq!(subset.unit_id, "text");
        assert_eq!(subset.names(), vec!["upper", "reverse"]);
        assert_eq!(subset.schema.list(), vec!["upper", "reverse"]);
    }

    #[test]
    fn test_empty() {
        let empty = contract().only::<&str>(&[]);
        assert!(empty.is_empty());
        assert!(!contract().is_empty());
    }

    #[test]
    fn test_compatibility_constructors() {
        assert!(Compatibility::compatible().is_compatible);
        let refused = Compatibility::incompatible("missing schema for 'foo'");
        assert!(!refused.is_compatible);
        assert!(refused.reason.unwrap().contains("foo"));
    }
}
