//! Identity records for units
//!
//! A [`Dna`] is created once per unit instance and never mutated. Evolution
//! allocates a new record whose `parent` is a copy of the previous one, so
//! records form an immutable, singly-linked lineage chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, UnitError};

/// Separator between a teacher's id and a learned capability name
pub const NAMESPACE_SEPARATOR: char = '.';

/// Version assigned when a configuration does not name one
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Immutable identity of a unit instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dna {
    id: String,
    version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<Box<Dna>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl Dna {
    /// Create a root identity, validating both id and version
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let version = version.into();
        validate_id(&id)?;
        validate_version(&id, &version)?;

        Ok(Self {
            id,
            version,
            parent: None,
            description: None,
            created_at: Utc::now(),
        })
    }

    /// Attach a human-readable description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Derive the identity of an evolved unit.
    ///
    /// The new record gets `new_id`, the patch component of this version
    /// incremented, this record (copied) as parent and the same description.
    pub fn evolve(&self, new_id: impl Into<String>) -> Result<Self> {
        let id = new_id.into();
        validate_id(&id)?;
        let version = bump_patch(&self.id, &self.version)?;

        Ok(Self {
            id,
            version,
            parent: Some(Box::new(self.clone())),
            description: self.description.clone(),
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn parent(&self) -> Option<&Dna> {
        self.parent.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Ancestors, nearest first
    pub fn lineage(&self) -> Lineage<'_> {
        Lineage {
            next: self.parent(),
        }
    }

    /// Number of evolutions separating this record from its root (0 = root)
    pub fn generation(&self) -> usize {
        self.lineage().count()
    }

    /// The oldest ancestor, or `self` for a root identity
    pub fn root(&self) -> &Dna {
        self.lineage().last().unwrap_or(self)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl fmt::Display for Dna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

/// Iterator over the ancestors of a [`Dna`]
#[derive(Debug, Clone)]
pub struct Lineage<'a> {
    next: Option<&'a Dna>,
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a Dna;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

/// Check a unit id: non-empty, lowercase, starts with a letter,
/// `[a-z0-9-]` only. Dots are reserved for namespacing.
pub fn validate_id(id: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(UnitError::InvalidIdentity {
            id: id.to_string(),
            reason: reason.to_string(),
        })
    };

    let Some(first) = id.chars().next() else {
        return reject("id must not be empty");
    };
    if id.contains(NAMESPACE_SEPARATOR) {
        return reject("'.' is reserved as the namespace separator");
    }
    if id.chars().any(|c| c.is_uppercase()) {
        return reject("id must be lowercase");
    }
    if !first.is_ascii_lowercase() {
        return reject("id must start with a letter");
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return reject(&format!(
            "invalid character {bad:?} (allowed: a-z, 0-9, '-')"
        ));
    }
    Ok(())
}

fn validate_version(unit: &str, version: &str) -> Result<()> {
    let numeric = !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if numeric {
        Ok(())
    } else {
        Err(UnitError::InvalidVersion {
            unit: unit.to_string(),
            version: version.to_string(),
        })
    }
}

/// Increment the patch component of a dotted version.
///
/// Versions with fewer than three components are padded with zeros first
/// (`"1"` → `"1.0.1"`, `"1.2"` → `"1.2.1"`); longer ones bump the third
/// component and keep the rest.
pub fn bump_patch(unit: &str, version: &str) -> Result<String> {
    validate_version(unit, version)?;
    let invalid = || UnitError::InvalidVersion {
        unit: unit.to_string(),
        version: version.to_string(),
    };

    let mut parts = version
        .split('.')
        .map(|p| p.parse::<u64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>>>()?;
    while parts.len() < 3 {
        parts.push(0);
    }
    parts[2] = parts[2].checked_add(1).ok_or_else(invalid)?;

    Ok(parts
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join("."))
}

/// Key under which a learned entry is stored: `<unit_id>.<name>`
pub fn namespaced(unit_id: &str, name: &str) -> String {
    format!("{unit_id}{NAMESPACE_SEPARATOR}{name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_create_root() {
        let dna = Dna::new("calculator", "1.0.0").unwrap();
        assert!(dna.is_root());
        assert_eq!(dna.generation(), 0);
        assert_eq!(dna.to_string(), "calculator@1.0.0");
    }

    #[test]
    fn test_rejects_bad_ids() {
        for id in ["", "Calculator", "9lives", "two words", "calc.v2", "under_score"] {
            let err = Dna::new(id, "1.0.0").unwrap_err();
            assert!(
                matches!(err, UnitError::InvalidIdentity { .. }),
                "{id:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_accepts_hyphens_and_digits() {
        assert!(validate_id("string-utils-2").is_ok());
    }

    #[test]
    fn test_rejects_bad_version() {
        for version in ["", "1..0", "v1.0", "1.0.x"] {
            assert!(matches!(
                Dna::new("calc", version),
                Err(UnitError::InvalidVersion { .. })
            ));
        }
    }

    #[test]
    fn test_bump_patch() {
        assert_eq!(bump_patch("u", "1.0.0").unwrap(), "1.0.1");
        assert_eq!(bump_patch("u", "2.4.9").unwrap(), "2.4.10");
        assert_eq!(bump_patch("u", "1").unwrap(), "1.0.1");
        assert_eq!(bump_patch("u", "1.2").unwrap(), "1.2.1");
        assert_eq!(bump_patch("u", "1.2.3.4").unwrap(), "1.2.4.4");
    }

    #[test]
    fn test_evolve_links_parent() {
        let root = Dna::new("seed", "1.0.0")
            .unwrap()
            .with_description("first of its line");
        let child = root.evolve("sprout").unwrap();

        assert_eq!(child.id(), "sprout");
        assert_eq!(child.version(), "1.0.1");
        assert_eq!(child.parent().map(Dna::id), Some("seed"));
        assert_eq!(child.description(), Some("first of its line"));
        assert!(root.is_root());
    }

    #[test]
    fn test_lineage_and_root() {
        let a = Dna::new("a", "1.0.0").unwrap();
        let d = a.evolve("b").unwrap().evolve("c").unwrap().evolve("d").unwrap();

        let ids: Vec<_> = d.lineage().map(Dna::id).collect();
        assert_eq!(ids, ["c", "b", "a"]);
        assert_eq!(d.generation(), 3);
        assert_eq!(d.root().id(), "a");
        assert_eq!(d.version(), "1.0.3");
    }

    #[test]
    fn test_evolve_rejects_bad_id() {
        let a = Dna::new("a", "1.0.0").unwrap();
        assert!(a.evolve("A.b").is_err());
    }

    #[test]
    fn test_namespaced() {
        assert_eq!(namespaced("calculator", "add"), "calculator.add");
    }

    proptest! {
        #[test]
        fn prop_valid_ids_accepted(id in "[a-z][a-z0-9-]{0,20}") {
            prop_assert!(validate_id(&id).is_ok());
        }

        #[test]
        fn prop_ids_with_dots_rejected(a in "[a-z]{1,8}", b in "[a-z0-9]{1,8}") {
            let id = format!("{a}.{b}");
            prop_assert!(validate_id(&id).is_err());
        }

        #[test]
        fn prop_bump_increments_patch(major in 0u64..1000, minor in 0u64..1000, patch in 0u64..1000) {
            let bumped = bump_patch("u", &format!("{major}.{minor}.{patch}")).unwrap();
            prop_assert_eq!(bumped, format!("{}.{}.{}", major, minor, patch + 1));
        }
    }
}
