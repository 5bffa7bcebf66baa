//! Unit with no native capabilities
//!
//! Everything a composite can do it has learned from other units, so all of
//! its capabilities live under `<teacher>.<name>`.

use async_trait::async_trait;

use crate::error::Result;
use crate::unit::{Unit, UnitCore, UnitSeed};

#[derive(Debug)]
pub struct CompositeUnit {
    core: UnitCore,
}

#[async_trait]
impl Unit for CompositeUnit {
    fn assemble(seed: UnitSeed) -> Result<Self> {
        let core = seed.builder().build()?;
        Ok(Self { core })
    }

    fn core(&self) -> &UnitCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut UnitCore {
        &mut self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnitConfig;

    #[test]
    fn test_starts_empty() {
        let unit = CompositeUnit::create(UnitConfig::new("math")).unwrap();
        assert!(unit.capabilities().is_empty());
        assert!(unit.is_valid());
        assert_eq!(unit.whoami(), "[math] Unit v1.0.0");
    }

    #[test]
    fn test_rejects_bad_id() {
        assert!(CompositeUnit::create(UnitConfig::new("Math Unit")).is_err());
    }
}
