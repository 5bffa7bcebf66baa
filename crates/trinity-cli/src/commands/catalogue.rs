//! Built-in units available from the command line

use anyhow::{bail, Context, Result};
use tracing::debug;

use trinity_core::units::{CalculatorUnit, CompositeUnit};
use trinity_core::{Unit, UnitConfig, UnitCore};

/// Names and one-line summaries of every built-in unit
pub const BUILTIN: &[(&str, &str)] = &[
    (CalculatorUnit::DEFAULT_ID, "Two-operand arithmetic"),
    ("math", "Composite that has learned the calculator"),
];

/// A built-in unit of any concrete type
pub enum BuiltinUnit {
    Calculator(CalculatorUnit),
    Composite(CompositeUnit),
}

impl BuiltinUnit {
    /// Build a built-in unit by name.
    ///
    /// `TRINITY_UNIT_VERSION` and `TRINITY_STRICT` are honoured; `strict`
    /// can only switch strict mode on.
    pub fn load(name: &str, strict: bool) -> Result<Self> {
        let config = |id: &str| {
            let config = UnitConfig::from_env(id);
            let strict = strict || config.strict;
            config.strict(strict)
        };

        debug!(unit = name, strict, "Loading built-in unit");
        match name {
            "calculator" => Ok(Self::Calculator(CalculatorUnit::create(config(name))?)),
            "math" => {
                let calculator = CalculatorUnit::create(config(CalculatorUnit::DEFAULT_ID))?;
                let mut math = CompositeUnit::create(
                    config(name).with_description("Arithmetic learned from the calculator"),
                )?;
                math.learn(&[calculator.teach()])
                    .context("math could not learn from calculator")?;
                Ok(Self::Composite(math))
            }
            other => bail!(
                "Unit '{}' not found. Run 'trinity units list' to see available units.",
                other
            ),
        }
    }

    /// Every built-in unit, in catalogue order
    pub fn all(strict: bool) -> Result<Vec<Self>> {
        BUILTIN
            .iter()
            .map(|(name, _)| Self::load(name, strict))
            .collect()
    }

    pub fn core(&self) -> &UnitCore {
        match self {
            Self::Calculator(unit) => unit.core(),
            Self::Composite(unit) => unit.core(),
        }
    }

    pub fn evolve(&self, new_id: &str) -> trinity_core::Result<Self> {
        Ok(match self {
            Self::Calculator(unit) => Self::Calculator(unit.evolve(new_id, None)?),
            Self::Composite(unit) => Self::Composite(unit.evolve(new_id, None)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_loads() {
        let units = BuiltinUnit::all(false).unwrap();
        assert_eq!(units.len(), BUILTIN.len());
        assert!(units.iter().all(|unit| unit.core().is_valid()));
    }

    #[test]
    fn test_math_has_learned_calculator() {
        let math = BuiltinUnit::load("math", false).unwrap();
        assert!(math.core().can("calculator.add"));
        assert!(!math.core().can("add"));
    }

    #[test]
    fn test_unknown_unit() {
        let err = BuiltinUnit::load("abacus", false).err().unwrap();
        assert!(err.to_string().contains("'abacus' not found"));
    }

    #[test]
    fn test_evolve_keeps_variant() {
        let calculator = BuiltinUnit::load("calculator", false).unwrap();
        let evolved = calculator.evolve("calc-two").unwrap();
        assert!(matches!(evolved, BuiltinUnit::Calculator(_)));
        assert_eq!(evolved.core().dna().parent().unwrap().id(), "calculator");
    }
}
