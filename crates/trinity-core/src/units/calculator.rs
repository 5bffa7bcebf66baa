//! Calculator unit with two-operand arithmetic
//!
//! Operands are accepted positionally (`add(2, 3)`) or as one object
//! (`add({"a": 2, "b": 3})`), so the same capability serves both raw and
//! validated execution.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::capability::{Capability, CapabilityResult};
use crate::error::{BoxError, Result};
use crate::schema::{ObjectSchema, PropertySchema, PropertyType, ToolSchema};
use crate::unit::{Unit, UnitCore, UnitSeed};

const DESCRIPTION: &str = "Basic two-operand arithmetic";

/// Unit exposing `add`, `subtract`, `multiply` and `divide`.
///
/// Whole-number results come back as JSON integers (`add(2, 3)` is `5`),
/// everything else as floats.
///
/// # Example
///
/// ```
/// use trinity_core::units::CalculatorUnit;
/// use trinity_core::{Unit, UnitConfig};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let calculator = CalculatorUnit::create(UnitConfig::new("calculator")).unwrap();
/// let product = calculator
///     .execute("multiply", vec![json!(6), json!(7)])
///     .await
///     .unwrap();
/// assert_eq!(product, json!(42));
/// # }
/// ```
#[derive(Debug)]
pub struct CalculatorUnit {
    core: UnitCore,
}

impl CalculatorUnit {
    /// Id used by the built-in catalogue
    pub const DEFAULT_ID: &'static str = "calculator";
}

#[async_trait]
impl Unit for CalculatorUnit {
    fn assemble(seed: UnitSeed) -> Result<Self> {
        let core = seed
            .with_default_description(DESCRIPTION)
            .builder()
            .native(
                "add",
                binary("add", |a, b| Ok(a + b)),
                operation_schema("add", "Add b to a"),
            )
            .native(
                "subtract",
                binary("subtract", |a, b| Ok(a - b)),
                operation_schema("subtract", "Subtract b from a"),
            )
            .native(
                "multiply",
                binary("multiply", |a, b| Ok(a * b)),
                operation_schema("multiply", "Multiply a by b"),
            )
            .native(
                "divide",
                binary("divide", |a, b| {
                    if b == 0.0 {
                        Err("division by zero".into())
                    } else {
                        Ok(a / b)
                    }
                }),
                operation_schema("divide", "Divide a by b (b must not be zero)"),
            )
            .build()?;
        Ok(Self { core })
    }

    fn core(&self) -> &UnitCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut UnitCore {
        &mut self.core
    }
}

fn operation_schema(name: &str, description: &str) -> ToolSchema {
    ToolSchema::new(name, description).with_parameters(
        ObjectSchema::new()
            .required_property("a", PropertySchema::new(PropertyType::Number, "Left operand"))
            .required_property("b", PropertySchema::new(PropertyType::Number, "Right operand")),
    )
}

fn binary<F>(operation: &'static str, op: F) -> Capability
where
    F: Fn(f64, f64) -> std::result::Result<f64, BoxError> + Send + Sync + 'static,
{
    Capability::sync(move |args| -> CapabilityResult {
        let (a, b) = operands(operation, &args)?;
        let result = op(a, b)?;
        if !result.is_finite() {
            return Err(format!("{operation} produced a non-finite result").into());
        }
        Ok(number(result))
    })
}

/// Whole numbers that fit an `i64` exactly become integers
fn number(value: f64) -> Value {
    const EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
    if value.fract() == 0.0 && value.abs() <= EXACT {
        json!(value as i64)
    } else {
        json!(value)
    }
}

fn operands(operation: &str, args: &[Value]) -> std::result::Result<(f64, f64), BoxError> {
    let (a, b) = match args {
        [Value::Object(input)] => (input.get("a"), input.get("b")),
        [a, b, ..] => (Some(a), Some(b)),
        _ => {
            return Err(format!(
                "{operation} expects two numbers or an object with 'a' and 'b'"
            )
            .into())
        }
    };
    let number = |label: &str, value: Option<&Value>| {
        value
            .and_then(Value::as_f64)
            .ok_or_else(|| BoxError::from(format!("{operation}: operand '{label}' must be a number")))
    };
    Ok((number("a", a)?, number("b", b)?))
}
