//! Built-in units
//!
//! - [`CalculatorUnit`] - Two-operand arithmetic
//! - [`CompositeUnit`] - No native capabilities; grows only by learning
//!
//! Both are created through [`Unit::create`](crate::Unit::create) with a
//! `UnitConfig` (or evolved from an existing unit) and nothing else.

mod calculator;
mod composite;

pub use calculator::CalculatorUnit;
pub use composite::CompositeUnit;
