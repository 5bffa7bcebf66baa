//! # Trinity Core
//!
//! Runtime units that declare, teach, learn and evolve capabilities:
//! - [`Dna`] - Immutable identity with a versioned parent lineage
//! - [`CapabilityRegistry`] - Name → invocable [`Capability`]
//! - [`SchemaRegistry`] - Name → [`ToolSchema`], with structural validation and export
//! - [`Validator`] - Keeps both registries in step, strict-mode execution, transactional learning
//! - [`Unit`] / [`UnitCore`] - Identity + the three above, with `teach`, `learn` and `evolve`
//!
//! ## Quick Start
//!
//! ```rust
//! use trinity_core::units::{CalculatorUnit, CompositeUnit};
//! use trinity_core::{Unit, UnitConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let calculator = CalculatorUnit::create(UnitConfig::new("calculator")).unwrap();
//!     let mut math = CompositeUnit::create(UnitConfig::new("math")).unwrap();
//!
//!     // Learned capabilities live under "<teacher>.<name>"
//!     math.learn(&[calculator.teach()]).unwrap();
//!     assert!(math.can("calculator.add"));
//!
//!     let sum = math
//!         .execute("calculator.add", vec![json!(2), json!(3)])
//!         .await
//!         .unwrap();
//!     assert_eq!(sum, json!(5));
//!
//!     // Tool definitions for function-calling frameworks
//!     let tools = math.schemas().to_array();
//!     assert_eq!(tools[0]["name"], "calculator.add");
//! }
//! ```

pub mod capability;
pub mod config;
pub mod contract;
pub mod dna;
pub mod error;
pub mod schema;
pub mod unit;
pub mod units;
pub mod validator;

pub use capability::{Capability, CapabilityRegistry, CapabilityResult};
pub use config::UnitConfig;
pub use contract::{Compatibility, TeachingContract};
pub use dna::{bump_patch, namespaced, validate_id, Dna, Lineage, NAMESPACE_SEPARATOR};
pub use error::{BoxError, Result, UnitError};
pub use schema::{
    ObjectSchema, PropertySchema, PropertyType, SchemaRegistry, ToolSchema, ValidationResult,
};
pub use unit::{Unit, UnitBuilder, UnitCore, UnitSeed};
pub use validator::{Consistency, Validator, ValidatorConfig};
