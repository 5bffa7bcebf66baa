//! Unit types for Trinity
//!
//! A unit is an identity ([`Dna`]) plus a [`Validator`] owning its capability
//! and schema registries. [`UnitCore`] holds that state and implements every
//! operation; the [`Unit`] trait gives each concrete unit type the same
//! surface and adds evolution, which needs to rebuild the concrete type.
//!
//! Units only come into existence fully consistent: [`UnitBuilder::build`]
//! fails instead of returning a unit whose capabilities and schemas disagree.
//! The only ways to obtain one are [`Unit::create`] and [`Unit::evolve`];
//! [`UnitSeed`], the input of [`Unit::assemble`], cannot be built elsewhere.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::capability::{Capability, CapabilityRegistry};
use crate::config::UnitConfig;
use crate::contract::{Compatibility, TeachingContract};
use crate::dna::Dna;
use crate::error::{Result, UnitError};
use crate::schema::{SchemaRegistry, ToolSchema};
use crate::validator::{Validator, ValidatorConfig};

/// Validated identity and strictness handed to [`Unit::assemble`].
///
/// Seeds are only minted by [`Unit::create`] and [`Unit::evolve`], so
/// `assemble` cannot be used to skip the factory.
///
/// ```compile_fail
/// use trinity_core::{Dna, UnitSeed};
///
/// let seed = UnitSeed {
///     dna: Dna::new("calculator", "1.0.0").unwrap(),
///     strict: false,
/// };
/// ```
///
/// ```compile_fail
/// use trinity_core::{Dna, UnitCore};
///
/// let builder = UnitCore::builder(Dna::new("calculator", "1.0.0").unwrap());
/// ```
#[derive(Debug)]
pub struct UnitSeed {
    dna: Dna,
    strict: bool,
}

impl UnitSeed {
    pub(crate) fn new(dna: Dna, strict: bool) -> Self {
        Self { dna, strict }
    }

    /// Identity the unit will carry
    pub fn dna(&self) -> &Dna {
        &self.dna
    }

    /// Whether the unit starts in strict mode
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Use `description` unless the configuration or a parent already set one
    pub fn with_default_description(mut self, description: &str) -> Self {
        if self.dna.description().is_none() {
            self.dna = self.dna.with_description(description);
        }
        self
    }

    /// Start collecting native capabilities for this identity
    pub fn builder(self) -> UnitBuilder {
        UnitCore::builder(self.dna).strict(self.strict)
    }
}

/// Collects native capabilities and schemas for a new unit
#[derive(Debug)]
pub struct UnitBuilder {
    dna: Dna,
    strict: bool,
    capabilities: Vec<(String, Capability)>,
    schemas: Vec<ToolSchema>,
}

impl UnitBuilder {
    pub(crate) fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Native capability with its schema
    pub fn native(mut self, name: impl Into<String>, capability: Capability, schema: ToolSchema) -> Self {
        self.capabilities.push((name.into(), capability));
        self.schemas.push(schema);
        self
    }

    /// Capability only; `build` fails unless a matching schema is added too
    pub fn capability(mut self, name: impl Into<String>, capability: Capability) -> Self {
        self.capabilities.push((name.into(), capability));
        self
    }

    /// Schema only, keyed by its embedded name
    pub fn schema(mut self, schema: ToolSchema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Register everything and confirm consistency.
    ///
    /// Duplicate names, malformed schemas and capability/schema mismatches
    /// all abort construction.
    pub fn build(self) -> Result<UnitCore> {
        let id = self.dna.id().to_string();
        let mut capabilities = CapabilityRegistry::new(&id);
        let mut schema = SchemaRegistry::new(&id);

        for (name, capability) in self.capabilities {
            capabilities.add(name, capability)?;
        }
        for tool in self.schemas {
            schema.add(tool.name.clone(), tool)?;
        }

        let validator = Validator::create(ValidatorConfig {
            capabilities,
            schema,
            strict: self.strict,
        })?;

        info!(
            unit = %id,
            version = self.dna.version(),
            capabilities = validator.capabilities().size(),
            strict = self.strict,
            "Unit assembled"
        );
        Ok(UnitCore {
            dna: self.dna,
            validator,
        })
    }
}

/// State and behaviour shared by every unit
#[derive(Debug, Clone)]
pub struct UnitCore {
    dna: Dna,
    validator: Validator,
}

impl UnitCore {
    pub(crate) fn builder(dna: Dna) -> UnitBuilder {
        UnitBuilder {
            dna,
            strict: false,
            capabilities: Vec::new(),
            schemas: Vec::new(),
        }
    }

    /// Identity of this unit
    pub fn dna(&self) -> &Dna {
        &self.dna
    }

    /// Shorthand for `dna().id()`
    pub fn id(&self) -> &str {
        self.dna.id()
    }

    /// Guard over both registries
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Mutable guard; every change still goes through its consistency checks
    pub fn validator_mut(&mut self) -> &mut Validator {
        &mut self.validator
    }

    /// Read-only view of the capability registry
    pub fn capabilities(&self) -> &CapabilityRegistry {
        self.validator.capabilities()
    }

    /// Read-only view of the schema registry
    pub fn schema(&self) -> &SchemaRegistry {
        self.validator.schema()
    }

    /// Human-readable identity, e.g. `[calculator] Unit v1.0.0 - Basic arithmetic`
    pub fn whoami(&self) -> String {
        let mut who = format!("[{}] Unit v{}", self.dna.id(), self.dna.version());
        if let Some(description) = self.dna.description() {
            who.push_str(" - ");
            who.push_str(description);
        }
        if let Some(parent) = self.dna.parent() {
            who.push_str(&format!(" (evolved from {parent})"));
        }
        who
    }

    pub fn can(&self, name: &str) -> bool {
        self.capabilities().has(name)
    }

    pub fn is_valid(&self) -> bool {
        self.validator.is_valid()
    }

    /// Execute with positional arguments, straight through the capability
    /// registry. Schemas are not consulted.
    pub async fn execute(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        self.capabilities().execute(name, args).await
    }

    /// Execute with one structured input through the validator, honouring
    /// strict mode.
    pub async fn execute_validated(&self, name: &str, input: Value) -> Result<Value> {
        self.validator.execute(name, input).await
    }

    /// [`execute`](Self::execute) bounded by `limit`
    pub async fn execute_with_timeout(
        &self,
        name: &str,
        args: Vec<Value>,
        limit: Duration,
    ) -> Result<Value> {
        tokio::time::timeout(limit, self.execute(name, args))
            .await
            .map_err(|_| UnitError::Timeout {
                unit: self.id().to_string(),
                name: name.to_string(),
                timeout_ms: millis(limit),
            })?
    }

    /// Snapshot of everything this unit can do, tagged with its id
    pub fn teach(&self) -> TeachingContract {
        debug!(unit = %self.id(), capabilities = self.capabilities().size(), "Teaching");
        TeachingContract::new(
            self.id(),
            self.capabilities().clone(),
            self.schema().clone(),
        )
    }

    /// Snapshot restricted to `names`
    pub fn teach_only<S: AsRef<str>>(&self, names: &[S]) -> TeachingContract {
        self.teach().only(names)
    }

    pub fn validate_compatibility(&self, contract: &TeachingContract) -> Compatibility {
        self.validator.validate_compatibility(contract)
    }

    /// Learn from every contract or from none.
    ///
    /// Each contract is checked up front; the first incompatible one aborts
    /// with [`UnitError::IncompatibleContract`] before anything changes.
    pub fn learn(&mut self, contracts: &[TeachingContract]) -> Result<()> {
        for contract in contracts {
            let compatibility = self.validator.validate_compatibility(contract);
            if !compatibility.is_compatible {
                return Err(UnitError::incompatible(
                    self.id(),
                    &contract.unit_id,
                    compatibility.reason.unwrap_or_default(),
                ));
            }
        }
        self.validator.learn(contracts)
    }
}

fn millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

/// Common surface of every concrete unit type.
///
/// Implementors provide [`assemble`](Unit::assemble) (build a fresh instance
/// with native capabilities around a [`UnitSeed`]) and access to their
/// [`UnitCore`]; everything else is provided. [`create`](Unit::create) is the
/// one factory for every unit type.
///
/// # Example
///
/// ```
/// use trinity_core::units::{CalculatorUnit, CompositeUnit};
/// use trinity_core::{Unit, UnitConfig};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let calculator = CalculatorUnit::create(UnitConfig::new("calculator")).unwrap();
/// let mut math = CompositeUnit::create(UnitConfig::new("math")).unwrap();
///
/// math.learn(&[calculator.teach()]).unwrap();
/// let sum = math.execute("calculator.add", vec![json!(2), json!(3)]).await.unwrap();
/// assert_eq!(sum, json!(5));
/// # }
/// ```
#[async_trait]
pub trait Unit: Sized + Send + Sync {
    /// Fresh instance of this unit type with its native capabilities.
    ///
    /// Only reachable through [`create`](Unit::create) and
    /// [`evolve`](Unit::evolve), which hold the seed.
    fn assemble(seed: UnitSeed) -> Result<Self>;

    fn core(&self) -> &UnitCore;

    fn core_mut(&mut self) -> &mut UnitCore;

    /// Validate `config` and build a consistent unit, or fail
    fn create(config: UnitConfig) -> Result<Self> {
        Self::assemble(UnitSeed::new(config.dna()?, config.strict))
    }

    fn dna(&self) -> &Dna {
        self.core().dna()
    }

    fn id(&self) -> &str {
        self.core().id()
    }

    fn whoami(&self) -> String {
        self.core().whoami()
    }

    fn can(&self, name: &str) -> bool {
        self.core().can(name)
    }

    /// Every capability name this unit can execute
    fn capabilities(&self) -> Vec<String> {
        self.core().capabilities().list()
    }

    fn schemas(&self) -> &SchemaRegistry {
        self.core().schema()
    }

    fn is_valid(&self) -> bool {
        self.core().is_valid()
    }

    async fn execute(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        self.core().execute(name, args).await
    }

    async fn execute_validated(&self, name: &str, input: Value) -> Result<Value> {
        self.core().execute_validated(name, input).await
    }

    fn teach(&self) -> TeachingContract {
        self.core().teach()
    }

    fn teach_only(&self, names: &[&str]) -> TeachingContract {
        self.core().teach_only(names)
    }

    fn learn(&mut self, contracts: &[TeachingContract]) -> Result<()> {
        self.core_mut().learn(contracts)
    }

    /// Produce a new unit of the same type under `new_id`.
    ///
    /// The new identity bumps the patch version and points back at this
    /// one. The new unit keeps every capability and schema this unit has
    /// under its current name, also learns this unit's contract (so each
    /// entry is reachable as `<old-id>.<name>` too), and learns any `extra`
    /// capabilities (with placeholder schemas) namespaced under `new_id`.
    /// `self` is left untouched.
    fn evolve(&self, new_id: &str, extra: Option<Vec<(String, Capability)>>) -> Result<Self> {
        let dna = self.dna().evolve(new_id)?;
        let strict = self.core().validator().is_strict();
        let mut evolved = Self::assemble(UnitSeed::new(dna, strict))?;
        evolved
            .core_mut()
            .validator_mut()
            .inherit(self.core().validator())?;

        let mut contracts = vec![self.teach()];
        if let Some(extra) = extra {
            let mut capabilities = CapabilityRegistry::new(new_id);
            let mut schema = SchemaRegistry::new(new_id);
            for (name, capability) in extra {
                schema.set(name.clone(), ToolSchema::placeholder(name.clone()))?;
                capabilities.set(name, capability);
            }
            contracts.push(TeachingContract::new(new_id, capabilities, schema));
        }
        evolved.learn(&contracts)?;

        info!(
            unit = new_id,
            parent = %self.dna(),
            version = evolved.dna().version(),
            capabilities = evolved.core().capabilities().size(),
            "Unit evolved"
        );
        Ok(evolved)
    }
}
