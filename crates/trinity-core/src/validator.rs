//! Consistency guard over a unit's capability and schema registries
//!
//! The [`Validator`] owns both registries of one unit and enforces that their
//! key sets are equal: every capability has a schema and every schema has a
//! capability. It is the only way to mutate them after construction, so the
//! invariant holds whenever a call returns `Ok`.
//!
//! # Strict mode
//!
//! With strict mode on, [`Validator::execute`] checks the input against the
//! schema's parameters before invoking and the result against its response
//! shape afterwards. With strict mode off, schemas are documentation only.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::capability::{Capability, CapabilityRegistry};
use crate::contract::{Compatibility, TeachingContract};
use crate::dna::validate_id;
use crate::error::{Result, UnitError};
use crate::schema::{SchemaRegistry, ToolSchema};

/// Inputs to [`Validator::create`]
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub capabilities: CapabilityRegistry,
    pub schema: SchemaRegistry,
    pub strict: bool,
}

/// Names that break the capability/schema invariant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Consistency {
    /// Capabilities without a schema
    pub missing_schemas: Vec<String>,
    /// Schemas without a capability
    pub orphan_schemas: Vec<String>,
}

impl Consistency {
    fn between<'a>(
        capabilities: impl Iterator<Item = &'a str>,
        schemas: impl Iterator<Item = &'a str>,
    ) -> Self {
        let capabilities: BTreeSet<&str> = capabilities.collect();
        let schemas: BTreeSet<&str> = schemas.collect();
        Self {
            missing_schemas: capabilities
                .difference(&schemas)
                .map(|s| s.to_string())
                .collect(),
            orphan_schemas: schemas
                .difference(&capabilities)
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.missing_schemas.is_empty() && self.orphan_schemas.is_empty()
    }

    /// Human-readable summary used in error messages
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing_schemas.is_empty() {
            parts.push(format!(
                "capabilities without schema: {}",
                self.missing_schemas.join(", ")
            ));
        }
        if !self.orphan_schemas.is_empty() {
            parts.push(format!(
                "schemas without capability: {}",
                self.orphan_schemas.join(", ")
            ));
        }
        if parts.is_empty() {
            "consistent".to_string()
        } else {
            parts.join("; ")
        }
    }
}

/// Keeper of one unit's capability/schema invariant
#[derive(Debug, Clone)]
pub struct Validator {
    unit_id: String,
    capabilities: CapabilityRegistry,
    schema: SchemaRegistry,
    strict: bool,
}

impl Validator {
    /// Build a validator, failing with
    /// [`UnitError::InconsistentConsciousness`] if the registries disagree.
    pub fn create(config: ValidatorConfig) -> Result<Self> {
        let validator = Self {
            unit_id: config.capabilities.unit_id().to_string(),
            capabilities: config.capabilities,
            schema: config.schema,
            strict: config.strict,
        };

        let consistency = validator.consistency();
        if !consistency.is_consistent() {
            warn!(unit = %validator.unit_id, detail = %consistency.describe(), "Inconsistent consciousness");
            return Err(UnitError::InconsistentConsciousness {
                unit: validator.unit_id,
                detail: consistency.describe(),
            });
        }
        Ok(validator)
    }

    /// Id of the owning unit (used as error prefix)
    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    /// Read-only view of the capability registry
    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    /// Read-only view of the schema registry
    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Whether validated execution checks input and output
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Switch strict mode on or off
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Differences between the two key sets
    pub fn consistency(&self) -> Consistency {
        Consistency::between(
            self.capabilities.iter().map(|(name, _)| name),
            self.schema.iter().map(|(name, _)| name),
        )
    }

    /// Whether capability names and schema names are the same set
    pub fn is_valid(&self) -> bool {
        self.consistency().is_consistent()
    }

    /// Execute `name` with a single structured input.
    ///
    /// In strict mode the input is checked before invocation
    /// ([`UnitError::InvalidInput`], the implementation does not run) and the
    /// result after it ([`UnitError::InvalidOutput`], the result is dropped).
    pub async fn execute(&self, name: &str, input: Value) -> Result<Value> {
        if !self.capabilities.has(name) {
            return Err(UnitError::unknown_command(
                &self.unit_id,
                name,
                self.capabilities.list(),
            ));
        }

        let checked = self.strict && self.schema.has(name);
        if checked {
            let validation = self.schema.validate(name, &input);
            if !validation.valid {
                warn!(unit = %self.unit_id, capability = name, "Rejected invalid input");
                return Err(UnitError::InvalidInput {
                    unit: self.unit_id.clone(),
                    name: name.to_string(),
                    errors: validation.errors,
                });
            }
        }

        let output = self.capabilities.execute(name, vec![input]).await?;

        if checked {
            let validation = self.schema.validate_response(name, &output);
            if !validation.valid {
                warn!(unit = %self.unit_id, capability = name, "Rejected invalid output");
                return Err(UnitError::InvalidOutput {
                    unit: self.unit_id.clone(),
                    name: name.to_string(),
                    errors: validation.errors,
                });
            }
        }

        Ok(output)
    }

    /// Pre-flight check of a foreign contract. Never fails; the caller
    /// decides what to do with an incompatible result.
    pub fn validate_compatibility(&self, contract: &TeachingContract) -> Compatibility {
        if let Err(err) = validate_id(&contract.unit_id) {
            return Compatibility::incompatible(format!(
                "contract unit id is not a valid namespace: {err}"
            ));
        }

        if let Some((key, schema)) = contract
            .schema
            .iter()
            .find(|(key, schema)| schema.name != *key)
        {
            return Compatibility::incompatible(format!(
                "schema '{key}' carries embedded name '{}'",
                schema.name
            ));
        }

        let consistency = Consistency::between(
            contract.capabilities.iter().map(|(name, _)| name),
            contract.schema.iter().map(|(name, _)| name),
        );
        if !consistency.is_consistent() {
            return Compatibility::incompatible(format!(
                "contract from '{}' is inconsistent: {}",
                contract.unit_id,
                consistency.describe()
            ));
        }

        Compatibility::compatible()
    }

    /// Merge contracts into both registries, all or nothing.
    ///
    /// The registries are restored to their previous state if either
    /// registry refuses a contract or the merge breaks the invariant
    /// ([`UnitError::PostLearningInconsistency`]).
    pub fn learn(&mut self, contracts: &[TeachingContract]) -> Result<()> {
        self.transaction(|capabilities, schema| {
            capabilities.learn(contracts);
            schema.learn(contracts)
        })?;

        info!(
            unit = %self.unit_id,
            contracts = contracts.len(),
            capabilities = self.capabilities.size(),
            "Learning complete"
        );
        Ok(())
    }

    /// Take over every entry of `ancestor` under the name it already has.
    ///
    /// Used by evolution so learned names such as `calculator.add` survive
    /// unchanged. Same rollback rules as [`learn`](Self::learn).
    pub(crate) fn inherit(&mut self, ancestor: &Validator) -> Result<()> {
        self.transaction(|capabilities, schema| {
            for (name, capability) in ancestor.capabilities.iter() {
                capabilities.set(name, capability.clone());
            }
            for (name, tool) in ancestor.schema.iter() {
                schema.set(name, tool.clone())?;
            }
            Ok(())
        })?;

        debug!(
            unit = %self.unit_id,
            ancestor = %ancestor.unit_id,
            capabilities = self.capabilities.size(),
            "Inherited registries"
        );
        Ok(())
    }

    /// Apply `change` to both registries and keep it only if it succeeds and
    /// leaves the key sets equal.
    fn transaction<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut CapabilityRegistry, &mut SchemaRegistry) -> Result<()>,
    {
        let capabilities_before = self.capabilities.clone();
        let schema_before = self.schema.clone();

        let outcome = change(&mut self.capabilities, &mut self.schema).and_then(|()| {
            let consistency = self.consistency();
            if consistency.is_consistent() {
                Ok(())
            } else {
                Err(UnitError::PostLearningInconsistency {
                    unit: self.unit_id.clone(),
                    detail: consistency.describe(),
                })
            }
        });

        if let Err(err) = outcome {
            warn!(unit = %self.unit_id, error = %err, "Learning rolled back");
            self.capabilities = capabilities_before;
            self.schema = schema_before;
            return Err(err);
        }
        Ok(())
    }

    /// Add a capability together with its schema, or neither
    pub fn register(
        &mut self,
        name: impl Into<String>,
        capability: Capability,
        schema: ToolSchema,
    ) -> Result<()> {
        let name = name.into();
        self.schema.add(name.clone(), schema)?;
        if let Err(err) = self.capabilities.add(name.clone(), capability) {
            self.schema.remove(&name);
            return Err(err);
        }
        debug!(unit = %self.unit_id, capability = %name, "Capability registered");
        Ok(())
    }

    /// Remove a capability and its schema; absent names are a no-op
    pub fn forget(&mut self, name: &str) -> bool {
        let had_capability = self.capabilities.remove(name).is_some();
        let had_schema = self.schema.remove(name).is_some();
        had_capability || had_schema
    }
}
