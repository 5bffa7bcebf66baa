//! Structured error types for units and their registries
//!
//! Every message starts with the owning unit's id in square brackets,
//! e.g. `[calculator] Capability 'pow' not found. Available: add, subtract`.
//! Callers may pattern-match on that prefix.

use thiserror::Error;

/// Error returned by a capability implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, UnitError>;

/// Failure modes of identity construction, registry management,
/// execution and learning.
///
/// # Example
///
/// ```
/// use trinity_core::UnitError;
///
/// let err = UnitError::unknown_capability("calculator", "pow", vec!["add".into(), "divide".into()]);
/// assert_eq!(
///     err.to_string(),
///     "[calculator] Capability 'pow' not found. Available: add, divide"
/// );
/// ```
#[derive(Debug, Error)]
pub enum UnitError {
    /// Malformed unit id
    #[error("[{id}] Invalid unit id '{id}': {reason}")]
    InvalidIdentity {
        /// The rejected id
        id: String,
        /// Which rule the id broke
        reason: String,
    },

    /// Malformed version string
    #[error("[{unit}] Invalid version '{version}': expected dot-separated numbers like 1.0.0")]
    InvalidVersion {
        /// Unit the version belongs to
        unit: String,
        /// The rejected version
        version: String,
    },

    /// Capabilities and schemas disagree at construction time
    #[error("[{unit}] Inconsistent consciousness: {detail}")]
    InconsistentConsciousness {
        /// Unit that failed to assemble
        unit: String,
        /// Which names are unmatched
        detail: String,
    },

    /// A merge left capabilities and schemas out of step (rolled back)
    #[error("[{unit}] Learning broke capability/schema consistency: {detail}")]
    PostLearningInconsistency {
        /// Learning unit
        unit: String,
        /// Which names are unmatched
        detail: String,
    },

    /// `add()` of a capability name that already exists
    #[error("[{unit}] Capability '{name}' already exists")]
    DuplicateCapability {
        /// Owning unit
        unit: String,
        /// Colliding name
        name: String,
    },

    /// `add()` of a schema name that already exists
    #[error("[{unit}] Schema '{name}' already exists")]
    DuplicateSchema {
        /// Owning unit
        unit: String,
        /// Colliding name
        name: String,
    },

    /// Raw execution of a name the registry does not hold
    #[error("[{unit}] Capability '{name}' not found. Available: {}", .available.join(", "))]
    UnknownCapability {
        /// Owning unit
        unit: String,
        /// Requested name
        name: String,
        /// Names currently registered
        available: Vec<String>,
    },

    /// Validated execution of a name the unit does not hold
    #[error("[{unit}] Unknown command '{name}'. Available: {}", .available.join(", "))]
    UnknownCommand {
        /// Owning unit
        unit: String,
        /// Requested name
        name: String,
        /// Names currently registered
        available: Vec<String>,
    },

    /// The implementation itself failed
    #[error("[{unit}] Capability '{name}' failed: {source}")]
    CapabilityExecutionFailed {
        /// Owning unit
        unit: String,
        /// Capability that failed
        name: String,
        /// Error raised by the implementation
        #[source]
        source: BoxError,
    },

    /// Strict mode rejected the input before invocation
    #[error("[{unit}] Invalid input for '{name}': {}", .errors.join("; "))]
    InvalidInput {
        /// Owning unit
        unit: String,
        /// Capability name
        name: String,
        /// Validation messages
        errors: Vec<String>,
    },

    /// Strict mode rejected the result after invocation
    #[error("[{unit}] Invalid output from '{name}': {}", .errors.join("; "))]
    InvalidOutput {
        /// Owning unit
        unit: String,
        /// Capability name
        name: String,
        /// Validation messages
        errors: Vec<String>,
    },

    /// Schema is structurally unusable
    #[error("[{unit}] Invalid schema '{name}': {reason}")]
    InvalidSchema {
        /// Owning unit
        unit: String,
        /// Registry key
        name: String,
        /// Which rule the schema broke
        reason: String,
    },

    /// Embedded schema name disagrees with its registry key
    #[error("[{unit}] Schema name mismatch: key '{key}' carries embedded name '{embedded}'")]
    SchemaNameMismatch {
        /// Owning or learning unit
        unit: String,
        /// Registry key
        key: String,
        /// Name field inside the schema
        embedded: String,
    },

    /// Pre-flight compatibility check refused a contract
    #[error("[{unit}] Cannot learn from '{teacher}': {reason}")]
    IncompatibleContract {
        /// Learning unit
        unit: String,
        /// Unit id carried by the contract
        teacher: String,
        /// Why the contract was refused
        reason: String,
    },

    /// Execution did not complete in time
    #[error("[{unit}] Capability '{name}' timed out after {timeout_ms}ms")]
    Timeout {
        /// Owning unit
        unit: String,
        /// Capability name
        name: String,
        /// Limit in milliseconds
        timeout_ms: u64,
    },
}

impl UnitError {
    /// Create an UnknownCapability error
    pub fn unknown_capability(
        unit: impl Into<String>,
        name: impl Into<String>,
        available: Vec<String>,
    ) -> Self {
        Self::UnknownCapability {
            unit: unit.into(),
            name: name.into(),
            available,
        }
    }

    /// Create an UnknownCommand error
    pub fn unknown_command(
        unit: impl Into<String>,
        name: impl Into<String>,
        available: Vec<String>,
    ) -> Self {
        Self::UnknownCommand {
            unit: unit.into(),
            name: name.into(),
            available,
        }
    }

    /// Create an InvalidSchema error
    pub fn invalid_schema(
        unit: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidSchema {
            unit: unit.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an IncompatibleContract error
    pub fn incompatible(
        unit: impl Into<String>,
        teacher: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::IncompatibleContract {
            unit: unit.into(),
            teacher: teacher.into(),
            reason: reason.into(),
        }
    }

    /// Id of the unit this error is attributed to
    pub fn unit_id(&self) -> &str {
        match self {
            Self::InvalidIdentity { id, .. } => id,
            Self::InvalidVersion { unit, .. }
            | Self::InconsistentConsciousness { unit, .. }
            | Self::PostLearningInconsistency { unit, .. }
            | Self::DuplicateCapability { unit, .. }
            | Self::DuplicateSchema { unit, .. }
            | Self::UnknownCapability { unit, .. }
            | Self::UnknownCommand { unit, .. }
            | Self::CapabilityExecutionFailed { unit, .. }
            | Self::InvalidInput { unit, .. }
            | Self::InvalidOutput { unit, .. }
            | Self::InvalidSchema { unit, .. }
            | Self::SchemaNameMismatch { unit, .. }
            | Self::IncompatibleContract { unit, .. }
            | Self::Timeout { unit, .. } => unit,
        }
    }

    /// Whether the caller can reasonably retry or work around this error.
    ///
    /// Construction and consistency failures are defects in the caller's
    /// configuration; everything else is a local, recoverable condition.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DuplicateCapability { .. }
                | Self::DuplicateSchema { .. }
                | Self::UnknownCapability { .. }
                | Self::UnknownCommand { .. }
                | Self::InvalidInput { .. }
                | Self::InvalidOutput { .. }
                | Self::IncompatibleContract { .. }
                | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_prefix() {
        let err = UnitError::DuplicateCapability {
            unit: "calculator".into(),
            name: "add".into(),
        };
        assert!(err.to_string().starts_with("[calculator] "));
        assert_eq!(err.unit_id(), "calculator");
    }

    #[test]
    fn test_unknown_lists_available() {
        let err = UnitError::unknown_command("math", "pow", vec!["calculator.add".into()]);
        assert_eq!(
            err.to_string(),
            "[math] Unknown command 'pow'. Available: calculator.add"
        );
    }

    #[test]
    fn test_execution_failure_keeps_source() {
        let source: BoxError = "division by zero".into();
        let err = UnitError::CapabilityExecutionFailed {
            unit: "calculator".into(),
            name: "divide".into(),
            source,
        };
        assert!(err.to_string().contains("division by zero"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_recoverable() {
        assert!(UnitError::unknown_capability("a", "b", vec![]).is_recoverable());
        assert!(!UnitError::InvalidIdentity {
            id: "Bad".into(),
            reason: "uppercase".into()
        }
        .is_recoverable());
    }
}
