//! Invocable capabilities and the registry that owns them
//!
//! This module provides:
//! - [`Capability`] - A named unit operation with a uniform calling convention
//! - [`CapabilityRegistry`] - Name → capability mapping owned by one unit
//!
//! Capabilities take an opaque list of JSON values and produce a single JSON
//! value. Sync and async implementations are wrapped into the same boxed
//! future so the registry never needs to know which one it holds.

use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::contract::TeachingContract;
use crate::dna::namespaced;
use crate::error::{BoxError, Result, UnitError};

/// Outcome of a single capability invocation
pub type CapabilityResult = std::result::Result<Value, BoxError>;

type Handler = dyn Fn(Vec<Value>) -> BoxFuture<'static, CapabilityResult> + Send + Sync;

/// A cloneable handle to an invocable operation.
///
/// Cloning shares the underlying function; learning copies handles, never
/// behaviour.
///
/// # Example
///
/// ```
/// use trinity_core::Capability;
/// use serde_json::json;
///
/// let double = Capability::sync(|args| {
///     let n = args.first().and_then(|v| v.as_f64()).ok_or("expected a number")?;
///     Ok(json!(n * 2.0))
/// });
/// # let _ = double;
/// ```
#[derive(Clone)]
pub struct Capability {
    handler: Arc<Handler>,
}

impl Capability {
    /// Wrap an async implementation
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CapabilityResult> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |args| f(args).boxed()),
        }
    }

    /// Wrap a synchronous implementation
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> CapabilityResult + Send + Sync + 'static,
    {
        Self::new(move |args| future::ready(f(args)))
    }

    /// Invoke the implementation and await its completion
    pub async fn invoke(&self, args: Vec<Value>) -> CapabilityResult {
        (self.handler)(args).await
    }

    /// Whether both handles point at the same implementation
    pub fn ptr_eq(&self, other: &Capability) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Capability(..)")
    }
}

/// Registry of the capabilities a unit can execute.
///
/// Names are unique; `add` rejects collisions while `set` overwrites.
/// Listing follows insertion order, but only set membership is meaningful.
#[derive(Clone)]
pub struct CapabilityRegistry {
    unit_id: String,
    entries: IndexMap<String, Capability>,
}

impl CapabilityRegistry {
    /// Create an empty registry owned by `unit_id`
    pub fn new(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            entries: IndexMap::new(),
        }
    }

    /// Id of the owning unit (used as error prefix)
    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    /// Register a capability, rejecting name collisions
    pub fn add(&mut self, name: impl Into<String>, capability: Capability) -> Result<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            warn!(unit = %self.unit_id, capability = %name, "Capability already registered");
            return Err(UnitError::DuplicateCapability {
                unit: self.unit_id.clone(),
                name,
            });
        }
        debug!(unit = %self.unit_id, capability = %name, "Capability added");
        self.entries.insert(name, capability);
        Ok(())
    }

    /// Register a capability, replacing any existing binding
    pub fn set(&mut self, name: impl Into<String>, capability: Capability) {
        let name = name.into();
        if self.entries.contains_key(&name) {
            debug!(unit = %self.unit_id, capability = %name, "Replacing capability");
        }
        self.entries.insert(name, capability);
    }

    /// Look up a capability by name
    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.entries.get(name)
    }

    /// Whether a capability is registered under `name`
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All registered names
    pub fn list(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of registered capabilities
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Whether no capability is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Capability)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Execute a capability by name.
    ///
    /// Fails with [`UnitError::UnknownCapability`] (listing every known
    /// name) if absent, or [`UnitError::CapabilityExecutionFailed`] wrapping
    /// the implementation's own error.
    pub async fn execute(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        let capability = self.entries.get(name).cloned().ok_or_else(|| {
            warn!(unit = %self.unit_id, capability = name, "Capability not found");
            UnitError::unknown_capability(&self.unit_id, name, self.list())
        })?;

        debug!(unit = %self.unit_id, capability = name, args = args.len(), "Executing capability");
        capability.invoke(args).await.map_err(|source| {
            warn!(unit = %self.unit_id, capability = name, error = %source, "Capability failed");
            UnitError::CapabilityExecutionFailed {
                unit: self.unit_id.clone(),
                name: name.to_string(),
                source,
            }
        })
    }

    /// Absorb every capability of every contract under
    /// `<contract.unit_id>.<name>`. The newest binding wins.
    pub fn learn(&mut self, contracts: &[TeachingContract]) {
        for contract in contracts {
            for (name, capability) in contract.capabilities.iter() {
                self.set(namespaced(&contract.unit_id, name), capability.clone());
            }
            debug!(
                unit = %self.unit_id,
                teacher = %contract.unit_id,
                count = contract.capabilities.size(),
                "Capabilities learned"
            );
        }
    }

    /// Remove a capability; absent names are a no-op
    pub fn remove(&mut self, name: &str) -> Option<Capability> {
        self.entries.shift_remove(name)
    }

    /// Remove every capability
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|name, _| keep(name.as_str()));
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("unit_id", &self.unit_id)
            .field("capabilities", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo() -> Capability {
        Capability::sync(|args| Ok(json!(args)))
    }

    #[test]
    fn test_add_and_query() {
        let mut registry = CapabilityRegistry::new("calc");
        assert!(registry.is_empty());

        registry.add("echo", echo()).unwrap();
        assert!(registry.has("echo"));
        assert!(!registry.has("nope"));
        assert_eq!(registry.list(), vec!["echo"]);
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_duplicate_rejection() {
        let mut registry = CapabilityRegistry::new("calc");
        registry.add("echo", echo()).unwrap();

        let err = registry.add("echo", echo()).unwrap_err();
        assert!(matches!(err, UnitError::DuplicateCapability { .. }));
        assert_eq!(err.to_string(), "[calc] Capability 'echo' already exists");
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_set_overwrites() {
        let mut registry = CapabilityRegistry::new("calc");
        let first = echo();
        let second = echo();
        registry.set("echo", first.clone());
        registry.set("echo", second.clone());

        assert_eq!(registry.size(), 1);
        assert!(registry.get("echo").unwrap().ptr_eq(&second));
    }

    #[tokio::test]
    async fn test_execute_sync_and_async() {
        let mut registry = CapabilityRegistry::new("calc");
        registry
            .add("len", Capability::sync(|args| Ok(json!(args.len()))))
            .unwrap();
        registry
            .add(
                "later",
                Capability::new(|args| async move {
                    tokio::task::yield_now().await;
                    Ok(args.into_iter().next().unwrap_or(Value::Null))
                }),
            )
            .unwrap();

        assert_eq!(
            registry.execute("len", vec![json!(1), json!(2)]).await.unwrap(),
            json!(2)
        );
        assert_eq!(
            registry.execute("later", vec![json!("hi")]).await.unwrap(),
            json!("hi")
        );
    }

    #[tokio::test]
    async fn test_execute_unknown_lists_names() {
        let mut registry = CapabilityRegistry::new("calc");
        registry.add("a", echo()).unwrap();
        registry.add("b", echo()).unwrap();

        let err = registry.execute("c", vec![]).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "[calc] Capability 'c' not found. Available: a, b"
        );
    }

    #[tokio::test]
    async fn test_execute_failure_is_wrapped() {
        let mut registry = CapabilityRegistry::new("calc");
        registry
            .add("boom", Capability::sync(|_| Err("kaboom".into())))
            .unwrap();

        let err = registry.execute("boom", vec![]).await.unwrap_err();
        match err {
            UnitError::CapabilityExecutionFailed { name, source, .. } => {
                assert_eq!(name, "boom");
                assert_eq!(source.to_string(), "kaboom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_learn_namespaces_and_shares_handles() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut teacher = CapabilityRegistry::new("calculator");
        teacher
            .add(
                "add",
                Capability::sync(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(json!(5))
                }),
            )
            .unwrap();
        let contract =
            TeachingContract::new("calculator", teacher.clone(), SchemaRegistry::new("calculator"));

        let mut learner = CapabilityRegistry::new("math");
        learner.learn(std::slice::from_ref(&contract));
        learner.learn(std::slice::from_ref(&contract));

        assert_eq!(learner.list(), vec!["calculator.add"]);
        assert!(!learner.has("add"));
        assert!(learner
            .get("calculator.add")
            .unwrap()
            .ptr_eq(teacher.get("add").unwrap()));

        learner.execute("calculator.add", vec![]).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = CapabilityRegistry::new("calc");
        registry.add("echo", echo()).unwrap();

        assert!(registry.remove("echo").is_some());
        assert!(registry.remove("echo").is_none());

        registry.add("a", echo()).unwrap();
        registry.add("b", echo()).unwrap();
        registry.clear();
        assert!(registry.is_empty());
    }
}
