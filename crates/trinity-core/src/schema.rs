//! Tool schemas and the registry that owns them
//!
//! This module provides:
//! - [`ToolSchema`] - Name, description, parameter and response shapes of a capability
//! - [`SchemaRegistry`] - Name → schema mapping parallel to the capability registry
//! - [`ValidationResult`] - Outcome of a structural check, returned rather than raised
//!
//! The serialized field names (`name`, `description`, `parameters.type`,
//! `parameters.properties`, `parameters.required`, `response`) are what
//! tool-calling frameworks consume and must stay as they are.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::contract::TeachingContract;
use crate::dna::namespaced;
use crate::error::{Result, UnitError};

/// `type` value every parameter and response shape must carry
pub const OBJECT_TYPE: &str = "object";

/// JSON type of a single declared property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl PropertyType {
    /// Whether `value` carries this type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

/// Descriptor of one property inside an [`ObjectSchema`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: PropertyType,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
}

impl PropertySchema {
    pub fn new(kind: PropertyType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            allowed: None,
        }
    }

    /// Restrict the property to a fixed set of values
    pub fn one_of(mut self, allowed: impl IntoIterator<Item = Value>) -> Self {
        self.allowed = Some(allowed.into_iter().collect());
        self
    }
}

/// Object-typed structural descriptor used for parameters and responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: IndexMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for ObjectSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectSchema {
    /// Empty object shape
    pub fn new() -> Self {
        Self {
            kind: OBJECT_TYPE.to_string(),
            properties: IndexMap::new(),
            required: Vec::new(),
        }
    }

    /// Declare an optional property
    pub fn property(mut self, name: impl Into<String>, property: PropertySchema) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// Declare a property and mark it required
    pub fn required_property(mut self, name: impl Into<String>, property: PropertySchema) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, property);
        self
    }

    fn is_object_typed(&self) -> bool {
        self.kind == OBJECT_TYPE
    }

    /// Structural check of `value` against this shape.
    ///
    /// Extra properties are allowed; only declared ones are checked.
    pub fn check(&self, value: &Value) -> ValidationResult {
        let Some(object) = value.as_object() else {
            return ValidationResult::invalid(vec![format!(
                "expected an object, got {}",
                json_type_name(value)
            )]);
        };

        let mut errors = Vec::new();
        for name in &self.required {
            if !object.contains_key(name) {
                errors.push(format!("missing required property '{name}'"));
            }
        }

        for (name, property) in &self.properties {
            let Some(actual) = object.get(name) else {
                continue;
            };
            if !property.kind.matches(actual) {
                errors.push(format!(
                    "property '{name}' expected {}, got {}",
                    property.kind.as_str(),
                    json_type_name(actual)
                ));
                continue;
            }
            if let Some(allowed) = &property.allowed {
                if !allowed.contains(actual) {
                    let options: Vec<String> = allowed.iter().map(Value::to_string).collect();
                    errors.push(format!(
                        "property '{name}' must be one of [{}], got {actual}",
                        options.join(", ")
                    ));
                }
            }
        }

        ValidationResult::from_errors(errors)
    }
}

/// Machine-readable description of one capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: ObjectSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ObjectSchema>,
}

impl ToolSchema {
    /// Schema with an empty parameter object and no response shape
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ObjectSchema::new(),
            response: None,
        }
    }

    /// Replace the parameter shape
    pub fn with_parameters(mut self, parameters: ObjectSchema) -> Self {
        self.parameters = parameters;
        self
    }

    /// Declare the response shape checked in strict mode
    pub fn with_response(mut self, response: ObjectSchema) -> Self {
        self.response = Some(response);
        self
    }

    /// Minimal schema synthesized for capabilities added without one
    pub fn placeholder(name: impl Into<String>) -> Self {
        let name = name.into();
        let description = format!("Evolved capability: {name}");
        Self::new(name, description)
    }
}

/// Outcome of [`SchemaRegistry::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }

    fn from_errors(errors: Vec<String>) -> Self {
        if errors.is_empty() {
            Self::ok()
        } else {
            Self::invalid(errors)
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Registry of tool schemas owned by one unit.
///
/// Every insertion is structurally checked and the embedded `name` must
/// equal the key it is stored under.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    unit_id: String,
    entries: IndexMap<String, ToolSchema>,
}

impl SchemaRegistry {
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

    fn check_structure(&self, key: &str, schema: &ToolSchema) -> Result<()> {
        if key.is_empty() || schema.name.is_empty() {
            return Err(UnitError::invalid_schema(&self.unit_id, key, "name is required"));
        }
        if schema.description.trim().is_empty() {
            return Err(UnitError::invalid_schema(
                &self.unit_id,
                key,
                "description is required",
            ));
        }
        if !schema.parameters.is_object_typed() {
            return Err(UnitError::invalid_schema(
                &self.unit_id,
                key,
                format!(
                    "parameters.type must be 'object', got '{}'",
                    schema.parameters.kind
                ),
            ));
        }
        if let Some(response) = &schema.response {
            if !response.is_object_typed() {
                return Err(UnitError::invalid_schema(
                    &self.unit_id,
                    key,
                    format!("response.type must be 'object', got '{}'", response.kind),
                ));
            }
        }
        if schema.name != key {
            return Err(UnitError::SchemaNameMismatch {
                unit: self.unit_id.clone(),
                key: key.to_string(),
                embedded: schema.name.clone(),
            });
        }
        Ok(())
    }

    /// Register a schema, rejecting malformed schemas and name collisions
    pub fn add(&mut self, name: impl Into<String>, schema: ToolSchema) -> Result<()> {
        let name = name.into();
        self.check_structure(&name, &schema)?;
        if self.entries.contains_key(&name) {
            return Err(UnitError::DuplicateSchema {
                unit: self.unit_id.clone(),
                name,
            });
        }
        debug!(unit = %self.unit_id, schema = %name, "Schema added");
        self.entries.insert(name, schema);
        Ok(())
    }

    /// Register a schema, replacing any existing one
    pub fn set(&mut self, name: impl Into<String>, schema: ToolSchema) -> Result<()> {
        let name = name.into();
        self.check_structure(&name, &schema)?;
        self.entries.insert(name, schema);
        Ok(())
    }

    /// Look up a schema by name
    pub fn get(&self, name: &str) -> Option<&ToolSchema> {
        self.entries.get(name)
    }

    /// Whether a schema is registered under `name`
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All registered names, in insertion order
    pub fn list(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of registered schemas
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Whether no schema is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ToolSchema)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Remove a schema; absent names are a no-op
    pub fn remove(&mut self, name: &str) -> Option<ToolSchema> {
        self.entries.shift_remove(name)
    }

    /// Remove every schema
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|name, _| keep(name.as_str()));
    }

    /// Object keyed by tool name, each value `{name, description, parameters, response?}`
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(name, schema)| (name.clone(), schema_to_value(schema)))
                .collect(),
        )
    }

    /// The same entries as an ordered list
    pub fn to_array(&self) -> Vec<Value> {
        self.entries.values().map(schema_to_value).collect()
    }

    /// Keyed copy of the full schema structures
    pub fn to_record(&self) -> IndexMap<String, ToolSchema> {
        self.entries.clone()
    }

    /// Absorb every schema of every contract under `<contract.unit_id>.<name>`,
    /// rewriting the embedded name to the namespaced key.
    ///
    /// A contract whose embedded names disagree with its keys is rejected
    /// before any of its entries is applied.
    pub fn learn(&mut self, contracts: &[TeachingContract]) -> Result<()> {
        for contract in contracts {
            if let Some((key, schema)) = contract
                .schema
                .iter()
                .find(|(key, schema)| schema.name != *key)
            {
                return Err(UnitError::SchemaNameMismatch {
                    unit: self.unit_id.clone(),
                    key: key.to_string(),
                    embedded: schema.name.clone(),
                });
            }

            for (name, schema) in contract.schema.iter() {
                let key = namespaced(&contract.unit_id, name);
                let mut learned = schema.clone();
                learned.name = key.clone();
                self.set(key, learned)?;
            }
            debug!(
                unit = %self.unit_id,
                teacher = %contract.unit_id,
                count = contract.schema.size(),
                "Schemas learned"
            );
        }
        Ok(())
    }

    /// Check `value` against the parameter shape of `name`
    pub fn validate(&self, name: &str, value: &Value) -> ValidationResult {
        match self.entries.get(name) {
            Some(schema) => schema.parameters.check(value),
            None => ValidationResult::invalid(vec![format!("no schema registered for '{name}'")]),
        }
    }

    /// Check `value` against the response shape of `name` (valid if none declared)
    pub fn validate_response(&self, name: &str, value: &Value) -> ValidationResult {
        match self.entries.get(name).and_then(|s| s.response.as_ref()) {
            Some(response) => response.check(value),
            None => ValidationResult::ok(),
        }
    }
}

fn schema_to_value(schema: &ToolSchema) -> Value {
    let mut entry = serde_json::json!({
        "name": schema.name,
        "description": schema.description,
        "parameters": schema.parameters,
    });
    if let Some(response) = &schema.response {
        entry["response"] = serde_json::json!(response);
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityRegistry;
    use serde_json::json;

    fn add_schema() -> ToolSchema {
        ToolSchema::new("add", "Add two numbers").with_parameters(
            ObjectSchema::new()
                .required_property("a", PropertySchema::new(PropertyType::Number, "First addend"))
                .required_property("b", PropertySchema::new(PropertyType::Number, "Second addend")),
        )
    }

    #[test]
    fn test_add_and_duplicate() {
        let mut registry = SchemaRegistry::new("calc");
        registry.add("add", add_schema()).unwrap();
        assert!(registry.has("add"));

        let err = registry.add("add", add_schema()).unwrap_err();
        assert!(matches!(err, UnitError::DuplicateSchema { .. }));
        assert!(registry.set("add", add_schema()).is_ok());
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_structural_checks() {
        let mut registry = SchemaRegistry::new("calc");

        let no_description = ToolSchema::new("add", " ");
        assert!(matches!(
            registry.add("add", no_description),
            Err(UnitError::InvalidSchema { .. })
        ));

        let mut not_object = add_schema();
        not_object.parameters.kind = "array".into();
        assert!(matches!(
            registry.add("add", not_object),
            Err(UnitError::InvalidSchema { .. })
        ));

        let err = registry.add("sum", add_schema()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[calc] Schema name mismatch: key 'sum' carries embedded name 'add'"
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_validate_types_and_required() {
        let mut registry = SchemaRegistry::new("calc");
        registry.add("add", add_schema()).unwrap();

        assert!(registry.validate("add", &json!({"a": 1, "b": 2})).valid);
        assert!(registry.validate("add", &json!({"a": 1, "b": 2, "extra": true})).valid);

        let wrong_type = registry.validate("add", &json!({"a": "x", "b": 3}));
        assert!(!wrong_type.valid);
        assert_eq!(wrong_type.errors, vec!["property 'a' expected number, got string"]);

        let missing = registry.validate("add", &json!({"a": 1}));
        assert_eq!(missing.errors, vec!["missing required property 'b'"]);

        let not_object = registry.validate("add", &json!([1, 2]));
        assert!(!not_object.valid);

        assert!(!registry.validate("unknown", &json!({})).valid);
    }

    #[test]
    fn test_validate_enum_array_object() {
        let schema = ToolSchema::new("format", "Format items").with_parameters(
            ObjectSchema::new()
                .required_property(
                    "style",
                    PropertySchema::new(PropertyType::String, "Output style")
                        .one_of([json!("upper"), json!("lower")]),
                )
                .property("items", PropertySchema::new(PropertyType::Array, "Items"))
                .property("options", PropertySchema::new(PropertyType::Object, "Options")),
        );
        let mut registry = SchemaRegistry::new("text");
        registry.add("format", schema).unwrap();

        assert!(registry
            .validate("format", &json!({"style": "upper", "items": [], "options": {}}))
            .valid);
        assert!(!registry.validate("format", &json!({"style": "title"})).valid);
        assert!(!registry
            .validate("format", &json!({"style": "upper", "items": {}}))
            .valid);
        assert!(!registry
            .validate("format", &json!({"style": "upper", "options": null}))
            .valid);
        assert!(!registry
            .validate("format", &json!({"style": "upper", "options": [1]}))
            .valid);
    }

    #[test]
    fn test_validate_response() {
        let schema = add_schema().with_response(
            ObjectSchema::new()
                .required_property("result", PropertySchema::new(PropertyType::Number, "Sum")),
        );
        let mut registry = SchemaRegistry::new("calc");
        registry.add("add", schema).unwrap();

        assert!(registry.validate_response("add", &json!({"result": 3})).valid);
        assert!(!registry.validate_response("add", &json!({"result": "3"})).valid);
        assert!(registry.validate_response("other", &json!(null)).valid);
    }

    #[test]
    fn test_export_shapes() {
        let mut registry = SchemaRegistry::new("calc");
        registry.add("add", add_schema()).unwrap();
        registry
            .add("noop", ToolSchema::new("noop", "Do nothing"))
            .unwrap();

        let json = registry.to_json();
        assert_eq!(json["add"]["name"], "add");
        assert_eq!(json["add"]["parameters"]["type"], "object");
        assert_eq!(json["add"]["parameters"]["required"], json!(["a", "b"]));
        assert_eq!(json["add"]["parameters"]["properties"]["a"]["type"], "number");
        assert!(json["add"].get("response").is_none());

        let array = registry.to_array();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["name"], "add");
        assert_eq!(array[1]["name"], "noop");

        let record = registry.to_record();
        assert_eq!(record["add"], add_schema());
    }

    #[test]
    fn test_learn_rewrites_names() {
        let mut teacher = SchemaRegistry::new("calculator");
        teacher.add("add", add_schema()).unwrap();
        let contract = TeachingContract::new("calculator", CapabilityRegistry::new("calculator"), teacher);

        let mut learner = SchemaRegistry::new("math");
        learner.learn(std::slice::from_ref(&contract)).unwrap();
        learner.learn(std::slice::from_ref(&contract)).unwrap();

        assert_eq!(learner.list(), vec!["calculator.add"]);
        assert_eq!(learner.get("calculator.add").unwrap().name, "calculator.add");
        assert_eq!(learner.to_array()[0]["name"], "calculator.add");
    }

    #[test]
    fn test_learn_rejects_mismatched_contract() {
        let mut teacher = SchemaRegistry::new("calculator");
        teacher.add("add", add_schema()).unwrap();
        let mut contract =
            TeachingContract::new("calculator", CapabilityRegistry::new("calculator"), teacher);
        // Corrupt the embedded name behind the registry's back.
        let mut broken = add_schema();
        broken.name = "sum".into();
        contract.schema.entries.insert("add".into(), broken);

        let mut learner = SchemaRegistry::new("math");
        let err = learner.learn(&[contract]).unwrap_err();
        assert!(matches!(err, UnitError::SchemaNameMismatch { .. }));
        assert!(learner.is_empty());
    }

    #[test]
    fn test_schema_roundtrips_through_serde() {
        let raw = json!({
            "name": "greet",
            "description": "Say hello",
            "parameters": {
                "type": "object",
                "properties": {
                    "tone": {"type": "string", "description": "Tone", "enum": ["warm", "dry"]}
                },
                "required": ["tone"]
            }
        });
        let schema: ToolSchema = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(schema.parameters.properties["tone"].allowed.as_ref().unwrap().len(), 2);
        assert_eq!(serde_json::to_value(&schema).unwrap(), raw);
    }
}
