//! Entity schemas and field validation.
//!
//! A schema names the fields an entity kind accepts, the validator for each
//! field, and the default the compiler fills in when a field is left unset.
//! Schemas compose: a derived schema overlays its parent's field table and
//! defaults, computed once when the kind is registered.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;

use crate::value::Value;

#[derive(Debug, Error)]
pub enum SchemaError {
  #[error("unknown attribute '{field}' for kind '{kind}'")]
  UnknownAttribute { kind: String, field: String },

  #[error("invalid value for '{kind}.{field}': expected {expected}, got {got}")]
  InvalidValue {
    kind: String,
    field: String,
    expected: String,
    got: &'static str,
  },

  #[error("no schema registered for kind '{kind}'")]
  MissingSchema { kind: String },

  #[error("field name '{field}' on kind '{kind}' is reserved")]
  ReservedField { kind: String, field: String },
}

/// Keys the compiler injects into every canonical document. A schema may not
/// declare fields with these names.
pub const RESERVED_KEYS: [&str; 3] = ["kind", "name", "description"];

/// Field names bracketed by double underscores are internal bookkeeping.
/// They bypass validation and never appear in compiled documents.
pub fn is_internal_name(name: &str) -> bool {
  name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

/// The validator attached to a field. `Entity` carries the kind tag the
/// nested instance must belong to (directly or through its schema lineage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
  Str,
  Int,
  Bool,
  Dict,
  Any,
  Entity(String),
}

impl FieldType {
  /// Human label used in `InvalidValue` messages.
  pub fn expects(&self) -> String {
    match self {
      FieldType::Str => "string".to_string(),
      FieldType::Int => "integer".to_string(),
      FieldType::Bool => "boolean".to_string(),
      FieldType::Dict => "mapping".to_string(),
      FieldType::Any => "any value".to_string(),
      FieldType::Entity(kind) => format!("entity of kind '{kind}'"),
    }
  }

  pub fn admits(&self, value: &Value) -> bool {
    match self {
      FieldType::Str => matches!(value, Value::Str(_)),
      FieldType::Int => matches!(value, Value::Int(_)),
      FieldType::Bool => matches!(value, Value::Bool(_)),
      FieldType::Dict => matches!(value, Value::Map(_)),
      FieldType::Any => true,
      FieldType::Entity(kind) => match value {
        Value::Entity(e) => e.is_a(kind),
        _ => false,
      },
    }
  }
}

/// One entry of the validator registry: a validator plus the is-array flag.
/// An array field requires a homogeneous list whose members each validate
/// individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
  pub field_type: FieldType,
  pub is_array: bool,
}

impl FieldSpec {
  pub fn single(field_type: FieldType) -> Self {
    FieldSpec { field_type, is_array: false }
  }

  pub fn array(field_type: FieldType) -> Self {
    FieldSpec { field_type, is_array: true }
  }

  pub fn expects(&self) -> String {
    if self.is_array {
      format!("list of {}", self.field_type.expects())
    } else {
      self.field_type.expects()
    }
  }

  pub fn admits(&self, value: &Value) -> bool {
    if self.is_array {
      match value {
        Value::List(items) => items.iter().all(|v| self.field_type.admits(v)),
        _ => false,
      }
    } else {
      self.field_type.admits(value)
    }
  }
}

/// The per-kind validator registry: field name to `FieldSpec`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldTable {
  fields: BTreeMap<String, FieldSpec>,
}

impl FieldTable {
  pub fn new() -> Self {
    FieldTable::default()
  }

  pub fn register(&mut self, name: impl Into<String>, spec: FieldSpec) {
    self.fields.insert(name.into(), spec);
  }

  pub fn lookup(&self, name: &str) -> Option<&FieldSpec> {
    self.fields.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.fields.contains_key(name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.fields.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldSpec)> {
    self.fields.iter()
  }

  pub fn len(&self) -> usize {
    self.fields.len()
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }

  /// This table overlaid with `other`: entries in `other` win. Used for
  /// schema composition.
  pub fn overlay(&self, other: &FieldTable) -> FieldTable {
    let mut merged = self.fields.clone();
    for (name, spec) in &other.fields {
      merged.insert(name.clone(), spec.clone());
    }
    FieldTable { fields: merged }
  }

  /// Validate an assignment. Internal `__…__` names always pass; unknown
  /// names fail with `UnknownAttribute`; known names delegate to the field's
  /// validator.
  pub fn validate(&self, kind: &str, field: &str, value: &Value) -> Result<(), SchemaError> {
    if is_internal_name(field) {
      return Ok(());
    }
    let spec = self.lookup(field).ok_or_else(|| SchemaError::UnknownAttribute {
      kind: kind.to_string(),
      field: field.to_string(),
    })?;
    if !spec.admits(value) {
      return Err(SchemaError::InvalidValue {
        kind: kind.to_string(),
        field: field.to_string(),
        expected: spec.expects(),
        got: value.type_name(),
      });
    }
    Ok(())
  }
}

/// Schema for one entity kind. `lineage` lists the kind itself followed by
/// its ancestors, filled in when the schema is sealed or composed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
  pub kind: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub parent: Option<String>,
  #[serde(default)]
  pub doc: String,
  pub fields: FieldTable,
  #[serde(default)]
  pub defaults: BTreeMap<String, Json>,
  #[serde(skip)]
  lineage: Vec<String>,
}

impl EntitySchema {
  pub fn new(kind: impl Into<String>) -> Self {
    EntitySchema {
      kind: kind.into(),
      parent: None,
      doc: String::new(),
      fields: FieldTable::new(),
      defaults: BTreeMap::new(),
      lineage: Vec::new(),
    }
  }

  pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
    self.parent = Some(parent.into());
    self
  }

  pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
    self.doc = doc.into();
    self
  }

  pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
    self.fields.register(name, spec);
    self
  }

  pub fn default_value(mut self, name: impl Into<String>, value: Json) -> Self {
    self.defaults.insert(name.into(), value);
    self
  }

  /// Kind followed by ancestor kinds, nearest first. Empty until the schema
  /// has been sealed or composed.
  pub fn lineage(&self) -> &[String] {
    &self.lineage
  }

  pub fn is_a(&self, kind: &str) -> bool {
    self.lineage.iter().any(|k| k == kind)
  }

  /// Finalize a schema that has no parent.
  pub fn sealed(mut self) -> Self {
    self.lineage = vec![self.kind.clone()];
    self
  }

  /// Compose this schema over its already-finalized parent: the parent's
  /// fields and defaults overlaid with this schema's own.
  pub fn composed_over(mut self, base: &EntitySchema) -> Self {
    self.fields = base.fields.overlay(&self.fields);
    let mut defaults = base.defaults.clone();
    defaults.append(&mut self.defaults.clone());
    self.defaults = defaults;
    self.lineage = std::iter::once(self.kind.clone())
      .chain(base.lineage.iter().cloned())
      .collect();
    self
  }

  pub fn validate(&self, field: &str, value: &Value) -> Result<(), SchemaError> {
    self.fields.validate(&self.kind, field, value)
  }
}

/// External source of schema definitions, queried once per kind when the
/// kind is registered.
pub trait SchemaSource {
  fn get_schema(&self, kind: &str) -> Option<EntitySchema>;
}

impl SchemaSource for BTreeMap<String, EntitySchema> {
  fn get_schema(&self, kind: &str) -> Option<EntitySchema> {
    self.get(kind).cloned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn probe_schema() -> EntitySchema {
    EntitySchema::new("Probe")
      .field("port", FieldSpec::single(FieldType::Int))
      .field("host", FieldSpec::single(FieldType::Str))
      .field("tags", FieldSpec::array(FieldType::Str))
      .default_value("port", json!(80))
      .sealed()
  }

  // ===== Field validation =====

  #[test]
  fn unknown_field_is_rejected() {
    let schema = probe_schema();
    let err = schema.validate("interval", &Value::Int(5)).unwrap_err();
    assert!(matches!(err, SchemaError::UnknownAttribute { field, .. } if field == "interval"));
  }

  #[test]
  fn wrong_type_is_rejected_with_labels() {
    let schema = probe_schema();
    let err = schema.validate("port", &Value::Str("eighty".into())).unwrap_err();
    match err {
      SchemaError::InvalidValue { expected, got, .. } => {
        assert_eq!(expected, "integer");
        assert_eq!(got, "string");
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn array_fields_check_every_member() {
    let schema = probe_schema();
    schema
      .validate("tags", &Value::List(vec!["a".into(), "b".into()]))
      .unwrap();
    let err = schema
      .validate("tags", &Value::List(vec!["a".into(), Value::Int(1)]))
      .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidValue { .. }));
    let err = schema.validate("tags", &Value::Str("a".into())).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidValue { expected, .. } if expected == "list of string"));
  }

  #[test]
  fn internal_names_bypass_validation() {
    let schema = probe_schema();
    schema.validate("__meta__", &Value::Int(1)).unwrap();
    // Not internal: wrong bracket shape
    assert!(!is_internal_name("__"));
    assert!(!is_internal_name("____"));
    assert!(!is_internal_name("_x_"));
    assert!(is_internal_name("__x__"));
  }

  // ===== Composition =====

  #[test]
  fn composed_schema_overlays_fields_and_defaults() {
    let base = probe_schema();
    let derived = EntitySchema::new("TlsProbe")
      .with_parent("Probe")
      .field("port", FieldSpec::single(FieldType::Int))
      .field("sni", FieldSpec::single(FieldType::Str))
      .default_value("port", json!(443))
      .composed_over(&base);

    assert!(derived.fields.contains("host"));
    assert!(derived.fields.contains("sni"));
    assert_eq!(derived.defaults["port"], json!(443));
    assert_eq!(derived.lineage(), ["TlsProbe", "Probe"]);
    assert!(derived.is_a("Probe"));
    assert!(!base.is_a("TlsProbe"));
  }

  #[test]
  fn chained_composition_keeps_full_lineage() {
    let base = probe_schema();
    let mid = EntitySchema::new("TlsProbe").with_parent("Probe").composed_over(&base);
    let leaf = EntitySchema::new("MutualTlsProbe")
      .with_parent("TlsProbe")
      .field("client_cert", FieldSpec::single(FieldType::Str))
      .composed_over(&mid);
    assert_eq!(leaf.lineage(), ["MutualTlsProbe", "TlsProbe", "Probe"]);
    assert!(leaf.fields.contains("host"));
    assert!(leaf.fields.contains("client_cert"));
  }
}
