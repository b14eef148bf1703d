//! Entity instances and the validated declaration path.
//!
//! An entity is declared against a registered kind, assembled through a
//! builder that validates every field assignment at declaration time, and is
//! immutable afterwards except through the same validated path
//! (`set_attr`). Defaults are not materialized into the instance; they
//! overlay at compile time so an instance only carries what its author set.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::catalog;
use crate::schema::{EntitySchema, SchemaError, is_internal_name};
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Entity {
  schema: Arc<EntitySchema>,
  name: String,
  description: String,
  attrs: BTreeMap<String, Value>,
  internal: BTreeMap<String, Value>,
}

impl Entity {
  /// Start declaring an instance of a registered kind. Fails when the kind
  /// has no schema in the catalog, which is a programming error rather than
  /// bad input.
  pub fn declare(kind: &str, name: &str) -> Result<EntityBuilder, SchemaError> {
    let entry = catalog::lookup(kind).ok_or_else(|| SchemaError::MissingSchema {
      kind: kind.to_string(),
    })?;
    Ok(EntityBuilder {
      schema: entry.schema,
      name: name.to_string(),
      description: String::new(),
      attrs: BTreeMap::new(),
      internal: BTreeMap::new(),
    })
  }

  pub fn kind(&self) -> &str {
    &self.schema.kind
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn schema(&self) -> &EntitySchema {
    &self.schema
  }

  /// True when this instance's kind is `kind` or descends from it.
  pub fn is_a(&self, kind: &str) -> bool {
    self.schema.is_a(kind)
  }

  /// A user-set field value, if any. Does not fall back to schema defaults.
  pub fn get(&self, field: &str) -> Option<&Value> {
    self.attrs.get(field)
  }

  /// A field's effective value: user-set if present, else the schema
  /// default.
  pub fn effective(&self, field: &str) -> Option<Value> {
    self
      .attrs
      .get(field)
      .cloned()
      .or_else(|| self.schema.defaults.get(field).map(Value::from_json))
  }

  pub fn get_internal(&self, field: &str) -> Option<&Value> {
    self.internal.get(field)
  }

  pub fn attrs(&self) -> &BTreeMap<String, Value> {
    &self.attrs
  }

  pub fn internal_attrs(&self) -> &BTreeMap<String, Value> {
    &self.internal
  }

  /// The merged attribute view the compiler works from: schema defaults
  /// overlaid with user-set fields. A field the user set is never replaced,
  /// even when its value equals the default. Internal fields are excluded.
  pub fn all_attrs(&self) -> BTreeMap<String, Value> {
    let mut merged: BTreeMap<String, Value> = self
      .schema
      .defaults
      .iter()
      .map(|(k, v)| (k.clone(), Value::from_json(v)))
      .collect();
    for (field, value) in &self.attrs {
      merged.insert(field.clone(), value.clone());
    }
    merged
  }

  /// Validated mutation after build. Internal `__…__` names bypass
  /// validation and land in the internal map.
  pub fn set_attr(&mut self, field: &str, value: impl Into<Value>) -> Result<(), SchemaError> {
    let value = value.into();
    if is_internal_name(field) {
      self.internal.insert(field.to_string(), value);
      return Ok(());
    }
    self.schema.validate(field, &value)?;
    self.attrs.insert(field.to_string(), value);
    Ok(())
  }

  pub fn set_description(&mut self, text: &str) {
    self.description = text.to_string();
  }
}

impl PartialEq for Entity {
  fn eq(&self, other: &Self) -> bool {
    self.kind() == other.kind()
      && self.name == other.name
      && self.description == other.description
      && self.attrs == other.attrs
      && self.internal == other.internal
  }
}

/// Builder returned by [`Entity::declare`]. Every `set` validates
/// immediately so a bad declaration fails at the line that wrote it, not at
/// compile time.
#[derive(Debug)]
pub struct EntityBuilder {
  schema: Arc<EntitySchema>,
  name: String,
  description: String,
  attrs: BTreeMap<String, Value>,
  internal: BTreeMap<String, Value>,
}

impl EntityBuilder {
  pub fn describe(mut self, text: &str) -> Self {
    self.description = text.to_string();
    self
  }

  pub fn set(mut self, field: &str, value: impl Into<Value>) -> Result<Self, SchemaError> {
    let value = value.into();
    if is_internal_name(field) {
      self.internal.insert(field.to_string(), value);
      return Ok(self);
    }
    self.schema.validate(field, &value)?;
    self.attrs.insert(field.to_string(), value);
    Ok(self)
  }

  /// Seed this declaration from another instance's user-set fields,
  /// revalidating each against this builder's schema. Later `set` calls
  /// override seeded values.
  pub fn extending(mut self, base: &Entity) -> Result<Self, SchemaError> {
    for (field, value) in base.attrs() {
      self.schema.validate(field, value)?;
      self.attrs.insert(field.clone(), value.clone());
    }
    for (field, value) in base.internal_attrs() {
      self.internal.insert(field.clone(), value.clone());
    }
    Ok(self)
  }

  pub fn build(self) -> Entity {
    Entity {
      schema: self.schema,
      name: self.name,
      description: self.description,
      attrs: self.attrs,
      internal: self.internal,
    }
  }
}
