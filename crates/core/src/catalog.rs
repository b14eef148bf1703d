//! Process-wide type catalog.
//!
//! Maps each kind tag to its resolved schema and per-type hooks. The catalog
//! is populated during startup (registration is a single-writer activity by
//! convention; the lock below is required plumbing for shared statics, not a
//! concurrency guarantee) and consulted by the builder, the compiler and the
//! decompiler. Re-registering a kind overwrites the previous entry:
//! last-declared-wins. `reset` exists for test isolation only.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::compile::{CompileEnv, CompileError};
use crate::decompile::{DecompileCtx, DecompileError};
use crate::entity::Entity;
use crate::schema::{EntitySchema, RESERVED_KEYS, SchemaError, SchemaSource};
use crate::value::Document;

/// Per-kind override points around the generic compile/decompile paths.
/// Every method defaults to a no-op; kinds with custom wire behavior (the
/// substrate being the canonical example) implement what they need.
pub trait TypeHooks: Send + Sync {
  /// Runs after the generic compile, on the assembled document.
  fn post_compile(&self, _doc: &mut Document, _env: &CompileEnv<'_>) -> Result<(), CompileError> {
    Ok(())
  }

  /// Runs before any field of an incoming document is reassigned. May reject
  /// the document outright or rewrite it into its authoring shape.
  fn pre_decompile(&self, _doc: &mut Document, _ctx: &mut DecompileCtx) -> Result<(), DecompileError> {
    Ok(())
  }

  /// Runs after the instance has been rebuilt through validated assignment.
  fn post_decompile(&self, _entity: &mut Entity, _ctx: &mut DecompileCtx) -> Result<(), DecompileError> {
    Ok(())
  }
}

/// No-op hooks for kinds with purely generic behavior.
pub struct GenericHooks;

impl TypeHooks for GenericHooks {}

#[derive(Clone)]
pub struct TypeEntry {
  pub schema: Arc<EntitySchema>,
  pub hooks: Arc<dyn TypeHooks>,
}

static CATALOG: LazyLock<RwLock<BTreeMap<String, TypeEntry>>> =
  LazyLock::new(|| RwLock::new(BTreeMap::new()));

fn read_catalog() -> RwLockReadGuard<'static, BTreeMap<String, TypeEntry>> {
  CATALOG.read().unwrap_or_else(|poison| poison.into_inner())
}

fn write_catalog() -> RwLockWriteGuard<'static, BTreeMap<String, TypeEntry>> {
  CATALOG.write().unwrap_or_else(|poison| poison.into_inner())
}

/// Register a kind. The schema is finalized here: a parent-less schema is
/// sealed as a lineage root, a derived schema is composed over its parent,
/// which must already be registered.
pub fn register(schema: EntitySchema, hooks: Arc<dyn TypeHooks>) -> Result<(), SchemaError> {
  for key in RESERVED_KEYS {
    if schema.fields.contains(key) {
      return Err(SchemaError::ReservedField {
        kind: schema.kind.clone(),
        field: key.to_string(),
      });
    }
  }

  let resolved = match &schema.parent {
    None => schema.sealed(),
    Some(parent) => {
      let base = lookup(parent).ok_or_else(|| SchemaError::MissingSchema {
        kind: parent.clone(),
      })?;
      schema.composed_over(&base.schema)
    }
  };

  let kind = resolved.kind.clone();
  let entry = TypeEntry {
    schema: Arc::new(resolved),
    hooks,
  };
  let replaced = write_catalog().insert(kind.clone(), entry).is_some();
  debug!(kind = %kind, replaced, "registered entity kind");
  Ok(())
}

/// Register a kind with no custom hooks.
pub fn register_generic(schema: EntitySchema) -> Result<(), SchemaError> {
  register(schema, Arc::new(GenericHooks))
}

/// Pull a kind's schema from an external source and register it. The source
/// is queried once; the resolved schema is cached in the catalog for every
/// later declaration of that kind.
pub fn register_from(
  source: &dyn SchemaSource,
  kind: &str,
  hooks: Arc<dyn TypeHooks>,
) -> Result<(), SchemaError> {
  let schema = source.get_schema(kind).ok_or_else(|| SchemaError::MissingSchema {
    kind: kind.to_string(),
  })?;
  register(schema, hooks)
}

pub fn lookup(kind: &str) -> Option<TypeEntry> {
  read_catalog().get(kind).cloned()
}

pub fn is_registered(kind: &str) -> bool {
  read_catalog().contains_key(kind)
}

/// All registered kind tags, sorted.
pub fn kinds() -> Vec<String> {
  read_catalog().keys().cloned().collect()
}

/// Drop every registered kind. Test isolation only; production processes
/// register once at startup and never tear down.
pub fn reset() {
  write_catalog().clear();
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::{FieldSpec, FieldType};
  use serde_json::json;
  use serial_test::serial;

  fn widget_schema() -> EntitySchema {
    EntitySchema::new("Widget")
      .field("size", FieldSpec::single(FieldType::Int))
      .field("label", FieldSpec::single(FieldType::Str))
      .default_value("size", json!(1))
  }

  #[test]
  #[serial]
  fn register_and_lookup() {
    reset();
    register_generic(widget_schema()).unwrap();
    let entry = lookup("Widget").unwrap();
    assert_eq!(entry.schema.kind, "Widget");
    assert_eq!(entry.schema.lineage(), ["Widget"]);
    assert!(is_registered("Widget"));
    assert!(lookup("Gadget").is_none());
  }

  #[test]
  #[serial]
  fn last_registration_wins() {
    reset();
    register_generic(widget_schema()).unwrap();
    let respun = EntitySchema::new("Widget")
      .field("size", FieldSpec::single(FieldType::Int))
      .default_value("size", json!(9));
    register_generic(respun).unwrap();
    let entry = lookup("Widget").unwrap();
    assert_eq!(entry.schema.defaults["size"], json!(9));
    assert!(!entry.schema.fields.contains("label"));
  }

  #[test]
  #[serial]
  fn derived_kind_composes_over_registered_parent() {
    reset();
    register_generic(widget_schema()).unwrap();
    let derived = EntitySchema::new("NamedWidget")
      .with_parent("Widget")
      .field("owner", FieldSpec::single(FieldType::Str));
    register_generic(derived).unwrap();

    let entry = lookup("NamedWidget").unwrap();
    assert!(entry.schema.fields.contains("size"));
    assert!(entry.schema.fields.contains("owner"));
    assert_eq!(entry.schema.lineage(), ["NamedWidget", "Widget"]);
  }

  #[test]
  #[serial]
  fn derived_kind_without_parent_registration_fails() {
    reset();
    let derived = EntitySchema::new("Orphan").with_parent("NeverRegistered");
    let err = register_generic(derived).unwrap_err();
    assert!(matches!(err, SchemaError::MissingSchema { kind } if kind == "NeverRegistered"));
  }

  #[test]
  #[serial]
  fn reserved_field_names_are_rejected() {
    reset();
    let bad = EntitySchema::new("Widget").field("kind", FieldSpec::single(FieldType::Str));
    let err = register_generic(bad).unwrap_err();
    assert!(matches!(err, SchemaError::ReservedField { field, .. } if field == "kind"));
  }

  #[test]
  #[serial]
  fn register_from_queries_the_source_once_per_kind() {
    reset();
    let mut source = BTreeMap::new();
    source.insert("Widget".to_string(), widget_schema());
    register_from(&source, "Widget", Arc::new(GenericHooks)).unwrap();
    assert!(is_registered("Widget"));

    let err = register_from(&source, "Gadget", Arc::new(GenericHooks)).unwrap_err();
    assert!(matches!(err, SchemaError::MissingSchema { kind } if kind == "Gadget"));
  }

  #[test]
  #[serial]
  fn reset_clears_all_kinds() {
    reset();
    register_generic(widget_schema()).unwrap();
    assert!(!kinds().is_empty());
    reset();
    assert!(kinds().is_empty());
  }
}
