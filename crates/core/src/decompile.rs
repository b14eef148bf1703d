//! Canonical decompilation: canonical document back to entity instance.
//!
//! Dispatch is polymorphic on the document's `kind` tag. Every field is
//! reassigned through the validated builder path, so a decompiled instance
//! is exactly as well-formed as a hand-authored one. Fields whose schema
//! declares a nested entity kind are rebuilt recursively through that kind's
//! own decompile, carrying a context path of ancestor kind/name pairs used
//! to synthesize deterministic names for anonymous nested documents.

use std::collections::BTreeMap;

use serde_json::Value as Json;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{self, TypeEntry};
use crate::entity::Entity;
use crate::schema::{FieldType, SchemaError, is_internal_name};
use crate::value::{Document, Value};

#[derive(Debug, Error)]
pub enum DecompileError {
  #[error("unknown entity kind '{kind}'")]
  UnknownKind { kind: String },

  #[error("unsupported feature: {detail}")]
  Unsupported { detail: String },

  #[error("malformed document: {detail}")]
  Malformed { detail: String },

  #[error(transparent)]
  Schema(#[from] SchemaError),
}

/// Decompilation context: the ordered list of ancestor kind/name pairs, an
/// optional caller-supplied name prefix, and per-scope ordinals for
/// anonymous siblings. A fresh child context is opened for each entity's
/// nested fields.
#[derive(Debug, Clone, Default)]
pub struct DecompileCtx {
  prefix: String,
  path: Vec<(String, String)>,
  counters: BTreeMap<String, usize>,
}

impl DecompileCtx {
  pub fn new() -> Self {
    DecompileCtx::default()
  }

  /// A context whose prefix namespaces every name resolved under it. Used
  /// when several sibling trees decompile into one shared set of names.
  pub fn with_prefix(prefix: &str) -> Self {
    DecompileCtx {
      prefix: prefix.to_string(),
      ..DecompileCtx::default()
    }
  }

  pub fn prefix(&self) -> &str {
    &self.prefix
  }

  /// Ancestor kind/name pairs, outermost first.
  pub fn path(&self) -> &[(String, String)] {
    &self.path
  }

  /// The context for fields nested under an entity of `kind`/`name`.
  pub fn child(&self, kind: &str, name: &str) -> DecompileCtx {
    let mut path = self.path.clone();
    path.push((kind.to_string(), name.to_string()));
    DecompileCtx {
      prefix: self.prefix.clone(),
      path,
      counters: BTreeMap::new(),
    }
  }

  /// Resolve an entity's name. Explicit names get the prefix applied;
  /// anonymous documents get a deterministic synthetic name built from the
  /// ancestor names and the kind, with an ordinal once a scope holds more
  /// than one anonymous sibling of the same kind.
  pub fn resolve_name(&mut self, explicit: Option<&str>, kind: &str) -> String {
    if let Some(name) = explicit {
      if !name.is_empty() {
        return format!("{}{}", self.prefix, name);
      }
    }
    let counter = self.counters.entry(kind.to_string()).or_insert(0);
    *counter += 1;
    let ordinal = *counter;
    let mut parts: Vec<&str> = self
      .path
      .iter()
      .map(|(_, name)| name.as_str())
      .filter(|name| !name.is_empty())
      .collect();
    parts.push(kind);
    let base = if parts.len() == 1 {
      // No named ancestors to inherit the prefix from.
      format!("{}{}", self.prefix, kind)
    } else {
      parts.join("_")
    };
    if ordinal > 1 {
      format!("{base}{ordinal}")
    } else {
      base
    }
  }
}

/// Decompile a document by its own `kind` tag.
pub fn decompile(doc: &Document) -> Result<Entity, DecompileError> {
  let mut ctx = DecompileCtx::new();
  decompile_with(doc, &mut ctx)
}

pub fn decompile_with(doc: &Document, ctx: &mut DecompileCtx) -> Result<Entity, DecompileError> {
  let kind = doc
    .get("kind")
    .and_then(Json::as_str)
    .ok_or_else(|| DecompileError::Malformed {
      detail: "document has no 'kind' key".to_string(),
    })?
    .to_string();
  decompile_as(&kind, doc, ctx)
}

/// Decompile a document whose expected kind is known from the enclosing
/// schema. A `kind` tag in the document wins when present, so a field
/// declared as some base kind accepts documents of any kind descending from
/// it; the tag may also be absent entirely (hook-synthesized
/// sub-documents), in which case the declared kind applies.
pub fn decompile_as(
  declared: &str,
  doc: &Document,
  ctx: &mut DecompileCtx,
) -> Result<Entity, DecompileError> {
  let actual = doc
    .get("kind")
    .and_then(Json::as_str)
    .unwrap_or(declared)
    .to_string();
  let entry = catalog::lookup(&actual).ok_or_else(|| DecompileError::UnknownKind {
    kind: actual.clone(),
  })?;
  if !entry.schema.is_a(declared) {
    return Err(DecompileError::Malformed {
      detail: format!("kind '{actual}' is not a '{declared}'"),
    });
  }
  debug!(kind = %actual, "decompiling document");

  let mut doc = doc.clone();
  entry.hooks.pre_decompile(&mut doc, ctx)?;

  let explicit_name = doc
    .remove("name")
    .and_then(|v| v.as_str().map(str::to_string));
  let name = ctx.resolve_name(explicit_name.as_deref(), &actual);
  let description = doc
    .remove("description")
    .and_then(|v| v.as_str().map(str::to_string))
    .unwrap_or_default();
  doc.remove("kind");

  let mut builder = Entity::declare(&actual, &name)?.describe(&description);
  let mut child = ctx.child(&actual, &name);
  for (field, json) in &doc {
    let value = raise_field(&entry, field, json, &mut child)?;
    builder = builder.set(field, value)?;
  }

  let mut entity = builder.build();
  entry.hooks.post_decompile(&mut entity, ctx)?;
  Ok(entity)
}

/// Lift a document field back into an attribute value. Fields typed as
/// nested entities recurse through the engine; everything else converts
/// structurally and is left to the builder's validation.
fn raise_field(
  entry: &TypeEntry,
  field: &str,
  json: &Json,
  ctx: &mut DecompileCtx,
) -> Result<Value, DecompileError> {
  if is_internal_name(field) {
    return Ok(Value::from_json(json));
  }
  let spec = match entry.schema.fields.lookup(field) {
    Some(spec) => spec,
    // Unknown field: hand the raw value to the builder so the failure is
    // the same UnknownAttribute a hand-written declaration would get.
    None => return Ok(Value::from_json(json)),
  };
  let value = match (&spec.field_type, spec.is_array) {
    (FieldType::Entity(kind), false) => match json {
      Json::Object(obj) => Value::from(decompile_as(kind, obj, ctx)?),
      other => Value::from_json(other),
    },
    (FieldType::Entity(kind), true) => match json {
      Json::Array(items) => Value::List(
        items
          .iter()
          .map(|item| match item {
            Json::Object(obj) => decompile_as(kind, obj, ctx).map(Value::from),
            other => Ok(Value::from_json(other)),
          })
          .collect::<Result<Vec<_>, DecompileError>>()?,
      ),
      other => Value::from_json(other),
    },
    _ => Value::from_json(json),
  };
  Ok(value)
}
