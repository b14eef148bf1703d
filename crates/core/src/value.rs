use std::collections::BTreeMap;

use serde_json::Value as Json;

use crate::entity::Entity;

/// A canonical document: the JSON-compatible mapping an entity compiles to.
///
/// Always carries `kind`, `name` and `description` keys alongside the
/// compiled fields. serde_json's default map keeps keys sorted, so documents
/// serialize deterministically.
pub type Document = serde_json::Map<String, Json>;

/// A field value as authored in an entity declaration.
///
/// Mirrors the JSON data model plus one extra arm: `Entity`, a nested typed
/// instance that compiles and decompiles through its own schema and hooks
/// rather than as a plain mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  List(Vec<Value>),
  Map(BTreeMap<String, Value>),
  Entity(Box<Entity>),
}

impl Value {
  /// Short type label used in validation error messages.
  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Null => "null",
      Value::Bool(_) => "boolean",
      Value::Int(_) => "integer",
      Value::Float(_) => "float",
      Value::Str(_) => "string",
      Value::List(_) => "list",
      Value::Map(_) => "mapping",
      Value::Entity(_) => "entity",
    }
  }

  /// Convert a JSON value into an attribute value. Numbers become `Int`
  /// when they fit in `i64`, otherwise `Float`. No entity reconstruction
  /// happens here; that is the decompiler's job.
  pub fn from_json(json: &Json) -> Value {
    match json {
      Json::Null => Value::Null,
      Json::Bool(b) => Value::Bool(*b),
      Json::Number(n) => match n.as_i64() {
        Some(i) => Value::Int(i),
        None => Value::Float(n.as_f64().unwrap_or(0.0)),
      },
      Json::String(s) => Value::Str(s.clone()),
      Json::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
      Json::Object(map) => Value::Map(
        map
          .iter()
          .map(|(k, v)| (k.clone(), Value::from_json(v)))
          .collect(),
      ),
    }
  }

  /// Render a value as plain JSON without compiling anything. Returns `None`
  /// when the value (or anything nested in it) is an entity, since entities
  /// have no plain JSON form outside the compiler.
  pub fn to_plain_json(&self) -> Option<Json> {
    match self {
      Value::Null => Some(Json::Null),
      Value::Bool(b) => Some(Json::Bool(*b)),
      Value::Int(i) => Some(Json::from(*i)),
      Value::Float(f) => serde_json::Number::from_f64(*f).map(Json::Number),
      Value::Str(s) => Some(Json::String(s.clone())),
      Value::List(items) => items
        .iter()
        .map(Value::to_plain_json)
        .collect::<Option<Vec<_>>>()
        .map(Json::Array),
      Value::Map(map) => map
        .iter()
        .map(|(k, v)| v.to_plain_json().map(|j| (k.clone(), j)))
        .collect::<Option<Document>>()
        .map(Json::Object),
      Value::Entity(_) => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Str(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Value::Int(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
    match self {
      Value::Map(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[Value]> {
    match self {
      Value::List(items) => Some(items),
      _ => None,
    }
  }

  pub fn as_entity(&self) -> Option<&Entity> {
    match self {
      Value::Entity(e) => Some(e),
      _ => None,
    }
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self {
    Value::Int(i)
  }
}

impl From<i32> for Value {
  fn from(i: i32) -> Self {
    Value::Int(i64::from(i))
  }
}

impl From<f64> for Value {
  fn from(f: f64) -> Self {
    Value::Float(f)
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::Str(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::Str(s)
  }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
  fn from(items: Vec<T>) -> Self {
    Value::List(items.into_iter().map(Into::into).collect())
  }
}

impl From<BTreeMap<String, Value>> for Value {
  fn from(map: BTreeMap<String, Value>) -> Self {
    Value::Map(map)
  }
}

impl From<Entity> for Value {
  fn from(entity: Entity) -> Self {
    Value::Entity(Box::new(entity))
  }
}
