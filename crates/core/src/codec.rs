//! Document codec: canonical documents to and from text.
//!
//! Two encodings share one polymorphic contract. Encoding an entity routes
//! through the compiler; decoding parses the text and, when the result is a
//! mapping carrying a `kind` tag, routes it through the decompiler.
//! Anything else (plain API responses, lists, scalars) passes through as
//! raw JSON untouched.

use serde_json::Value as Json;
use thiserror::Error;

use crate::compile::{CompileEnv, CompileError, compile};
use crate::decompile::{DecompileError, decompile};
use crate::entity::Entity;

#[derive(Debug, Error)]
pub enum CodecError {
  #[error("json codec failed: {0}")]
  Json(#[from] serde_json::Error),

  #[error("structured codec failed: {0}")]
  Structured(#[from] serde_yaml::Error),

  #[error(transparent)]
  Compile(#[from] CompileError),

  #[error(transparent)]
  Decompile(#[from] DecompileError),
}

/// Result of decoding a text payload.
#[derive(Debug)]
pub enum Decoded {
  /// The payload was a canonical document; here is the rebuilt instance.
  Entity(Entity),
  /// Not an entity document; the parsed value, unchanged.
  Raw(Json),
}

impl Decoded {
  pub fn into_entity(self) -> Option<Entity> {
    match self {
      Decoded::Entity(entity) => Some(entity),
      Decoded::Raw(_) => None,
    }
  }

  pub fn as_entity(&self) -> Option<&Entity> {
    match self {
      Decoded::Entity(entity) => Some(entity),
      Decoded::Raw(_) => None,
    }
  }

  pub fn into_raw(self) -> Option<Json> {
    match self {
      Decoded::Entity(_) => None,
      Decoded::Raw(value) => Some(value),
    }
  }
}

/// Compile an entity and serialize the document as JSON. Pretty output is
/// indented and newline-terminated, fit for writing straight to a file.
pub fn encode_json(
  entity: &Entity,
  env: &CompileEnv<'_>,
  pretty: bool,
) -> Result<String, CodecError> {
  let doc = compile(entity, env)?;
  encode_json_raw(&Json::Object(doc), pretty)
}

/// Serialize an already-assembled JSON value.
pub fn encode_json_raw(value: &Json, pretty: bool) -> Result<String, CodecError> {
  if pretty {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
  } else {
    Ok(serde_json::to_string(value)?)
  }
}

/// Parse JSON text, routing entity documents through the decompiler.
pub fn decode_json(text: &str) -> Result<Decoded, CodecError> {
  let parsed: Json = serde_json::from_str(text)?;
  route(parsed)
}

/// Compile an entity and render the document in the structured,
/// human-oriented form.
pub fn encode_structured(entity: &Entity, env: &CompileEnv<'_>) -> Result<String, CodecError> {
  let doc = compile(entity, env)?;
  Ok(serde_yaml::to_string(&doc)?)
}

/// Parse structured text, routing entity documents through the decompiler.
pub fn decode_structured(text: &str) -> Result<Decoded, CodecError> {
  let parsed: Json = serde_yaml::from_str(text)?;
  route(parsed)
}

fn route(parsed: Json) -> Result<Decoded, CodecError> {
  match parsed {
    Json::Object(map) => {
      if map.get("kind").and_then(Json::as_str).is_some() {
        Ok(Decoded::Entity(decompile(&map)?))
      } else {
        Ok(Decoded::Raw(Json::Object(map)))
      }
    }
    other => Ok(Decoded::Raw(other)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog;
  use crate::schema::{EntitySchema, FieldSpec, FieldType};
  use crate::value::Value;
  use serde_json::json;
  use serial_test::serial;

  fn register_monitor() {
    catalog::reset();
    let monitor = EntitySchema::new("Monitor")
      .field("url", FieldSpec::single(FieldType::Str))
      .field("interval", FieldSpec::single(FieldType::Int))
      .field("regions", FieldSpec::array(FieldType::Str))
      .default_value("interval", json!(30))
      .default_value("regions", json!([]));
    catalog::register_generic(monitor).unwrap();
  }

  fn sample_monitor() -> Entity {
    Entity::declare("Monitor", "api_health")
      .unwrap()
      .describe("api liveness check")
      .set("url", "https://api.internal/health")
      .unwrap()
      .set("regions", vec!["eu", "us"])
      .unwrap()
      .build()
  }

  // ===== JSON =====

  #[test]
  #[serial]
  fn json_round_trip_rebuilds_the_instance() {
    register_monitor();
    let monitor = sample_monitor();
    let text = encode_json(&monitor, &CompileEnv::new(), false).unwrap();
    let decoded = decode_json(&text).unwrap().into_entity().unwrap();

    assert_eq!(decoded.kind(), "Monitor");
    assert_eq!(decoded.name(), "api_health");
    assert_eq!(decoded.get("url"), monitor.get("url"));
    assert_eq!(
      decoded.get("regions"),
      Some(&Value::List(vec!["eu".into(), "us".into()]))
    );
    // Re-encoding the decoded instance is byte-identical.
    let again = encode_json(&decoded, &CompileEnv::new(), false).unwrap();
    assert_eq!(again, text);
  }

  #[test]
  #[serial]
  fn pretty_output_is_indented_and_newline_terminated() {
    register_monitor();
    let text = encode_json(&sample_monitor(), &CompileEnv::new(), true).unwrap();
    assert!(text.ends_with("}\n"));
    assert!(text.contains("\n  \"kind\": \"Monitor\""));
  }

  #[test]
  #[serial]
  fn non_entity_payloads_pass_through_raw() {
    register_monitor();
    let raw = decode_json(r#"{"status": "ok", "count": 2}"#)
      .unwrap()
      .into_raw()
      .unwrap();
    assert_eq!(raw, json!({"status": "ok", "count": 2}));

    let list = decode_json(r#"[1, 2, 3]"#).unwrap().into_raw().unwrap();
    assert_eq!(list, json!([1, 2, 3]));

    // A non-string kind key does not make something an entity document.
    let odd = decode_json(r#"{"kind": 7}"#).unwrap();
    assert!(odd.as_entity().is_none());
  }

  #[test]
  #[serial]
  fn unregistered_kind_fails_loudly() {
    register_monitor();
    let err = decode_json(r#"{"kind": "Mystery", "name": "m"}"#).unwrap_err();
    assert!(matches!(
      err,
      CodecError::Decompile(DecompileError::UnknownKind { kind }) if kind == "Mystery"
    ));
  }

  // ===== Structured =====

  #[test]
  #[serial]
  fn structured_round_trip_rebuilds_the_instance() {
    register_monitor();
    let monitor = sample_monitor();
    let text = encode_structured(&monitor, &CompileEnv::new()).unwrap();
    assert!(text.contains("kind: Monitor"));

    let decoded = decode_structured(&text).unwrap().into_entity().unwrap();
    assert_eq!(decoded.name(), "api_health");
    assert_eq!(decoded.get("url"), monitor.get("url"));
    assert_eq!(decoded.effective("interval"), Some(Value::Int(30)));
  }

  #[test]
  #[serial]
  fn structured_non_entity_payloads_pass_through_raw() {
    register_monitor();
    let raw = decode_structured("status: ok\ncount: 2\n")
      .unwrap()
      .into_raw()
      .unwrap();
    assert_eq!(raw, json!({"status": "ok", "count": 2}));
  }
}
