//! Paths into a resources document.
//!
//! A [`DocPath`] records where a secret was stripped from so restore can put
//! it back at exactly that spot. Paths serialize as the plain key/index list
//! they are, so a persisted bundle stays readable.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;

use crate::Resources;

#[derive(Debug, Error)]
pub enum PathError {
  #[error("no value at '{path}' in document")]
  NotFound { path: String },

  #[error("value at '{path}' is not a mapping")]
  NotAnObject { path: String },
}

/// One step of a path: a mapping key or a list position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSeg {
  Index(usize),
  Key(String),
}

/// An ordered walk from the document root to one value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocPath {
  segments: Vec<PathSeg>,
}

impl DocPath {
  pub fn new() -> Self {
    DocPath::default()
  }

  pub fn key(mut self, key: impl Into<String>) -> Self {
    self.segments.push(PathSeg::Key(key.into()));
    self
  }

  pub fn index(mut self, index: usize) -> Self {
    self.segments.push(PathSeg::Index(index));
    self
  }

  pub fn segments(&self) -> &[PathSeg] {
    &self.segments
  }

  /// Walk the document to the value this path names.
  pub fn resolve_mut<'a>(&self, root: &'a mut Resources) -> Result<&'a mut Json, PathError> {
    let not_found = || PathError::NotFound {
      path: self.to_string(),
    };
    let (first, rest) = self.segments.split_first().ok_or_else(not_found)?;
    let mut current = match first {
      PathSeg::Key(key) => root.get_mut(key).ok_or_else(not_found)?,
      PathSeg::Index(_) => return Err(not_found()),
    };
    for segment in rest {
      current = match segment {
        PathSeg::Key(key) => current.get_mut(key.as_str()).ok_or_else(not_found)?,
        PathSeg::Index(index) => current.get_mut(*index).ok_or_else(not_found)?,
      };
    }
    Ok(current)
  }
}

impl fmt::Display for DocPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (position, segment) in self.segments.iter().enumerate() {
      match segment {
        PathSeg::Key(key) => {
          if position > 0 {
            write!(f, ".")?;
          }
          write!(f, "{key}")?;
        }
        PathSeg::Index(index) => write!(f, "[{index}]")?,
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn resources(parts: serde_json::Value) -> Resources {
    match parts {
      Json::Object(map) => map,
      other => panic!("not an object: {other:?}"),
    }
  }

  #[test]
  fn display_renders_keys_and_indexes() {
    let path = DocPath::new()
      .key("service_definition_list")
      .index(0)
      .key("variable_list")
      .index(2);
    assert_eq!(path.to_string(), "service_definition_list[0].variable_list[2]");
  }

  #[test]
  fn resolve_walks_nested_lists_and_maps() {
    let mut doc = resources(json!({
      "service_definition_list": [
        {"variable_list": [{"name": "a"}, {"name": "b"}]},
      ],
    }));
    let path = DocPath::new()
      .key("service_definition_list")
      .index(0)
      .key("variable_list")
      .index(1);
    let value = path.resolve_mut(&mut doc).unwrap();
    assert_eq!(value["name"], json!("b"));

    *value = json!({"name": "patched"});
    assert_eq!(
      doc["service_definition_list"][0]["variable_list"][1]["name"],
      json!("patched")
    );
  }

  #[test]
  fn resolve_names_the_missing_path() {
    let mut doc = resources(json!({"service_definition_list": []}));
    let path = DocPath::new().key("service_definition_list").index(3);
    let err = path.resolve_mut(&mut doc).unwrap_err();
    assert!(matches!(
      err,
      PathError::NotFound { path } if path == "service_definition_list[3]"
    ));
  }

  #[test]
  fn paths_serialize_as_plain_segment_lists() {
    let path = DocPath::new().key("app_profile_list").index(0).key("variable_list");
    let wire = serde_json::to_value(&path).unwrap();
    assert_eq!(wire, json!(["app_profile_list", 0, "variable_list"]));
    let back: DocPath = serde_json::from_value(wire).unwrap();
    assert_eq!(back, path);
  }
}
