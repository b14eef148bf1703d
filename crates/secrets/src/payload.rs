//! Upload envelope assembly.
//!
//! The orchestration API takes a blueprint wrapped in a spec/metadata
//! envelope, not the bare resources document. Strip first, wrap second; the
//! envelope shape is wire contract.

use serde_json::{Value as Json, json};

use crate::Resources;

const API_VERSION: &str = "3.0";

/// Wrap a resources document in the blueprint upload envelope. When no
/// metadata is given, a minimal first-version metadata block is synthesized
/// from the name.
pub fn blueprint_payload(
  name: &str,
  description: &str,
  resources: Resources,
  metadata: Option<Json>,
) -> Json {
  let metadata = metadata.unwrap_or_else(|| {
    json!({
      "spec_version": 1,
      "name": name,
      "kind": "blueprint",
    })
  });
  json!({
    "spec": {
      "name": name,
      "description": description,
      "resources": resources,
    },
    "metadata": metadata,
    "api_version": API_VERSION,
  })
}
