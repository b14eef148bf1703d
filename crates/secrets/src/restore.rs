//! Secret reinsertion into a server-returned resources document.
//!
//! The inverse of [`strip_secrets`](crate::strip::strip_secrets). Every value
//! the strip recorded goes back at its recorded path, marked
//! `is_secret_modified: true` so the follow-up update call actually writes
//! it. The bundle is consumed, and a path or credential present in one phase
//! but not the other fails loudly; a secret silently dropped here would leave
//! the uploaded blueprint with a dead placeholder.

use serde_json::{Value as Json, json};
use thiserror::Error;
use tracing::debug;

use crate::Resources;
use crate::path::PathError;
use crate::strip::SecretBundle;

#[derive(Debug, Error)]
pub enum SecretError {
  #[error(transparent)]
  Path(#[from] PathError),

  #[error("credential '{name}' is missing from the returned document")]
  MissingCredential { name: String },
}

/// Reinsert every stripped secret at its recorded position.
pub fn restore_secrets(resources: &mut Resources, bundle: SecretBundle) -> Result<(), SecretError> {
  let restored = bundle.len();

  for (path, value) in bundle.variables {
    let target = path.resolve_mut(resources)?;
    let object = target.as_object_mut().ok_or_else(|| PathError::NotAnObject {
      path: path.to_string(),
    })?;
    object.insert("attrs".to_string(), json!({"is_secret_modified": true}));
    object.insert("value".to_string(), value);
  }

  restore_credentials(resources, bundle.credentials)?;

  debug!(restored, "restored secrets into resources document");
  Ok(())
}

fn restore_credentials(
  resources: &mut Resources,
  parked: std::collections::BTreeMap<String, Json>,
) -> Result<(), SecretError> {
  if parked.is_empty() {
    return Ok(());
  }
  let Some(Json::Array(credentials)) = resources.get_mut("credential_definition_list") else {
    let name = parked.into_keys().next().unwrap_or_default();
    return Err(SecretError::MissingCredential { name });
  };
  for (name, secret) in parked {
    let slot = credentials
      .iter_mut()
      .filter_map(Json::as_object_mut)
      .find(|credential| credential.get("name").and_then(Json::as_str) == Some(name.as_str()));
    match slot {
      Some(credential) => {
        credential.insert("secret".to_string(), secret);
      }
      None => return Err(SecretError::MissingCredential { name }),
    }
  }
  Ok(())
}
