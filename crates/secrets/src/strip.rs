//! Secret extraction from a compiled resources document.
//!
//! The walk covers every place the wire format carries an inline secret:
//! credential secrets, SECRET-typed variables on the definition objects and
//! inside action runbooks, basic-auth passwords and secret headers on HTTP
//! tasks, and guest-customization passwords on Windows vmware substrates.
//! Each stripped value is recorded with its exact path so
//! [`restore_secrets`](crate::restore::restore_secrets) can reinsert it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value as Json, json};
use tracing::debug;

use crate::Resources;
use crate::path::DocPath;

const SECRET_TYPE: &str = "SECRET";
const HTTP_TASK: &str = "HTTP";
const VMWARE_PROVIDER: &str = "vmware";
const WINDOWS_OS: &str = "Windows";

/// The definition lists whose objects may carry variables and actions.
const OBJECT_LISTS: [&str; 4] = [
  "service_definition_list",
  "package_definition_list",
  "substrate_definition_list",
  "app_profile_list",
];

/// Everything stripped out of one resources document. Restore consumes it;
/// it also serializes, for callers that park secrets between an upload and
/// the follow-up update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretBundle {
  /// Stripped variable values, keyed by the path of the object they came
  /// from.
  pub variables: Vec<(DocPath, Json)>,
  /// Credential secrets by credential name.
  pub credentials: BTreeMap<String, Json>,
}

impl SecretBundle {
  pub fn len(&self) -> usize {
    self.variables.len() + self.credentials.len()
  }

  pub fn is_empty(&self) -> bool {
    self.variables.is_empty() && self.credentials.is_empty()
  }
}

/// The placeholder left where a secret used to be. The explicit unmodified
/// marker keeps the server from minting a fresh secret for it.
fn placeholder_attrs() -> Json {
  json!({"is_secret_modified": false, "secret_reference": null})
}

/// Pull every inline secret out of a resources document, leaving
/// placeholders behind.
pub fn strip_secrets(resources: &mut Resources) -> SecretBundle {
  let mut bundle = SecretBundle::default();

  strip_credentials(resources, &mut bundle);

  for list_key in OBJECT_LISTS {
    let Some(Json::Array(objects)) = resources.get_mut(list_key) else {
      continue;
    };
    for (object_index, object) in objects.iter_mut().enumerate() {
      let Some(object) = object.as_object_mut() else {
        continue;
      };
      let base = DocPath::new().key(list_key).index(object_index);
      strip_variable_list(object, &base, "variable_list", &mut bundle);
      strip_action_list(object, &base, &mut bundle);
    }
  }

  strip_vmware_guest_passwords(resources, &mut bundle);

  debug!(
    variables = bundle.variables.len(),
    credentials = bundle.credentials.len(),
    "stripped secrets from resources document"
  );
  bundle
}

fn strip_credentials(resources: &mut Resources, bundle: &mut SecretBundle) {
  let Some(Json::Array(credentials)) = resources.get_mut("credential_definition_list") else {
    return;
  };
  for credential in credentials.iter_mut().filter_map(Json::as_object_mut) {
    let Some(name) = credential.get("name").and_then(Json::as_str).map(str::to_string) else {
      continue;
    };
    let secret = credential.remove("secret").unwrap_or_else(|| json!({}));
    bundle.credentials.insert(name, secret);
    credential.insert(
      "secret".to_string(),
      json!({"attrs": placeholder_attrs()}),
    );
  }
}

/// Strip SECRET-typed entries from a variable-shaped list (`variable_list`,
/// or `headers` on HTTP tasks).
fn strip_variable_list(
  object: &mut Resources,
  base: &DocPath,
  field_name: &str,
  bundle: &mut SecretBundle,
) {
  let Some(Json::Array(entries)) = object.get_mut(field_name) else {
    return;
  };
  for (entry_index, entry) in entries.iter_mut().enumerate() {
    let Some(entry) = entry.as_object_mut() else {
      continue;
    };
    if entry.get("type").and_then(Json::as_str) != Some(SECRET_TYPE) {
      continue;
    }
    let value = entry.remove("value").unwrap_or(Json::Null);
    entry.insert("attrs".to_string(), placeholder_attrs());
    bundle
      .variables
      .push((base.clone().key(field_name).index(entry_index), value));
  }
}

fn strip_action_list(object: &mut Resources, base: &DocPath, bundle: &mut SecretBundle) {
  let Some(Json::Array(actions)) = object.get_mut("action_list") else {
    return;
  };
  for (action_index, action) in actions.iter_mut().enumerate() {
    let Some(action) = action.as_object_mut() else {
      continue;
    };
    let Some(Json::Object(runbook)) = action.get_mut("runbook") else {
      continue;
    };
    let runbook_path = base.clone().key("action_list").index(action_index).key("runbook");
    strip_variable_list(runbook, &runbook_path, "variable_list", bundle);

    let Some(Json::Array(tasks)) = runbook.get_mut("task_definition_list") else {
      continue;
    };
    for (task_index, task) in tasks.iter_mut().enumerate() {
      let Some(task) = task.as_object_mut() else {
        continue;
      };
      if task.get("type").and_then(Json::as_str) != Some(HTTP_TASK) {
        continue;
      }
      let task_path = runbook_path.clone().key("task_definition_list").index(task_index);
      strip_http_task(task, &task_path, bundle);
    }
  }
}

/// HTTP tasks keep their basic-auth password and any secret headers inside
/// `attrs`.
fn strip_http_task(task: &mut Resources, task_path: &DocPath, bundle: &mut SecretBundle) {
  let Some(Json::Object(attrs)) = task.get_mut("attrs") else {
    return;
  };
  let basic = attrs
    .get("authentication")
    .and_then(|auth| auth.get("auth_type"))
    .and_then(Json::as_str)
    == Some("basic");
  if !basic {
    return;
  }

  if let Some(Json::Object(auth)) = attrs.get_mut("authentication") {
    if let Some(Json::Object(basic_auth)) = auth.get_mut("basic_auth") {
      if let Some(Json::Object(password)) = basic_auth.get_mut("password") {
        let value = password.remove("value").unwrap_or(Json::Null);
        bundle.variables.push((
          task_path
            .clone()
            .key("attrs")
            .key("authentication")
            .key("basic_auth")
            .key("password"),
          value,
        ));
        basic_auth.insert("password".to_string(), json!({"attrs": placeholder_attrs()}));
      }
    }
  }

  strip_variable_list(attrs, &task_path.clone().key("attrs"), "headers", bundle);
}

/// Windows vmware substrates carry admin and domain passwords inside the
/// guest customization block of `create_spec`.
fn strip_vmware_guest_passwords(resources: &mut Resources, bundle: &mut SecretBundle) {
  let Some(Json::Array(substrates)) = resources.get_mut("substrate_definition_list") else {
    return;
  };
  for (substrate_index, substrate) in substrates.iter_mut().enumerate() {
    let Some(substrate) = substrate.as_object_mut() else {
      continue;
    };
    let windows_vmware = substrate.get("type").and_then(Json::as_str) == Some(VMWARE_PROVIDER)
      && substrate.get("os_type").and_then(Json::as_str) == Some(WINDOWS_OS);
    if !windows_vmware {
      continue;
    }

    let base = DocPath::new()
      .key("substrate_definition_list")
      .index(substrate_index)
      .key("create_spec")
      .key("resources")
      .key("guest_customization")
      .key("windows_data");
    let Some(Json::Object(windows_data)) = substrate
      .get_mut("create_spec")
      .and_then(|spec| spec.get_mut("resources"))
      .and_then(|spec_resources| spec_resources.get_mut("guest_customization"))
      .and_then(|guest| guest.get_mut("windows_data"))
    else {
      continue;
    };

    strip_guest_password(windows_data, &base, "password", bundle);
    if windows_data.get("is_domain").and_then(Json::as_bool).unwrap_or(false) {
      strip_guest_password(windows_data, &base, "domain_password", bundle);
    }
  }
}

fn strip_guest_password(
  windows_data: &mut Resources,
  base: &DocPath,
  field: &str,
  bundle: &mut SecretBundle,
) {
  let Some(Json::Object(password)) = windows_data.get_mut(field) else {
    return;
  };
  let value = password.remove("value").unwrap_or_else(|| json!(""));
  password.insert("attrs".to_string(), placeholder_attrs());
  bundle.variables.push((base.clone().key(field), value));
}
