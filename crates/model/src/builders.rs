//! Convenience constructors for common declaration shapes.
//!
//! Thin wrappers over [`Entity::declare`] for the handful of kinds that are
//! declared constantly and almost always the same way. Anything these do not
//! cover is declared through the builder directly.

use serde_json::json;
use stencil_core::entity::Entity;
use stencil_core::schema::SchemaError;
use stencil_core::value::Value;

use crate::consts::kind;

pub mod variable {
  use super::*;

  /// A local variable with an inline value.
  pub fn simple(name: &str, value: &str) -> Result<Entity, SchemaError> {
    Ok(
      Entity::declare(kind::VARIABLE, name)?
        .set("value", value)?
        .build(),
    )
  }

  /// A local variable the operator may override at launch.
  pub fn editable(name: &str, value: &str) -> Result<Entity, SchemaError> {
    Ok(
      Entity::declare(kind::VARIABLE, name)?
        .set("value", value)?
        .set("is_editable", true)?
        .build(),
    )
  }

  /// A secret variable. The value rides in the instance until transport
  /// strips it.
  pub fn secret(name: &str, value: &str) -> Result<Entity, SchemaError> {
    Ok(
      Entity::declare(kind::VARIABLE, name)?
        .set("type", crate::consts::variable::SECRET)?
        .set("value", value)?
        .build(),
    )
  }
}

pub mod credential {
  use super::*;

  /// A username/password credential.
  pub fn basic(name: &str, username: &str, password: &str) -> Result<Entity, SchemaError> {
    let secret = Value::from_json(&json!({
      "attrs": {"is_secret_modified": false},
      "value": password,
    }));
    Ok(
      Entity::declare(kind::CREDENTIAL, name)?
        .set("username", username)?
        .set("secret", secret)?
        .build(),
    )
  }
}

pub mod task {
  use super::*;

  /// A shell exec task.
  pub fn exec_ssh(name: &str, script: &str) -> Result<Entity, SchemaError> {
    let attrs = Value::from_json(&json!({
      "script_type": "sh",
      "script": script,
    }));
    Ok(
      Entity::declare(kind::TASK, name)?
        .set("type", "EXEC")?
        .set("attrs", attrs)?
        .build(),
    )
  }
}

pub mod action {
  use super::*;

  /// A user action whose runbook runs the given tasks in order.
  pub fn user(name: &str, tasks: Vec<Entity>) -> Result<Entity, SchemaError> {
    let runbook = Entity::declare(kind::RUNBOOK, &format!("{name}_runbook"))?
      .set("task_definition_list", tasks)?
      .build();
    Ok(
      Entity::declare(kind::ACTION, name)?
        .set("runbook", runbook)?
        .build(),
    )
  }
}

pub mod vm {
  use super::*;

  /// Machine resources with the given sizing. Nics, disks and core layout
  /// stay on their schema defaults.
  pub fn resources(name: &str, memory: i64, vcpus: i64) -> Result<Entity, SchemaError> {
    Ok(
      Entity::declare(kind::VM_RESOURCES, name)?
        .set("memory", memory)?
        .set("vcpus", vcpus)?
        .build(),
    )
  }

  /// A machine spec wrapping the given resources.
  pub fn spec(name: &str, resources: Entity) -> Result<Entity, SchemaError> {
    Ok(
      Entity::declare(kind::VM_SPEC, name)?
        .set("resources", resources)?
        .build(),
    )
  }
}

/// A readiness probe on the given port. Connection type and address fill in
/// from the substrate's OS and provider at compile time.
pub fn readiness_probe(name: &str, port: i64) -> Result<Entity, SchemaError> {
  Ok(
    Entity::declare(kind::READINESS_PROBE, name)?
      .set("connection_port", port)?
      .build(),
  )
}

/// A reference to an already-declared entity.
pub fn ref_to(target: &Entity) -> Result<Entity, SchemaError> {
  named_ref(target.kind(), target.name())
}

/// A reference by kind and name, for targets declared elsewhere.
pub fn named_ref(target_kind: &str, name: &str) -> Result<Entity, SchemaError> {
  Ok(
    Entity::declare(kind::REF, name)?
      .set("target_kind", target_kind)?
      .build(),
  )
}
