//! Substrate wire-shape hooks.
//!
//! The substrate is the one builtin kind whose canonical document diverges
//! from its authored shape: readiness probe synthesis and provider-specific
//! defaults happen at compile time, and launch-editable markers hoist from
//! their authoring positions to a root `editables` key. Decompilation
//! inverts the hoist so a rebuilt substrate recompiles to the same document.

use std::collections::BTreeMap;

use serde_json::{Value as Json, json};
use tracing::{error, warn};

use stencil_core::catalog::{self, TypeHooks};
use stencil_core::compile::{CompileEnv, CompileError};
use stencil_core::decompile::{DecompileCtx, DecompileError, decompile_as};
use stencil_core::entity::Entity;
use stencil_core::value::{Document, Value};

use crate::consts::{address, kind, os, probe, provider};

/// Wire-shape adjustments for the `Substrate` kind.
pub struct SubstrateHooks;

/// Unset in the falsy sense: a missing key, or a value with no content.
fn is_unset(value: Option<&Json>) -> bool {
  match value {
    None | Some(Json::Null) => true,
    Some(Json::Bool(b)) => !*b,
    Some(Json::Number(n)) => n.as_f64().is_some_and(|f| f == 0.0),
    Some(Json::String(s)) => s.is_empty(),
    Some(Json::Array(items)) => items.is_empty(),
    Some(Json::Object(map)) => map.is_empty(),
  }
}

fn fill(map: &mut Document, field: &str, value: Json) {
  if is_unset(map.get(field)) {
    map.insert(field.to_string(), value);
  }
}

/// A probe synthesized from the `ReadinessProbe` schema defaults. Carries no
/// bookkeeping keys; the substrate owns it wholesale.
fn default_probe() -> Result<Document, CompileError> {
  let entry = catalog::lookup(kind::READINESS_PROBE).ok_or_else(|| CompileError::UnknownKind {
    kind: kind::READINESS_PROBE.to_string(),
  })?;
  let mut synthesized = Document::new();
  for (field, value) in &entry.schema.defaults {
    synthesized.insert(field.clone(), value.clone());
  }
  Ok(synthesized)
}

impl TypeHooks for SubstrateHooks {
  fn post_compile(&self, doc: &mut Document, env: &CompileEnv<'_>) -> Result<(), CompileError> {
    let name = doc
      .get("name")
      .and_then(Json::as_str)
      .unwrap_or_default()
      .to_string();
    let os_type = doc
      .get("os_type")
      .and_then(Json::as_str)
      .unwrap_or(os::LINUX)
      .to_string();
    let provider_type = doc
      .get("type")
      .and_then(Json::as_str)
      .unwrap_or(provider::HYPERVISOR_NATIVE)
      .to_string();

    let mut probe_doc = match doc.get("readiness_probe") {
      Some(Json::Object(obj)) if !obj.is_empty() => obj.clone(),
      _ => default_probe()?,
    };

    if os_type == os::LINUX {
      fill(&mut probe_doc, "connection_type", json!(probe::LINUX_CONNECTION));
      fill(&mut probe_doc, "connection_port", json!(probe::LINUX_PORT));
      fill(&mut probe_doc, "connection_protocol", json!(probe::LINUX_PROTOCOL));
    } else {
      fill(&mut probe_doc, "connection_type", json!(probe::REMOTE_EXEC_CONNECTION));
      fill(&mut probe_doc, "connection_port", json!(probe::REMOTE_EXEC_PORT));
      fill(&mut probe_doc, "connection_protocol", json!(probe::REMOTE_EXEC_PROTOCOL));
    }

    match provider_type.as_str() {
      provider::HYPERVISOR_NATIVE => {
        fill(&mut probe_doc, "address", json!(address::HYPERVISOR_NATIVE));
        // Orchestrator UIs expect at least an empty nic list here.
        if is_unset(doc.get("create_spec")) {
          doc.insert(
            "create_spec".to_string(),
            json!({"resources": {"nic_list": []}}),
          );
        }
      }
      provider::EXISTING_MACHINE => {
        fill(&mut probe_doc, "address", json!(address::EXISTING_MACHINE));
      }
      provider::AWS | provider::AZURE | provider::GCP | provider::VMWARE => {
        let probe_address = match provider_type.as_str() {
          provider::AWS => address::AWS,
          provider::AZURE => address::AZURE,
          provider::GCP => address::GCP,
          _ => address::VMWARE,
        };
        fill(&mut probe_doc, "address", json!(probe_address));
        if is_unset(doc.get("create_spec")) {
          let account = env.require_account(&provider_type)?;
          let mut spec = json!({"resources": {"account_uuid": account}});
          if provider_type == provider::VMWARE {
            spec["template"] = json!("");
          }
          doc.insert("create_spec".to_string(), spec);
        }
      }
      provider::CONTAINER_POD => {
        // Pods have no reachable machine address and no machine editables.
        probe_doc.insert("address".to_string(), json!(""));
        doc.remove("editables");
        warn!(
          substrate = %name,
          "container-pod substrates are untested against current orchestrators"
        );
      }
      other => {
        error!(substrate = %name, provider = other, "unrecognized provider type");
        return Err(CompileError::UnknownProvider {
          name,
          provider: other.to_string(),
        });
      }
    }

    // Hoist launch-editable markers to the document root.
    let mut editables = Document::new();
    if let Some(Json::Object(authored)) = doc.remove("editables") {
      if !authored.is_empty() {
        editables.insert("create_spec".to_string(), Json::Object(authored));
      }
    }
    if let Some(Json::Array(names)) = probe_doc.remove("editables_list") {
      let mut marks = Document::new();
      for field in names.iter().filter_map(Json::as_str) {
        marks.insert(field.to_string(), Json::Bool(true));
      }
      if !marks.is_empty() {
        editables.insert("readiness_probe".to_string(), Json::Object(marks));
      }
    }
    doc.insert("readiness_probe".to_string(), Json::Object(probe_doc));
    doc.insert("editables".to_string(), Json::Object(editables));
    Ok(())
  }

  fn pre_decompile(
    &self,
    doc: &mut Document,
    _ctx: &mut DecompileCtx,
  ) -> Result<(), DecompileError> {
    if doc.get("type").and_then(Json::as_str) == Some(provider::CONTAINER_POD) {
      return Err(DecompileError::Unsupported {
        detail: "container-pod substrates have no authoring form".to_string(),
      });
    }
    Ok(())
  }

  fn post_decompile(
    &self,
    entity: &mut Entity,
    ctx: &mut DecompileCtx,
  ) -> Result<(), DecompileError> {
    unhoist_editables(entity)?;
    attach_vm_spec(entity, ctx)?;
    Ok(())
  }
}

/// Invert the compile-time hoist: the root `editables` mapping goes back to
/// the positions it was authored in.
fn unhoist_editables(entity: &mut Entity) -> Result<(), DecompileError> {
  let hoisted = match entity.get("editables") {
    Some(Value::Map(map)) => map.clone(),
    _ => return Ok(()),
  };

  match hoisted.get("create_spec") {
    Some(authored @ Value::Map(_)) => entity.set_attr("editables", authored.clone())?,
    _ => entity.set_attr("editables", BTreeMap::new())?,
  }

  if let Some(Value::Map(marks)) = hoisted.get("readiness_probe") {
    let names: Vec<Value> = marks
      .iter()
      .filter(|(_, marked)| matches!(marked, Value::Bool(true)))
      .map(|(field, _)| Value::from(field.as_str()))
      .collect();
    let probe_entity = match entity.get("readiness_probe") {
      Some(Value::Entity(existing)) => Some((**existing).clone()),
      _ => None,
    };
    if let Some(mut probe_entity) = probe_entity {
      probe_entity.set_attr("editables_list", Value::List(names))?;
      entity.set_attr("readiness_probe", probe_entity)?;
    }
  }
  Ok(())
}

/// Reattach the native hypervisor's machine spec as a typed instance. Other
/// providers keep `provider_spec` as the free-form mapping it compiled from.
fn attach_vm_spec(entity: &mut Entity, ctx: &mut DecompileCtx) -> Result<(), DecompileError> {
  let native = matches!(
    entity.effective("type"),
    Some(Value::Str(p)) if p == provider::HYPERVISOR_NATIVE
  );
  if !native {
    return Ok(());
  }
  let plain = match entity.get("provider_spec") {
    Some(spec @ Value::Map(_)) => spec.to_plain_json(),
    _ => None,
  };
  let Some(Json::Object(spec_doc)) = plain else {
    return Ok(());
  };
  let mut child = ctx.child(kind::SUBSTRATE, entity.name());
  let spec = decompile_as(kind::VM_SPEC, &spec_doc, &mut child)?;
  entity.set_attr("provider_spec", spec)?;
  Ok(())
}
