//! Builtin entity schemas.
//!
//! Field names here are the wire contract: they appear verbatim as keys in
//! compiled documents, so renaming one is a breaking change against the
//! orchestration API.

use serde_json::json;
use stencil_core::schema::{EntitySchema, FieldSpec, FieldType, SchemaSource};

use crate::consts::{kind, provider, variable};

fn entity(kind_tag: &str) -> FieldSpec {
  FieldSpec::single(FieldType::Entity(kind_tag.to_string()))
}

fn entity_list(kind_tag: &str) -> FieldSpec {
  FieldSpec::array(FieldType::Entity(kind_tag.to_string()))
}

fn variable_schema() -> EntitySchema {
  EntitySchema::new(kind::VARIABLE)
    .with_doc("a named value resolved at launch time")
    .field("type", FieldSpec::single(FieldType::Str))
    .field("value", FieldSpec::single(FieldType::Str))
    .field("label", FieldSpec::single(FieldType::Str))
    .field("is_editable", FieldSpec::single(FieldType::Bool))
    .field("attrs", FieldSpec::single(FieldType::Dict))
    .default_value("type", json!(variable::LOCAL))
    .default_value("value", json!(""))
    .default_value("label", json!(""))
    .default_value("is_editable", json!(false))
    .default_value("attrs", json!({}))
}

fn credential_schema() -> EntitySchema {
  EntitySchema::new(kind::CREDENTIAL)
    .field("type", FieldSpec::single(FieldType::Str))
    .field("username", FieldSpec::single(FieldType::Str))
    .field("secret", FieldSpec::single(FieldType::Dict))
    .field("default", FieldSpec::single(FieldType::Bool))
    .default_value("type", json!("PASSWORD"))
    .default_value("username", json!(""))
    .default_value("secret", json!({}))
    .default_value("default", json!(false))
}

fn ref_schema() -> EntitySchema {
  // The referenced entity's name rides in the document's own `name` key;
  // only the target's kind needs a field.
  EntitySchema::new(kind::REF).field("target_kind", FieldSpec::single(FieldType::Str))
}

fn task_schema() -> EntitySchema {
  EntitySchema::new(kind::TASK)
    .field("type", FieldSpec::single(FieldType::Str))
    .field("attrs", FieldSpec::single(FieldType::Dict))
    .default_value("type", json!(""))
    .default_value("attrs", json!({}))
}

fn runbook_schema() -> EntitySchema {
  EntitySchema::new(kind::RUNBOOK)
    .field("task_definition_list", entity_list(kind::TASK))
    .field("variable_list", entity_list(kind::VARIABLE))
    .default_value("task_definition_list", json!([]))
    .default_value("variable_list", json!([]))
}

fn action_schema() -> EntitySchema {
  EntitySchema::new(kind::ACTION)
    .field("type", FieldSpec::single(FieldType::Str))
    .field("runbook", entity(kind::RUNBOOK))
    .default_value("type", json!("user"))
}

fn readiness_probe_schema() -> EntitySchema {
  EntitySchema::new(kind::READINESS_PROBE)
    .with_doc("how to decide a provisioned machine is operational")
    .field("connection_type", FieldSpec::single(FieldType::Str))
    .field("connection_port", FieldSpec::single(FieldType::Int))
    .field("connection_protocol", FieldSpec::single(FieldType::Str))
    .field("address", FieldSpec::single(FieldType::Str))
    .field("retries", FieldSpec::single(FieldType::Str))
    .field("delay_secs", FieldSpec::single(FieldType::Str))
    .field("disabled", FieldSpec::single(FieldType::Bool))
    .field("editables_list", FieldSpec::array(FieldType::Str))
    .default_value("connection_type", json!(""))
    .default_value("connection_port", json!(0))
    .default_value("connection_protocol", json!(""))
    .default_value("address", json!(""))
    .default_value("retries", json!("5"))
    .default_value("delay_secs", json!("60"))
    .default_value("disabled", json!(false))
    .default_value("editables_list", json!([]))
}

fn vm_resources_schema() -> EntitySchema {
  EntitySchema::new(kind::VM_RESOURCES)
    .field("memory", FieldSpec::single(FieldType::Int))
    .field("vcpus", FieldSpec::single(FieldType::Int))
    .field("cores_per_vcpu", FieldSpec::single(FieldType::Int))
    .field("nic_list", FieldSpec::array(FieldType::Dict))
    .field("disk_list", FieldSpec::array(FieldType::Dict))
    .default_value("memory", json!(1))
    .default_value("vcpus", json!(1))
    .default_value("cores_per_vcpu", json!(1))
    .default_value("nic_list", json!([]))
    .default_value("disk_list", json!([]))
}

fn vm_spec_schema() -> EntitySchema {
  EntitySchema::new(kind::VM_SPEC)
    .field("resources", entity(kind::VM_RESOURCES))
    .field("categories", FieldSpec::single(FieldType::Dict))
    .default_value("categories", json!({}))
}

fn service_schema() -> EntitySchema {
  EntitySchema::new(kind::SERVICE)
    .field("variable_list", entity_list(kind::VARIABLE))
    .field("action_list", entity_list(kind::ACTION))
    .field("depends_on_list", entity_list(kind::REF))
    .default_value("variable_list", json!([]))
    .default_value("action_list", json!([]))
    .default_value("depends_on_list", json!([]))
}

fn package_schema() -> EntitySchema {
  EntitySchema::new(kind::PACKAGE)
    .field("version", FieldSpec::single(FieldType::Str))
    .field("variable_list", entity_list(kind::VARIABLE))
    .field("action_list", entity_list(kind::ACTION))
    .field("service_reference_list", entity_list(kind::REF))
    .default_value("version", json!(""))
    .default_value("variable_list", json!([]))
    .default_value("action_list", json!([]))
    .default_value("service_reference_list", json!([]))
}

fn substrate_schema() -> EntitySchema {
  EntitySchema::new(kind::SUBSTRATE)
    .with_doc("a provisionable machine slot backing deployments")
    .field("type", FieldSpec::single(FieldType::Str))
    .field("os_type", FieldSpec::single(FieldType::Str))
    // Typed VmSpec for the native hypervisor, free-form mapping otherwise.
    .field("provider_spec", FieldSpec::single(FieldType::Any))
    .field("create_spec", FieldSpec::single(FieldType::Dict))
    .field("readiness_probe", entity(kind::READINESS_PROBE))
    .field("editables", FieldSpec::single(FieldType::Dict))
    .field("variable_list", entity_list(kind::VARIABLE))
    .field("action_list", entity_list(kind::ACTION))
    .default_value("type", json!(provider::HYPERVISOR_NATIVE))
    .default_value("os_type", json!(crate::consts::os::LINUX))
    .default_value("create_spec", json!({}))
    .default_value("editables", json!({}))
    .default_value("variable_list", json!([]))
    .default_value("action_list", json!([]))
}

fn deployment_schema() -> EntitySchema {
  EntitySchema::new(kind::DEPLOYMENT)
    .field("substrate_reference", entity(kind::REF))
    .field("package_reference_list", entity_list(kind::REF))
    .field("min_replicas", FieldSpec::single(FieldType::Int))
    .field("max_replicas", FieldSpec::single(FieldType::Int))
    .field("depends_on_list", entity_list(kind::REF))
    .default_value("package_reference_list", json!([]))
    .default_value("min_replicas", json!(1))
    .default_value("max_replicas", json!(1))
    .default_value("depends_on_list", json!([]))
}

fn pod_deployment_schema() -> EntitySchema {
  // Composes over Deployment: inherits references and replica bounds, adds
  // the pod-shaped specs.
  EntitySchema::new(kind::POD_DEPLOYMENT)
    .with_parent(kind::DEPLOYMENT)
    .field("container_reference_list", entity_list(kind::REF))
    .field("deployment_spec", FieldSpec::single(FieldType::Dict))
    .field("service_spec", FieldSpec::single(FieldType::Dict))
    .default_value("container_reference_list", json!([]))
    .default_value("deployment_spec", json!({}))
    .default_value("service_spec", json!({}))
}

fn profile_schema() -> EntitySchema {
  EntitySchema::new(kind::PROFILE)
    .field("deployment_create_list", entity_list(kind::DEPLOYMENT))
    .field("variable_list", entity_list(kind::VARIABLE))
    .field("action_list", entity_list(kind::ACTION))
    .default_value("deployment_create_list", json!([]))
    .default_value("variable_list", json!([]))
    .default_value("action_list", json!([]))
}

fn blueprint_schema() -> EntitySchema {
  EntitySchema::new(kind::BLUEPRINT)
    .with_doc("the full application blueprint uploaded to the orchestrator")
    .field("service_definition_list", entity_list(kind::SERVICE))
    .field("package_definition_list", entity_list(kind::PACKAGE))
    .field("substrate_definition_list", entity_list(kind::SUBSTRATE))
    .field("app_profile_list", entity_list(kind::PROFILE))
    .field("credential_definition_list", entity_list(kind::CREDENTIAL))
    .default_value("service_definition_list", json!([]))
    .default_value("package_definition_list", json!([]))
    .default_value("substrate_definition_list", json!([]))
    .default_value("app_profile_list", json!([]))
    .default_value("credential_definition_list", json!([]))
}

/// Registration order: parents come before the kinds composed over them.
pub fn builtin_kinds() -> &'static [&'static str] {
  &[
    kind::VARIABLE,
    kind::CREDENTIAL,
    kind::REF,
    kind::TASK,
    kind::RUNBOOK,
    kind::ACTION,
    kind::READINESS_PROBE,
    kind::VM_RESOURCES,
    kind::VM_SPEC,
    kind::SERVICE,
    kind::PACKAGE,
    kind::SUBSTRATE,
    kind::DEPLOYMENT,
    kind::POD_DEPLOYMENT,
    kind::PROFILE,
    kind::BLUEPRINT,
  ]
}

/// The builtin schema source consumed at registration time.
pub struct BuiltinSchemas;

impl SchemaSource for BuiltinSchemas {
  fn get_schema(&self, kind_tag: &str) -> Option<EntitySchema> {
    match kind_tag {
      kind::VARIABLE => Some(variable_schema()),
      kind::CREDENTIAL => Some(credential_schema()),
      kind::REF => Some(ref_schema()),
      kind::TASK => Some(task_schema()),
      kind::RUNBOOK => Some(runbook_schema()),
      kind::ACTION => Some(action_schema()),
      kind::READINESS_PROBE => Some(readiness_probe_schema()),
      kind::VM_RESOURCES => Some(vm_resources_schema()),
      kind::VM_SPEC => Some(vm_spec_schema()),
      kind::SERVICE => Some(service_schema()),
      kind::PACKAGE => Some(package_schema()),
      kind::SUBSTRATE => Some(substrate_schema()),
      kind::DEPLOYMENT => Some(deployment_schema()),
      kind::POD_DEPLOYMENT => Some(pod_deployment_schema()),
      kind::PROFILE => Some(profile_schema()),
      kind::BLUEPRINT => Some(blueprint_schema()),
      _ => None,
    }
  }
}
