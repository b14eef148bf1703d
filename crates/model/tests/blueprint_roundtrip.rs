//! Full-blueprint fidelity tests: a realistic two-tier application is built
//! through the declaration API, compiled, pulled back through decompile, and
//! recompiled without drift.

use serde_json::json;
use stencil_core::codec::{decode_json, encode_json};
use stencil_core::compile::{CompileEnv, compile};
use stencil_core::decompile::decompile;
use stencil_core::entity::Entity;
use stencil_core::value::Value;
use stencil_model::builders::{action, credential, ref_to, task, variable};
use stencil_model::consts::{address, kind};
use stencil_model::init;

fn native_substrate(name: &str, memory: i64) -> Entity {
  let resources = Entity::declare(kind::VM_RESOURCES, &format!("{name}_resources"))
    .unwrap()
    .set("memory", memory)
    .unwrap()
    .set("vcpus", 2)
    .unwrap()
    .build();
  let vm_spec = Entity::declare(kind::VM_SPEC, &format!("{name}_spec"))
    .unwrap()
    .set("resources", resources)
    .unwrap()
    .build();
  let probe = Entity::declare(kind::READINESS_PROBE, &format!("{name}_probe"))
    .unwrap()
    .set("connection_port", 22)
    .unwrap()
    .set("delay_secs", "0")
    .unwrap()
    .build();
  Entity::declare(kind::SUBSTRATE, name)
    .unwrap()
    .set("provider_spec", vm_spec)
    .unwrap()
    .set("readiness_probe", probe)
    .unwrap()
    .build()
}

/// A single-node mysql service fronted by php, two native substrates, one
/// profile. The shape a real deployment repo would declare.
fn mysql_blueprint() -> Entity {
  init().unwrap();

  let root_cred = credential::basic("root_cred", "root", "passwd123").unwrap();

  let mysql_service = Entity::declare(kind::SERVICE, "mysql_service")
    .unwrap()
    .describe("single node mysql")
    .set("variable_list", vec![variable::simple("ENV", "DEV").unwrap()])
    .unwrap()
    .set(
      "action_list",
      vec![
        action::user(
          "create",
          vec![task::exec_ssh("Task1", "echo 'create in ENV=@@{ENV}@@'").unwrap()],
        )
        .unwrap(),
      ],
    )
    .unwrap()
    .build();

  let php_service = Entity::declare(kind::SERVICE, "php_service")
    .unwrap()
    .set("depends_on_list", vec![ref_to(&mysql_service).unwrap()])
    .unwrap()
    .build();

  let mysql_package = Entity::declare(kind::PACKAGE, "mysql_package")
    .unwrap()
    .set("variable_list", vec![variable::simple("foo", "bar").unwrap()])
    .unwrap()
    .set(
      "action_list",
      vec![
        action::user(
          "install",
          vec![task::exec_ssh("Task1", "echo @@{foo}@@").unwrap()],
        )
        .unwrap(),
      ],
    )
    .unwrap()
    .set("service_reference_list", vec![ref_to(&mysql_service).unwrap()])
    .unwrap()
    .build();

  let php_package = Entity::declare(kind::PACKAGE, "php_package")
    .unwrap()
    .set("variable_list", vec![variable::simple("foo", "baz").unwrap()])
    .unwrap()
    .set("service_reference_list", vec![ref_to(&php_service).unwrap()])
    .unwrap()
    .build();

  let mysql_substrate = native_substrate("mysql_vm", 4);
  let php_substrate = native_substrate("php_vm", 2);

  let mysql_deployment = Entity::declare(kind::DEPLOYMENT, "mysql_deployment")
    .unwrap()
    .set("substrate_reference", ref_to(&mysql_substrate).unwrap())
    .unwrap()
    .set("package_reference_list", vec![ref_to(&mysql_package).unwrap()])
    .unwrap()
    .build();

  let php_deployment = Entity::declare(kind::DEPLOYMENT, "php_deployment")
    .unwrap()
    .set("substrate_reference", ref_to(&php_substrate).unwrap())
    .unwrap()
    .set("package_reference_list", vec![ref_to(&php_package).unwrap()])
    .unwrap()
    .set("depends_on_list", vec![ref_to(&mysql_deployment).unwrap()])
    .unwrap()
    .build();

  let profile = Entity::declare(kind::PROFILE, "default_profile")
    .unwrap()
    .set("deployment_create_list", vec![mysql_deployment, php_deployment])
    .unwrap()
    .set(
      "variable_list",
      vec![
        variable::simple("nameserver", "10.40.64.15").unwrap(),
        variable::editable("foo1", "bar1").unwrap(),
      ],
    )
    .unwrap()
    .build();

  Entity::declare(kind::BLUEPRINT, "mysql_blueprint")
    .unwrap()
    .describe("single node mysql with a php frontend")
    .set("credential_definition_list", vec![root_cred])
    .unwrap()
    .set("service_definition_list", vec![mysql_service, php_service])
    .unwrap()
    .set("package_definition_list", vec![mysql_package, php_package])
    .unwrap()
    .set("substrate_definition_list", vec![mysql_substrate, php_substrate])
    .unwrap()
    .set("app_profile_list", vec![profile])
    .unwrap()
    .build()
}

#[test]
fn blueprint_compiles_with_the_expected_shape() {
  let doc = compile(&mysql_blueprint(), &CompileEnv::new()).unwrap();

  assert_eq!(doc["kind"], json!("Blueprint"));
  assert_eq!(doc["name"], json!("mysql_blueprint"));

  let services = doc["service_definition_list"].as_array().unwrap();
  assert_eq!(services.len(), 2);
  assert_eq!(services[0]["kind"], json!("Service"));
  assert_eq!(services[0]["variable_list"][0]["value"], json!("DEV"));
  assert_eq!(services[0]["variable_list"][0]["type"], json!("LOCAL"));
  let runbook = &services[0]["action_list"][0]["runbook"];
  assert_eq!(runbook["kind"], json!("Runbook"));
  assert_eq!(
    runbook["task_definition_list"][0]["attrs"]["script"],
    json!("echo 'create in ENV=@@{ENV}@@'")
  );

  // Dependency references carry kind and name of their target.
  assert_eq!(services[1]["depends_on_list"][0]["kind"], json!("Ref"));
  assert_eq!(services[1]["depends_on_list"][0]["name"], json!("mysql_service"));

  let substrates = doc["substrate_definition_list"].as_array().unwrap();
  let probe = &substrates[0]["readiness_probe"];
  assert_eq!(probe["connection_type"], json!("SSH"));
  assert_eq!(probe["connection_port"], json!(22));
  assert_eq!(probe["address"], json!(address::HYPERVISOR_NATIVE));
  assert_eq!(
    substrates[0]["create_spec"],
    json!({"resources": {"nic_list": []}})
  );
  assert_eq!(
    substrates[0]["provider_spec"]["resources"]["memory"],
    json!(4)
  );

  let profile = &doc["app_profile_list"][0];
  let deployment = &profile["deployment_create_list"][0];
  assert_eq!(deployment["substrate_reference"]["name"], json!("mysql_vm"));
  assert_eq!(deployment["min_replicas"], json!(1));

  let cred = &doc["credential_definition_list"][0];
  assert_eq!(cred["secret"]["value"], json!("passwd123"));
}

#[test]
fn compiled_blueprints_survive_decompile_and_recompile() {
  let blueprint = mysql_blueprint();
  let doc = compile(&blueprint, &CompileEnv::new()).unwrap();

  let rebuilt = decompile(&doc).unwrap();
  assert_eq!(rebuilt.kind(), kind::BLUEPRINT);
  assert_eq!(rebuilt.name(), "mysql_blueprint");

  let services = rebuilt.get("service_definition_list").unwrap().as_list().unwrap();
  assert_eq!(services[0].as_entity().unwrap().name(), "mysql_service");
  assert_eq!(services[1].as_entity().unwrap().name(), "php_service");

  // Substrate machine specs come back typed through the hook.
  let substrates = rebuilt
    .get("substrate_definition_list")
    .unwrap()
    .as_list()
    .unwrap();
  let vm_spec = substrates[0]
    .as_entity()
    .unwrap()
    .get("provider_spec")
    .unwrap()
    .as_entity()
    .unwrap();
  assert_eq!(vm_spec.kind(), kind::VM_SPEC);
  assert_eq!(vm_spec.name(), "mysql_vm_spec");
  let resources = vm_spec.get("resources").unwrap().as_entity().unwrap();
  assert_eq!(resources.get("memory"), Some(&Value::Int(4)));

  // No drift across the full cycle.
  assert_eq!(compile(&rebuilt, &CompileEnv::new()).unwrap(), doc);
}

#[test]
fn blueprint_documents_reencode_byte_identically() {
  let blueprint = mysql_blueprint();
  let text = encode_json(&blueprint, &CompileEnv::new(), true).unwrap();

  let decoded = decode_json(&text).unwrap().into_entity().unwrap();
  let again = encode_json(&decoded, &CompileEnv::new(), true).unwrap();
  assert_eq!(text, again);
}

#[test]
fn pod_deployments_dispatch_polymorphically_inside_profiles() {
  init().unwrap();
  let pod = Entity::declare(kind::POD_DEPLOYMENT, "web_pod")
    .unwrap()
    .set("min_replicas", 3)
    .unwrap()
    .set("max_replicas", 5)
    .unwrap()
    .build();
  // A PodDeployment is admitted wherever a Deployment is expected.
  let profile = Entity::declare(kind::PROFILE, "pod_profile")
    .unwrap()
    .set("deployment_create_list", vec![pod])
    .unwrap()
    .build();

  let doc = compile(&profile, &CompileEnv::new()).unwrap();
  let entry = &doc["deployment_create_list"][0];
  assert_eq!(entry["kind"], json!("PodDeployment"));
  assert_eq!(entry["deployment_spec"], json!({}));

  let rebuilt = decompile(&doc).unwrap();
  let deployments = rebuilt
    .get("deployment_create_list")
    .unwrap()
    .as_list()
    .unwrap();
  let pod = deployments[0].as_entity().unwrap();
  assert_eq!(pod.kind(), kind::POD_DEPLOYMENT);
  assert!(pod.is_a(kind::DEPLOYMENT));
  assert_eq!(pod.get("min_replicas"), Some(&Value::Int(3)));

  assert_eq!(compile(&rebuilt, &CompileEnv::new()).unwrap(), doc);
}
