//! Kind tags and wire constants shared across the blueprint model.

/// Kind tags registered by this crate.
pub mod kind {
  pub const BLUEPRINT: &str = "Blueprint";
  pub const SERVICE: &str = "Service";
  pub const PACKAGE: &str = "Package";
  pub const SUBSTRATE: &str = "Substrate";
  pub const DEPLOYMENT: &str = "Deployment";
  pub const POD_DEPLOYMENT: &str = "PodDeployment";
  pub const PROFILE: &str = "Profile";
  pub const VARIABLE: &str = "Variable";
  pub const CREDENTIAL: &str = "Credential";
  pub const ACTION: &str = "Action";
  pub const RUNBOOK: &str = "Runbook";
  pub const TASK: &str = "Task";
  pub const REF: &str = "Ref";
  pub const READINESS_PROBE: &str = "ReadinessProbe";
  pub const VM_SPEC: &str = "VmSpec";
  pub const VM_RESOURCES: &str = "VmResources";
}

/// Substrate provider types.
pub mod provider {
  pub const HYPERVISOR_NATIVE: &str = "hypervisor-native";
  pub const EXISTING_MACHINE: &str = "existing-machine";
  pub const AWS: &str = "aws";
  pub const AZURE: &str = "azure";
  pub const GCP: &str = "gcp";
  pub const VMWARE: &str = "vmware";
  pub const CONTAINER_POD: &str = "container-pod";
}

/// Operating system families recognized by readiness-probe defaulting.
pub mod os {
  pub const LINUX: &str = "Linux";
  pub const WINDOWS: &str = "Windows";
}

/// Variable value types. `SECRET` marks values stripped before upload.
pub mod variable {
  pub const LOCAL: &str = "LOCAL";
  pub const SECRET: &str = "SECRET";
}

/// Per-OS readiness-probe connection defaults, applied only to fields the
/// user left unset.
pub mod probe {
  pub const LINUX_CONNECTION: &str = "SSH";
  pub const LINUX_PORT: i64 = 22;
  pub const LINUX_PROTOCOL: &str = "";
  pub const REMOTE_EXEC_CONNECTION: &str = "POWERSHELL";
  pub const REMOTE_EXEC_PORT: i64 = 5985;
  pub const REMOTE_EXEC_PROTOCOL: &str = "http";
}

/// Default readiness-probe address expression per provider. These are
/// runtime macro expressions expanded by the orchestrator, not literals.
pub mod address {
  pub const HYPERVISOR_NATIVE: &str =
    "@@{platform.status.resources.nic_list[0].ip_endpoint_list[0].ip}@@";
  pub const EXISTING_MACHINE: &str = "@@{ip_address}@@";
  pub const AWS: &str = "@@{public_ip_address}@@";
  pub const AZURE: &str = "@@{platform.publicIPAddressList[0]}@@";
  pub const GCP: &str = "@@{platform.networkInterfaces[0].accessConfigs[0].natIP}@@";
  pub const VMWARE: &str = "@@{platform.ipAddressList[0]}@@";
}
