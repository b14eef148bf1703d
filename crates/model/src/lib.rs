//! stencil-model: the builtin blueprint domain.
//!
//! This crate supplies the entity kinds a blueprint is made of:
//! - `consts`: kind tags, provider tags and other wire constants
//! - `schemas`: the builtin schema set and its registration order
//! - `substrate`: wire-shape hooks for the substrate kind
//! - `builders`: convenience constructors for common declarations

use std::sync::{Arc, OnceLock};

use stencil_core::catalog::{self, GenericHooks};
use stencil_core::schema::SchemaError;

pub mod builders;
pub mod consts;
pub mod schemas;
pub mod substrate;

use schemas::BuiltinSchemas;
use substrate::SubstrateHooks;

static REGISTERED: OnceLock<()> = OnceLock::new();

/// Register every builtin kind with the type catalog. Idempotent, so callers
/// and tests invoke it freely; a process that wants to override a builtin
/// registers its replacement afterwards.
pub fn init() -> Result<(), SchemaError> {
  if REGISTERED.get().is_some() {
    return Ok(());
  }
  let source = BuiltinSchemas;
  for kind_tag in schemas::builtin_kinds() {
    if *kind_tag == consts::kind::SUBSTRATE {
      catalog::register_from(&source, kind_tag, Arc::new(SubstrateHooks))?;
    } else {
      catalog::register_from(&source, kind_tag, Arc::new(GenericHooks))?;
    }
  }
  let _ = REGISTERED.set(());
  Ok(())
}
