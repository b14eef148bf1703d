//! Canonical compilation: entity instance to canonical document.
//!
//! Compilation is pure with respect to the source instance. It merges the
//! schema defaults under the user-set fields, lowers each value to JSON
//! (nested entities compile recursively through their own kinds), injects
//! the `name`/`description`/`kind` bookkeeping keys, then hands the
//! assembled document to the kind's `post_compile` hook.

use serde_json::{Number, Value as Json};
use thiserror::Error;
use tracing::{debug, error};

use crate::catalog;
use crate::entity::Entity;
use crate::value::{Document, Value};

#[derive(Debug, Error)]
pub enum CompileError {
  #[error("kind '{kind}' is not registered in the type catalog")]
  UnknownKind { kind: String },

  #[error("unrecognized provider type '{provider}' on substrate '{name}'")]
  UnknownProvider { name: String, provider: String },

  #[error("external lookup failed: {resource} not found")]
  ExternalLookupFailure { resource: String },

  #[error("malformed document for kind '{kind}': {detail}")]
  Malformed { kind: String, detail: String },
}

/// Project/account cache seen by compile hooks. Read-only from the
/// compiler's perspective; population and refresh belong to the caller.
pub trait AccountResolver {
  fn lookup_account(&self, project: &str, provider_type: &str) -> Option<String>;
}

/// External context for a compile run. Everything is optional; hooks that
/// need a piece fail with `ExternalLookupFailure` naming what was missing.
#[derive(Clone, Copy, Default)]
pub struct CompileEnv<'a> {
  pub project: Option<&'a str>,
  pub accounts: Option<&'a dyn AccountResolver>,
}

impl<'a> CompileEnv<'a> {
  pub fn new() -> Self {
    CompileEnv::default()
  }

  pub fn with_project(mut self, project: &'a str) -> Self {
    self.project = Some(project);
    self
  }

  pub fn with_accounts(mut self, accounts: &'a dyn AccountResolver) -> Self {
    self.accounts = Some(accounts);
    self
  }

  /// The configured project's account id for a provider type. Fails with
  /// the specific missing piece named so the operator can fix their setup.
  pub fn require_account(&self, provider_type: &str) -> Result<String, CompileError> {
    let project = match self.project {
      Some(p) => p,
      None => {
        error!(provider = provider_type, "no project configured for account lookup");
        return Err(CompileError::ExternalLookupFailure {
          resource: format!("project name for '{provider_type}' account lookup"),
        });
      }
    };
    let accounts = match self.accounts {
      Some(a) => a,
      None => {
        error!(project, provider = provider_type, "no account cache configured");
        return Err(CompileError::ExternalLookupFailure {
          resource: format!("account cache for project '{project}'"),
        });
      }
    };
    match accounts.lookup_account(project, provider_type) {
      Some(id) => Ok(id),
      None => {
        error!(
          project,
          provider = provider_type,
          "no account of this provider type registered in project"
        );
        Err(CompileError::ExternalLookupFailure {
          resource: format!("'{provider_type}' account in project '{project}'"),
        })
      }
    }
  }
}

/// Compile an instance into its canonical document.
pub fn compile(entity: &Entity, env: &CompileEnv<'_>) -> Result<Document, CompileError> {
  let entry = catalog::lookup(entity.kind()).ok_or_else(|| CompileError::UnknownKind {
    kind: entity.kind().to_string(),
  })?;
  debug!(kind = entity.kind(), name = entity.name(), "compiling entity");

  let mut doc = Document::new();
  for (field, value) in entity.all_attrs() {
    doc.insert(field, lower(&value, env)?);
  }
  doc.insert("name".to_string(), Json::String(entity.name().to_string()));
  doc.insert(
    "description".to_string(),
    Json::String(entity.description().to_string()),
  );
  doc.insert("kind".to_string(), Json::String(entity.kind().to_string()));

  entry.hooks.post_compile(&mut doc, env)?;
  Ok(doc)
}

fn lower(value: &Value, env: &CompileEnv<'_>) -> Result<Json, CompileError> {
  Ok(match value {
    Value::Null => Json::Null,
    Value::Bool(b) => Json::Bool(*b),
    Value::Int(i) => Json::from(*i),
    Value::Float(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
    Value::Str(s) => Json::String(s.clone()),
    Value::List(items) => Json::Array(
      items
        .iter()
        .map(|item| lower(item, env))
        .collect::<Result<Vec<_>, _>>()?,
    ),
    Value::Map(map) => {
      let mut obj = Document::new();
      for (key, item) in map {
        obj.insert(key.clone(), lower(item, env)?);
      }
      Json::Object(obj)
    }
    Value::Entity(nested) => Json::Object(compile(nested, env)?),
  })
}
