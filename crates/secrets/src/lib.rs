//! stencil-secrets: upload-time secret handling.
//!
//! Canonical blueprint documents carry inline secret values (credential
//! passwords, SECRET-typed variables, basic-auth and guest-customization
//! passwords). Before the document leaves the process those values must come
//! out, and after the server returns its stored form they go back in:
//! - `path`: key/index paths into a resources document
//! - `strip`: pull secrets out, recording where each one lived
//! - `restore`: put every recorded secret back, exactly once
//! - `payload`: the upload envelope around a resources document
//!
//! Transport itself is out of scope; this crate only prepares and repairs
//! payloads.

use serde_json::Value as Json;

pub mod path;
pub mod payload;
pub mod restore;
pub mod strip;

/// A blueprint resources document: the `resources` mapping of a compiled
/// blueprint, as handed to and returned by the orchestration API.
pub type Resources = serde_json::Map<String, Json>;
