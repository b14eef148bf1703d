//! stencil-core: schema-driven entity machinery.
//!
//! This crate provides the generic half of the blueprint SDK:
//! - `schema`: field validators, entity schemas and schema composition
//! - `catalog`: the process-wide kind registry with per-type hooks
//! - `entity`: validated entity declaration and the immutable instance
//! - `compile`/`decompile`: the bidirectional canonical-document mapper
//! - `codec`: JSON and structured text encodings of canonical documents

pub mod catalog;
pub mod codec;
pub mod compile;
pub mod decompile;
pub mod entity;
pub mod schema;
pub mod value;
