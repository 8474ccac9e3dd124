//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity matching the table and the
//! insert/update DTOs its repository accepts.

pub mod user;
