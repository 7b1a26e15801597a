//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` create/update DTOs for the API layer
//! - Read-model structs assembled by the repositories from explicit queries

pub mod availability;
pub mod entitlement;
pub mod hire;
pub mod review;
pub mod session;
pub mod student;
pub mod tutor;
pub mod user;
