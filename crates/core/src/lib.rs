//! Pure domain logic for the tutorlane marketplace.
//!
//! This crate has zero internal dependencies so the rules it encodes (the
//! session state machine, the entitlement authorization predicate, the
//! availability window math, hire transitions, rating aggregation) can be
//! used by the repository layer, the API layer, and any future CLI tooling
//! without dragging in sqlx or axum.

pub mod availability;
pub mod entitlement;
pub mod error;
pub mod hire;
pub mod rating;
pub mod session;
pub mod types;
