//! Tutorlane event bus and notification infrastructure.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] — the canonical domain event envelope.
//! - [`delivery`] — the outbound email channel. Delivery is fire-and-forget:
//!   a failed send is logged and never fails the operation that published
//!   the event.

pub mod bus;
pub mod delivery;

pub use bus::{EventBus, PlatformEvent};
pub use delivery::email::{EmailConfig, EmailDelivery};
