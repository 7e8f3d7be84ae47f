//! Codec EAPD power-transition engine and its driver roles.
//!
//! # Modules
//!
//! - [`engine`]: `PowerTransitionEngine`, the sleep/wake state machine
//! - [`eapd`]: EAPD-capable node discovery and EAPD/BTL writes
//! - [`roles`]: engine role, peer power observer, probe-time initializer
//! - [`residency`]: module-lifetime state: the shared codec lock
//! - [`properties`]: diagnostic key/value properties
//!
//! # Lifecycle
//!
//! ```text
//! Residency::load ──► ProbeInit::run            (once per codec, optional)
//!                 ──► EngineRole::attach ──► set_power_state* ──► detach
//!                 ──► PowerHook::attach  ──► set_power_state* ──► detach
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]
#![warn(missing_docs)]

pub mod eapd;
pub mod engine;
pub mod error;
pub mod properties;
pub mod residency;
pub mod roles;

// Top-level re-exports for convenience
pub use eapd::EapdNodes;
pub use engine::{EngineState, PowerTransitionEngine, COLD_BOOT_POLL_DELAY, WAKE_POLL_DELAY};
pub use error::AttachError;
pub use properties::{Properties, PropertyValue};
pub use residency::Residency;
pub use roles::{EngineRole, PowerHook, ProbeInit, ProbeReport};
