//! The three driver roles.
//!
//! Each role resolves the same profile under its own role key and differs
//! only in what it does with it:
//!
//! - [`EngineRole`] attaches a [`crate::PowerTransitionEngine`] to the codec
//! - [`PowerHook`] forwards its own power ordinals to a sibling engine
//! - [`ProbeInit`] pushes pin defaults and commands once, then goes away

pub mod engine;
pub mod power_hook;
pub mod probe_init;

pub use engine::EngineRole;
pub use power_hook::PowerHook;
pub use probe_init::{ProbeInit, ProbeReport};
