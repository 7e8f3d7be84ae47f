//! Hardware Abstraction Layer (HAL) for the codec power engine
//!
//! This crate provides trait-based abstractions for everything the engine
//! touches outside itself, enabling development and testing without a codec.
//!
//! # Architecture Layers
//!
//! ```text
//! Driver roles (commander crate: engine, power hook, probe init)
//!         ↓
//! Profile resolution (profile crate)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! HD Audio transport (provided by the host platform)
//! ```
//!
//! # Abstractions
//!
//! - [`CommandPort`] - single-verb access to one codec
//! - [`CodecLock`] - the process-wide reentrant lock serialising all ports
//! - [`AudioDevicePower`] - power state of the peer audio device
//! - [`PeerLocator`] - lookup of the peer device and sibling engine
//! - [`PollTimer`] / [`TimerFactory`] - one-shot timers on a private work loop
//! - [`BootArgs`] - boot-time disable switches
//!
//! # Features
//!
//! - `mocks`: recording mock implementations for tests in dependent crates
//!
//! # Example
//!
//! ```no_run
//! use platform::{hda, CodecLock, CommandPort};
//!
//! fn enable_eapd<P: CommandPort>(port: &P, lock: &CodecLock, node: u8) {
//!     let _guard = lock.lock();
//!     let _ = port.send_verb(node, hda::VERB_SET_EAPD_BTL, hda::EAPD_HIGH);
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)] // prefer tracing over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex verbs and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod boot_args;
pub mod hda;
pub mod locator;
pub mod lock;
pub mod mocks;
pub mod port;
pub mod power;
pub mod timer;

// Re-export main high-level traits
pub use locator::{NoPeers, PeerLocator};
pub use port::{CodecIdentity, CommandPort, TransportError};
pub use power::{AudioDevicePower, ExternalPowerTarget, PowerObservation, PowerOrdinal, PowerRole};

// Re-export synchronisation and timer types
pub use lock::{CodecLock, CodecLockGuard};
pub use timer::{PollTimer, TimerAction, TimerError, TimerFactory, WorkLoop, WorkLoopTimer};

pub use boot_args::BootArgs;
