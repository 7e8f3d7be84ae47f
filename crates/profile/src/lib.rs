//! Codec profile resolution: tree lookup, merge, and compilation.
//!
//! # Modules
//!
//! - [`tree`]: `ProfileSet` document and the vendor/subsystem/role merge
//! - [`resolved`]: `ResolvedConfiguration` and the [`resolve`] entry point
//! - [`command`]: `CommandGroup` / `PinConfigGroup` decoding
//! - [`layout`]: layout-id filters
//! - [`value`]: decimal/hex numeric and boolean decoding
//! - [`role`]: the three driver roles and their override keys

#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]
#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod layout;
pub mod resolved;
pub mod role;
pub mod tree;
pub mod value;

// Top-level re-exports for convenience
pub use command::{CommandGroup, EntryError, PinConfigGroup, Trigger};
pub use error::ProfileError;
pub use layout::LayoutFilter;
pub use resolved::{resolve, ResolvedConfiguration};
pub use role::Role;
pub use tree::{MatchedKeys, MergedProfile, ProfileSet};
