//! Module residency: the state that lives from module load to unload.
//!
//! Loading the module allocates the one shared [`CodecLock`] and parses the
//! boot-argument switches; every role attaches against a `&Residency`.
//! Unloading drops it. Allocation failure aborts the process, which takes
//! the whole module down with it.

use platform::{BootArgs, CodecLock};

use crate::properties::{Properties, MODULE_BUILD, MODULE_VERSION};

/// Process-wide module state.
#[derive(Debug)]
pub struct Residency {
    lock: CodecLock,
    boot_args: BootArgs,
    properties: Properties,
}

impl Residency {
    /// Load the module with the given boot arguments.
    pub fn load(boot_args: BootArgs) -> Self {
        let mut properties = Properties::new();
        properties.set_text(MODULE_VERSION, version_string());
        properties.set_text(MODULE_BUILD, build_string());
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            "{} starting",
            env!("CARGO_PKG_NAME")
        );
        Self {
            lock: CodecLock::new(),
            boot_args,
            properties,
        }
    }

    /// The shared codec lock.
    pub fn lock(&self) -> &CodecLock {
        &self.lock
    }

    /// Boot-time disable switches.
    pub fn boot_args(&self) -> &BootArgs {
        &self.boot_args
    }

    /// `RM,Version` / `RM,Build`.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

fn version_string() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn build_string() -> String {
    let builder = option_env!("LOGNAME").unwrap_or("unknown");
    if cfg!(debug_assertions) {
        format!("Debug-{builder}")
    } else {
        format!("Release-{builder}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_properties() {
        let residency = Residency::load(BootArgs::default());
        let version = residency.properties().text(MODULE_VERSION).unwrap_or_default();
        assert!(version.starts_with("commander "));
        let build = residency.properties().text(MODULE_BUILD).unwrap_or_default();
        if cfg!(debug_assertions) {
            assert!(build.starts_with("Debug-"));
        } else {
            assert!(build.starts_with("Release-"));
        }
    }

    #[test]
    fn test_lock_is_shared_by_handle() {
        let residency = Residency::load(BootArgs::parse("-v -ccpioff"));
        let handle = residency.lock().clone();
        assert!(handle.same_lock(residency.lock()));
        assert!(residency.boot_args().probe_init_disabled());
        assert!(!residency.boot_args().engine_disabled());
    }
}
