//! Peer power observer.
//!
//! Attached to a peer audio object whose power ordinals are a more reliable
//! wake signal on some machines than the engine's own. It owns no hardware
//! state; it forwards every ordinal to the sibling engine's external path.

use std::sync::Arc;

use platform::boot_args::DISABLE_ENGINE_FLAG;
use platform::{CommandPort, ExternalPowerTarget, PeerLocator, PowerOrdinal, PowerRole};
use profile::{resolve, ProfileSet, Role};

use crate::error::AttachError;
use crate::residency::Residency;

/// An attached peer power observer.
pub struct PowerHook {
    target: Arc<dyn ExternalPowerTarget>,
}

impl PowerHook {
    /// Attach to the peer object of the codec behind `port`.
    ///
    /// Fails when the `PowerHook` profile is disabled or no sibling engine
    /// is found.
    pub fn attach(
        residency: &Residency,
        port: &dyn CommandPort,
        profiles: &ProfileSet,
        locator: &dyn PeerLocator,
    ) -> Result<Self, AttachError> {
        if residency.boot_args().engine_disabled() {
            tracing::info!("stopping due to {DISABLE_ENGINE_FLAG} boot flag");
            return Err(AttachError::BootDisabled(DISABLE_ENGINE_FLAG));
        }

        let config = resolve(profiles, port, residency.lock(), Role::PowerHook)?;
        if config.disabled() {
            tracing::info!("no attempt to hook audio device due to codec profile Disable flag");
            return Err(AttachError::Disabled);
        }

        let Some(target) = locator.engine() else {
            tracing::debug!("no sibling engine found");
            return Err(AttachError::NoSiblingEngine);
        };
        Ok(Self { target })
    }

    /// Release the sibling engine.
    pub fn detach(self) {
        tracing::debug!("power hook detached");
    }
}

impl PowerRole for PowerHook {
    fn set_power_state(&self, ordinal: PowerOrdinal) {
        tracing::debug!(?ordinal, "power hook: set power state");
        self.target.set_power_state_external(ordinal);
    }
}

impl core::fmt::Debug for PowerHook {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PowerHook").finish_non_exhaustive()
    }
}
