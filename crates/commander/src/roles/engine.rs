//! Engine role: attach, publish diagnostics, run the engine, detach.

use std::sync::Arc;

use platform::boot_args::DISABLE_ENGINE_FLAG;
use platform::{CommandPort, PeerLocator, PowerOrdinal, PowerRole, TimerFactory};
use profile::{resolve, ProfileSet, Role, Trigger};

use crate::eapd::EapdNodes;
use crate::engine::PowerTransitionEngine;
use crate::error::AttachError;
use crate::properties::{
    Properties, CODEC_ADDRESS, CODEC_FUNCTION_GROUP_TYPE, CODEC_LAYOUT_ID, CODEC_VENDOR_ID,
    MERGED_PROFILE,
};
use crate::residency::Residency;

/// An attached engine role.
#[derive(Debug)]
pub struct EngineRole {
    engine: Arc<PowerTransitionEngine>,
    properties: Properties,
}

impl EngineRole {
    /// Attach to the codec behind `port`.
    ///
    /// Initialises the port, resolves the `Engine` profile, discovers EAPD
    /// nodes, runs `On Init` commands, and creates the poll timer when
    /// polling is enabled. Everything up to the timer happens under the
    /// codec lock.
    pub fn attach(
        residency: &Residency,
        port: Arc<dyn CommandPort>,
        profiles: &ProfileSet,
        locator: Arc<dyn PeerLocator>,
        timers: &dyn TimerFactory,
    ) -> Result<Self, AttachError> {
        if residency.boot_args().engine_disabled() {
            tracing::info!("stopping due to {DISABLE_ENGINE_FLAG} boot flag");
            return Err(AttachError::BootDisabled(DISABLE_ENGINE_FLAG));
        }

        let lock = residency.lock().clone();
        let guard = lock.lock();

        if !port.initialize() {
            tracing::warn!("error initializing codec port");
            return Err(AttachError::InitializeFailed);
        }

        let identity = port.identity();
        let mut properties = Properties::new();
        properties.set_number(CODEC_VENDOR_ID, identity.vendor_id);
        properties.set_number(CODEC_ADDRESS, u32::from(identity.address));
        properties.set_number(CODEC_FUNCTION_GROUP_TYPE, u32::from(identity.function_group_type));

        let config = resolve(profiles, port.as_ref(), &lock, Role::Engine)?;
        if config.disabled() {
            tracing::info!("stopping due to codec profile Disable flag");
            return Err(AttachError::Disabled);
        }
        if !config.address_enabled(identity.address) {
            tracing::info!(
                address = identity.address,
                "stopping due to codec profile address mask"
            );
            return Err(AttachError::AddressMasked {
                address: identity.address,
                mask: config.codec_address_mask(),
            });
        }
        if let Some(layout_id) = config.layout_id() {
            properties.set_number(CODEC_LAYOUT_ID, layout_id);
        }
        if cfg!(debug_assertions) {
            properties.set_tree(MERGED_PROFILE, config.merged().clone().into());
        }

        let nodes = if config.update_nodes() {
            // The codec needs a moment before it answers immediate verbs.
            std::thread::sleep(config.send_delay());
            EapdNodes::discover(port.as_ref())
        } else {
            EapdNodes::none()
        };

        let engine = PowerTransitionEngine::new(port, lock.clone(), config, nodes, locator);
        engine.run_command_groups(Trigger::Init);
        drop(guard);

        engine.start_polling(timers)?;

        tracing::debug!(
            vendor_id = format_args!("{:#010x}", identity.vendor_id),
            nodes = engine.nodes().len(),
            "engine attached"
        );
        Ok(Self { engine, properties })
    }

    /// The running engine, for the peer locator to hand to a power hook.
    pub fn engine(&self) -> &Arc<PowerTransitionEngine> {
        &self.engine
    }

    /// Diagnostic properties published at attach.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Stop polling and release the engine.
    ///
    /// Must be called without the codec lock held.
    pub fn detach(self) {
        tracing::debug!("stopping engine");
        self.engine.shutdown();
    }
}

impl PowerRole for EngineRole {
    fn set_power_state(&self, ordinal: PowerOrdinal) {
        self.engine.apply_power_ordinal(ordinal);
    }
}
