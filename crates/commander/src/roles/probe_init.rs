//! Probe-time initializer.
//!
//! Runs once when the codec is discovered, before any engine attaches:
//! pushes every layout-matching command group (trigger flags are not
//! consulted) and every layout-matching pin default. It never attaches.

use platform::boot_args::DISABLE_PROBE_INIT_FLAG;
use platform::{hda, CommandPort};
use profile::{resolve, ProfileSet, Role};

use crate::error::AttachError;
use crate::residency::Residency;

/// What one probe sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeReport {
    /// Command groups sent.
    pub command_groups: usize,
    /// Pin configurations written.
    pub pin_configs: usize,
}

/// The probe-time initializer role.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeInit;

impl ProbeInit {
    /// Initialise the codec behind `port` from its `ProbeInit` profile.
    ///
    /// The whole sequence holds the codec lock. Returns an error, having sent
    /// nothing, when the port does not initialise, the platform has no layout
    /// id, or no enabled profile matches.
    pub fn run(
        residency: &Residency,
        port: &dyn CommandPort,
        profiles: &ProfileSet,
    ) -> Result<ProbeReport, AttachError> {
        if residency.boot_args().probe_init_disabled() {
            tracing::info!("probe init stopping due to {DISABLE_PROBE_INIT_FLAG} boot flag");
            return Err(AttachError::BootDisabled(DISABLE_PROBE_INIT_FLAG));
        }

        let _guard = residency.lock().lock();
        tracing::debug!(
            vendor_id = format_args!("{:#010x}", port.vendor_id()),
            "probe init (pre-init)"
        );
        if !port.initialize() {
            tracing::warn!("probe init: codec port failed to initialize");
            return Err(AttachError::InitializeFailed);
        }
        let Some(layout_id) = port.layout_id() else {
            return Err(AttachError::NoLayout);
        };

        let config = resolve(profiles, port, residency.lock(), Role::ProbeInit)?;
        if config.disabled() {
            return Err(AttachError::Disabled);
        }

        let mut report = ProbeReport::default();
        for group in config.commands_for_layout(Some(layout_id)) {
            for &verb in &group.verbs {
                tracing::trace!(verb = format_args!("{verb:#010x}"), "custom probe command");
                if let Err(err) = port.send_command(verb) {
                    tracing::warn!("probe command failed: {err}");
                }
            }
            report.command_groups += 1;
        }

        for group in config.pin_configs_for(Some(layout_id)) {
            for &(node, pin_config) in &group.pairs {
                tracing::trace!(
                    node = format_args!("{node:#04x}"),
                    config = format_args!("{pin_config:#010x}"),
                    "custom pin config"
                );
                for command in hda::config_default_commands(node, pin_config) {
                    if let Err(err) = port.send_command(command) {
                        tracing::warn!("pin config write failed: {err}");
                    }
                }
                report.pin_configs += 1;
            }
        }

        let vendor_id = port.vendor_id();
        if report.command_groups > 0 {
            tracing::info!(
                vendor_id = format_args!("{vendor_id:#010x}"),
                "probe init sent {} command(s)",
                report.command_groups
            );
        }
        if report.pin_configs > 0 {
            tracing::info!(
                vendor_id = format_args!("{vendor_id:#010x}"),
                "probe init set {} pinconfig(s)",
                report.pin_configs
            );
        }
        Ok(report)
    }
}
