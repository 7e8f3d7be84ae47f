//! Resolved, compiled configuration for one codec and one role.

use std::time::Duration;

use platform::{CodecLock, CommandPort};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::command::{decode_list, CommandGroup, PinConfigGroup, Trigger};
use crate::error::ProfileError;
use crate::role::Role;
use crate::tree::{MatchedKeys, MergedProfile, ProfileSet};
use crate::value;

/// Profile key: refuse to attach to this codec.
pub const KEY_DISABLE: &str = "Disable";
/// Profile key: set EAPD on wake.
pub const KEY_UPDATE_NODES: &str = "Update Nodes";
/// Profile key: clear EAPD on sleep.
pub const KEY_SLEEP_NODES: &str = "Sleep Nodes";
/// Profile key: reset the codec on the engine's own wake path.
pub const KEY_PERFORM_RESET: &str = "Perform Reset";
/// Profile key: reset the codec on the external wake path.
pub const KEY_PERFORM_RESET_ON_EXTERNAL_WAKE: &str = "Perform Reset on External Wake";
/// Profile key: reset and retry once when an EAPD write fails.
pub const KEY_PERFORM_RESET_ON_EAPD_FAIL: &str = "Perform Reset on EAPD Fail";
/// Profile key: delay before EAPD writes and node discovery, in ms.
pub const KEY_SEND_DELAY: &str = "Send Delay";
/// Profile key: enable the polling fallback.
pub const KEY_CHECK_INFINITELY: &str = "Check Infinitely";
/// Profile key: polling period, in ms.
pub const KEY_CHECK_INTERVAL: &str = "Check Interval";
/// Profile key: bitmask of codec addresses the engine attaches to.
pub const KEY_CODEC_ADDRESS_MASK: &str = "Codec Address Mask";
/// Profile key: list of command entries.
pub const KEY_CUSTOM_COMMANDS: &str = "Custom Commands";
/// Profile key: list of pin-config entries.
pub const KEY_PIN_CONFIG_DEFAULT: &str = "PinConfigDefault";

/// Default [`KEY_SEND_DELAY`].
pub const DEFAULT_SEND_DELAY_MS: u16 = 300;
/// Default [`KEY_CHECK_INTERVAL`].
pub const DEFAULT_CHECK_INTERVAL_MS: u16 = 3000;
/// Default [`KEY_CODEC_ADDRESS_MASK`]: every address.
pub const DEFAULT_CODEC_ADDRESS_MASK: u16 = 0xFFFF;

/// The configuration one role runs with.
///
/// Built once per attach and never mutated, so readers need no lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfiguration {
    role: Role,
    disable: bool,
    update_nodes: bool,
    sleep_nodes: bool,
    perform_reset: bool,
    perform_reset_on_external_wake: bool,
    perform_reset_on_eapd_fail: bool,
    send_delay_ms: u16,
    check_infinitely: bool,
    check_interval_ms: u16,
    codec_address_mask: u16,
    command_groups: Vec<CommandGroup>,
    pin_config_groups: Vec<PinConfigGroup>,
    /// Layout id seen at resolution. Group matching reads it live instead.
    layout_id: Option<u32>,
    #[serde(skip)]
    matched: MatchedKeys,
    #[serde(skip)]
    merged: Map<String, Value>,
}

impl ResolvedConfiguration {
    /// Resolve without touching hardware.
    ///
    /// `layout_id` is recorded for diagnostics only.
    pub fn from_profiles(
        profiles: &ProfileSet,
        vendor_id: u32,
        subsystem_id: u32,
        role: Role,
        layout_id: Option<u32>,
    ) -> Result<Self, ProfileError> {
        let merged = profiles.merged(vendor_id, subsystem_id, role)?;
        Ok(Self::from_merged(merged, role, layout_id))
    }

    /// Compile an already merged profile.
    pub fn from_merged(merged: MergedProfile, role: Role, layout_id: Option<u32>) -> Self {
        let MergedProfile { fields, matched } = merged;

        let command_groups = list(&fields, KEY_CUSTOM_COMMANDS)
            .map(|entries| decode_list(entries, "custom command", CommandGroup::decode))
            .unwrap_or_default();
        let pin_config_groups = list(&fields, KEY_PIN_CONFIG_DEFAULT)
            .map(|entries| decode_list(entries, "pin config", PinConfigGroup::decode))
            .unwrap_or_default();

        Self {
            role,
            disable: flag(&fields, KEY_DISABLE, false),
            update_nodes: flag(&fields, KEY_UPDATE_NODES, true),
            sleep_nodes: flag(&fields, KEY_SLEEP_NODES, true),
            perform_reset: flag(&fields, KEY_PERFORM_RESET, true),
            perform_reset_on_external_wake: flag(&fields, KEY_PERFORM_RESET_ON_EXTERNAL_WAKE, true),
            perform_reset_on_eapd_fail: flag(&fields, KEY_PERFORM_RESET_ON_EAPD_FAIL, true),
            send_delay_ms: number16(&fields, KEY_SEND_DELAY, DEFAULT_SEND_DELAY_MS),
            check_infinitely: flag(&fields, KEY_CHECK_INFINITELY, false),
            check_interval_ms: number16(&fields, KEY_CHECK_INTERVAL, DEFAULT_CHECK_INTERVAL_MS),
            codec_address_mask: number16(
                &fields,
                KEY_CODEC_ADDRESS_MASK,
                DEFAULT_CODEC_ADDRESS_MASK,
            ),
            command_groups,
            pin_config_groups,
            layout_id,
            matched,
            merged: fields,
        }
    }

    /// The role this configuration was resolved for.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The profile asks the role not to attach.
    pub fn disabled(&self) -> bool {
        self.disable
    }

    /// Set EAPD on every capable node on wake.
    pub fn update_nodes(&self) -> bool {
        self.update_nodes
    }

    /// Clear EAPD on every capable node on sleep.
    pub fn sleep_nodes(&self) -> bool {
        self.sleep_nodes
    }

    /// Reset the codec on the engine's own wake path.
    pub fn perform_reset(&self) -> bool {
        self.perform_reset
    }

    /// Reset the codec on the external wake path.
    pub fn perform_reset_on_external_wake(&self) -> bool {
        self.perform_reset_on_external_wake
    }

    /// Reset and retry once when an EAPD write fails.
    pub fn perform_reset_on_eapd_fail(&self) -> bool {
        self.perform_reset_on_eapd_fail
    }

    /// Delay before EAPD writes and node discovery.
    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.send_delay_ms))
    }

    /// Polling fallback enabled.
    pub fn check_infinitely(&self) -> bool {
        self.check_infinitely
    }

    /// Polling period.
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.check_interval_ms))
    }

    /// Raw codec address mask.
    pub fn codec_address_mask(&self) -> u16 {
        self.codec_address_mask
    }

    /// Returns `true` if the engine may attach to the codec at `address`.
    pub fn address_enabled(&self, address: u8) -> bool {
        address < 16 && self.codec_address_mask & (1 << address) != 0
    }

    /// Every compiled command group, in profile order.
    pub fn command_groups(&self) -> &[CommandGroup] {
        &self.command_groups
    }

    /// Every compiled pin-config group, in profile order.
    pub fn pin_config_groups(&self) -> &[PinConfigGroup] {
        &self.pin_config_groups
    }

    /// Command groups bound to `trigger` that apply to `layout`.
    pub fn commands_for(
        &self,
        trigger: Trigger,
        layout: Option<u32>,
    ) -> impl Iterator<Item = &CommandGroup> + '_ {
        self.command_groups
            .iter()
            .filter(move |group| group.selected(trigger, layout))
    }

    /// Command groups that apply to `layout`, whatever their trigger flags.
    pub fn commands_for_layout(&self, layout: Option<u32>) -> impl Iterator<Item = &CommandGroup> + '_ {
        self.command_groups
            .iter()
            .filter(move |group| group.layout.matches(layout))
    }

    /// Pin-config groups that apply to `layout`.
    pub fn pin_configs_for(&self, layout: Option<u32>) -> impl Iterator<Item = &PinConfigGroup> + '_ {
        self.pin_config_groups
            .iter()
            .filter(move |group| group.layout.matches(layout))
    }

    /// Layout id observed when this configuration was resolved.
    pub fn layout_id(&self) -> Option<u32> {
        self.layout_id
    }

    /// Which profile entries contributed.
    pub fn matched(&self) -> &MatchedKeys {
        &self.matched
    }

    /// The merged profile tree the fields were read from.
    pub fn merged(&self) -> &Map<String, Value> {
        &self.merged
    }
}

/// Resolve the configuration for the codec behind `port`.
///
/// Identity and layout id are read under `lock`, which may already be held
/// by the caller.
pub fn resolve<P: CommandPort + ?Sized>(
    profiles: &ProfileSet,
    port: &P,
    lock: &CodecLock,
    role: Role,
) -> Result<ResolvedConfiguration, ProfileError> {
    let (vendor_id, subsystem_id, layout_id) = {
        let _guard = lock.lock();
        (port.vendor_id(), port.subsystem_id(), port.layout_id())
    };
    let config =
        ResolvedConfiguration::from_profiles(profiles, vendor_id, subsystem_id, role, layout_id)?;
    tracing::debug!(
        vendor_id = format_args!("{vendor_id:#010x}"),
        subsystem_id = format_args!("{subsystem_id:#010x}"),
        %role,
        commands = config.command_groups.len(),
        pin_configs = config.pin_config_groups.len(),
        "resolved configuration"
    );
    Ok(config)
}

fn list<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a [Value]> {
    match fields.get(key)? {
        Value::Array(entries) => Some(entries.as_slice()),
        _ => {
            tracing::warn!(key, "ignoring non-list value");
            None
        }
    }
}

fn flag(fields: &Map<String, Value>, key: &str, default: bool) -> bool {
    let Some(raw) = fields.get(key) else {
        return default;
    };
    value::boolean(raw).unwrap_or_else(|| {
        tracing::warn!(key, default, "ignoring non-boolean value");
        default
    })
}

fn number16(fields: &Map<String, Value>, key: &str, default: u16) -> u16 {
    let Some(raw) = fields.get(key) else {
        return default;
    };
    value::integer(raw)
        .and_then(|n| u16::try_from(n).ok())
        .unwrap_or_else(|| {
            tracing::warn!(key, default, "ignoring out-of-range value");
            default
        })
}
