//! Reset-and-retry-once when an EAPD write fails.

#![allow(clippy::unwrap_used)]

mod common;

use std::collections::BTreeMap;

use common::{codec, profiles, Rig};
use platform::{hda, PowerOrdinal, PowerRole};
use serde_json::{json, Value};

const NODES: [u8; 4] = [0x14, 0x15, 0x17, 0x1B];

// Wake handled by the internal path, without its own wake-time reset.
fn retry_profile(reset_on_fail: bool) -> Value {
    json!({
        "Send Delay": 0,
        "Perform Reset": false,
        "Perform Reset on External Wake": false,
        "Perform Reset on EAPD Fail": reset_on_fail,
    })
}

fn writes_per_node(rig: &Rig) -> BTreeMap<u8, usize> {
    let mut per_node = BTreeMap::new();
    for (node, _) in rig.eapd_writes() {
        *per_node.entry(node).or_insert(0) += 1;
    }
    per_node
}

/// Attach and go through one clean wake/sleep cycle so cold boot is over.
fn warm_rig(reset_on_fail: bool) -> (Rig, commander::EngineRole) {
    let rig = Rig::new(codec(&NODES));
    let role = rig.attach(&profiles(retry_profile(reset_on_fail)));
    role.set_power_state(PowerOrdinal::Normal);
    role.set_power_state(PowerOrdinal::Sleep);
    rig.codec.clear_events();
    (rig, role)
}

#[test]
fn test_wake_failure_on_every_node_resets_once_and_retries_each_node_once() {
    let (rig, role) = warm_rig(true);
    rig.codec.fail_verb(hda::VERB_SET_EAPD_BTL, Some(NODES.len()));

    role.set_power_state(PowerOrdinal::Normal);

    assert_eq!(rig.codec.reset_count(), 1);
    assert_eq!(rig.sent(hda::VERB_SET_EAPD_BTL), 2 * NODES.len());
    assert!(writes_per_node(&rig).values().all(|&count| count == 2));
    assert!(rig
        .eapd_writes()
        .iter()
        .all(|&(_, payload)| payload == hda::EAPD_HIGH));
    assert!(!role.engine().state().eapd_powered_down);
}

#[test]
fn test_sleep_failure_resets_once_and_retries_each_node_once() {
    let (rig, role) = warm_rig(true);
    role.set_power_state(PowerOrdinal::Normal);
    rig.codec.clear_events();
    rig.codec.fail_verb(hda::VERB_SET_EAPD_BTL, Some(NODES.len()));

    role.set_power_state(PowerOrdinal::Sleep);

    assert_eq!(rig.codec.reset_count(), 1);
    assert_eq!(rig.sent(hda::VERB_SET_EAPD_BTL), 2 * NODES.len());
    assert!(rig
        .eapd_writes()
        .iter()
        .all(|&(_, payload)| payload == hda::EAPD_LOW));
}

#[test]
fn test_single_node_failure_retries_every_node() {
    let (rig, role) = warm_rig(true);
    rig.codec.fail_verb(hda::VERB_SET_EAPD_BTL, Some(1));

    role.set_power_state(PowerOrdinal::Normal);

    assert_eq!(rig.codec.reset_count(), 1);
    assert_eq!(rig.sent(hda::VERB_SET_EAPD_BTL), 2 * NODES.len());
}

#[test]
fn test_retry_result_is_not_checked() {
    let (rig, role) = warm_rig(true);
    rig.codec.fail_verb(hda::VERB_SET_EAPD_BTL, None);

    role.set_power_state(PowerOrdinal::Normal);

    assert_eq!(rig.codec.reset_count(), 1);
    assert_eq!(rig.sent(hda::VERB_SET_EAPD_BTL), 2 * NODES.len());
    assert!(!role.engine().state().eapd_powered_down);
}

#[test]
fn test_no_reset_when_disabled() {
    let (rig, role) = warm_rig(false);
    rig.codec.fail_verb(hda::VERB_SET_EAPD_BTL, Some(NODES.len()));

    role.set_power_state(PowerOrdinal::Normal);

    assert_eq!(rig.codec.reset_count(), 0);
    assert_eq!(rig.sent(hda::VERB_SET_EAPD_BTL), NODES.len());
}

#[test]
fn test_cold_boot_retry_skips_reset() {
    let rig = Rig::new(codec(&NODES));
    let role = rig.attach(&profiles(retry_profile(true)));
    rig.codec.fail_verb(hda::VERB_SET_EAPD_BTL, Some(NODES.len()));

    role.set_power_state(PowerOrdinal::Normal);

    // Reset is a no-op before the first sleep; the retry still happens.
    assert_eq!(rig.codec.reset_count(), 0);
    assert_eq!(rig.sent(hda::VERB_SET_EAPD_BTL), 2 * NODES.len());
}
