//! Probe-time initializer: layout-filtered commands and pin defaults.

#![allow(clippy::unwrap_used)]

mod common;

use commander::{AttachError, ProbeInit, ProbeReport, Residency};
use common::{codec, profiles};
use platform::hda::{self, DecodedVerb};
use platform::mocks::MockCodec;
use platform::BootArgs;
use profile::ProfileSet;
use serde_json::json;

fn run(codec: &MockCodec, profiles: &ProfileSet) -> Result<ProbeReport, AttachError> {
    ProbeInit::run(&Residency::load(BootArgs::default()), codec, profiles)
}

#[test]
fn test_sends_every_layout_matching_group_regardless_of_triggers() {
    let codec = codec(&[]);
    let report = run(
        &codec,
        &profiles(json!({
            "Custom Commands": [
                { "Command": [0x0205_0010, 0x0204_0C20] },
                { "Command": 0x0147_0701, "On Wake": true },
                { "Command": 0x0147_0700, "On Sleep": true, "LayoutID": 3 },
                { "Command": 0x0157_0700, "LayoutID": 12 },
            ]
        })),
    )
    .unwrap();

    assert_eq!(report, ProbeReport { command_groups: 3, pin_configs: 0 });
    assert_eq!(
        codec.commands(),
        vec![0x0205_0010, 0x0204_0C20, 0x0147_0701, 0x0147_0700]
    );
}

#[test]
fn test_pin_pairs_become_config_default_writes() {
    let codec = codec(&[]).with_layout_id(Some(28));
    let report = run(
        &codec,
        &profiles(json!({
            "PinConfigDefault": [
                { "LayoutID": 28, "PinConfigs": [0x12, "0x90A60130", 0x14, 0x9017_0110u32] },
                { "LayoutID": 3, "PinConfigs": [0x18, 0x0121_1020] },
            ]
        })),
    )
    .unwrap();

    assert_eq!(report, ProbeReport { command_groups: 0, pin_configs: 2 });
    let mut expected = hda::config_default_commands(0x12, 0x90A6_0130).to_vec();
    expected.extend(hda::config_default_commands(0x14, 0x9017_0110));
    assert_eq!(codec.commands(), expected);

    let bytes: Vec<(u16, u8)> = codec
        .commands()
        .into_iter()
        .take(4)
        .map(DecodedVerb::decode)
        .map(|verb| (verb.verb, verb.payload))
        .collect();
    assert_eq!(
        bytes,
        vec![(0x71C, 0x30), (0x71D, 0x01), (0x71E, 0xA6), (0x71F, 0x90)]
    );
}

#[test]
fn test_commands_go_out_before_pin_defaults() {
    let codec = codec(&[]);
    run(
        &codec,
        &profiles(json!({
            "PinConfigDefault": [{ "PinConfigs": [0x14, 0x9017_0110u32] }],
            "Custom Commands": [{ "Command": 0x0205_0010 }],
        })),
    )
    .unwrap();
    let sent = codec.commands();
    assert_eq!(sent.len(), 5);
    assert_eq!(sent[0], 0x0205_0010);
}

#[test]
fn test_odd_pin_list_is_skipped() {
    let codec = codec(&[]);
    let report = run(
        &codec,
        &profiles(json!({
            "PinConfigDefault": [
                { "PinConfigs": [0x12, 0x90A6_0130u32, 0x14] },
                { "PinConfigs": [0x18, 0x0121_1020] },
            ]
        })),
    )
    .unwrap();
    assert_eq!(report.pin_configs, 1);
    assert_eq!(codec.commands(), hda::config_default_commands(0x18, 0x0121_1020).to_vec());
}

#[test]
fn test_no_layout_sends_nothing() {
    let codec = codec(&[]).with_layout_id(None);
    let err = run(
        &codec,
        &profiles(json!({ "Custom Commands": [{ "Command": 0x0205_0010 }] })),
    )
    .unwrap_err();
    assert!(matches!(err, AttachError::NoLayout));
    assert!(codec.commands().is_empty());
}

#[test]
fn test_initialize_failure_sends_nothing() {
    let codec = codec(&[]).failing_initialize();
    let err = run(
        &codec,
        &profiles(json!({ "Custom Commands": [{ "Command": 0x0205_0010 }] })),
    )
    .unwrap_err();
    assert!(matches!(err, AttachError::InitializeFailed));
    assert!(codec.commands().is_empty());
}

#[test]
fn test_role_override_disables_probe_only() {
    let codec = codec(&[]);
    let err = run(
        &codec,
        &profiles(json!({
            "Custom Commands": [{ "Command": 0x0205_0010 }],
            "ProbeInit": { "Disable": true },
        })),
    )
    .unwrap_err();
    assert!(matches!(err, AttachError::Disabled));
    assert!(codec.commands().is_empty());
}

#[test]
fn test_boot_flag_skips_probe() {
    let codec = codec(&[]);
    let residency = Residency::load(BootArgs::parse("-v -ccpioff"));
    let err = ProbeInit::run(
        &residency,
        &codec,
        &profiles(json!({ "Custom Commands": [{ "Command": 0x0205_0010 }] })),
    )
    .unwrap_err();
    assert!(matches!(err, AttachError::BootDisabled("-ccpioff")));
    assert!(!codec.is_initialized());
}

#[test]
fn test_failed_command_does_not_stop_probe() {
    let codec = codec(&[]);
    codec.fail_verb(0x500, Some(1));
    let report = run(
        &codec,
        &profiles(json!({
            "Custom Commands": [
                { "Command": 0x0205_0010 },
                { "Command": 0x0204_0C20 },
            ]
        })),
    )
    .unwrap();
    assert_eq!(report.command_groups, 2);
    assert_eq!(codec.commands().len(), 2);
}

#[test]
fn test_bad_pin_pair_does_not_drop_its_group() {
    let codec = codec(&[]);
    let report = run(
        &codec,
        &profiles(json!({
            "PinConfigDefault": [{ "PinConfigs": [0x1FF, 0x10, 0x18, 0x0121_1020] }]
        })),
    )
    .unwrap();
    assert_eq!(report.pin_configs, 1);
    assert_eq!(codec.commands(), hda::config_default_commands(0x18, 0x0121_1020).to_vec());
}
