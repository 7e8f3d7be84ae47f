use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use commander::{EngineRole, ProbeInit, Residency};
use platform::hda::{self, DecodedVerb};
use platform::mocks::{ManualTimerFactory, MockCodec, MockEvent};
use platform::{BootArgs, CommandPort, NoPeers, PeerLocator, PowerOrdinal, PowerRole};

use crate::profile_tools::{self, CodecArgs};

/// Widgets the simulated codec enumerates.
const FIRST_NODE: u8 = 0x02;
const NODE_COUNT: u8 = 0x24;

pub fn run(path: &Path, args: &CodecArgs, eapd: &[u8], cycles: usize) -> Result<()> {
    let profiles = profile_tools::load(path)?;
    let codec = Arc::new(
        MockCodec::new(args.vendor_id)
            .with_subsystem_id(args.subsystem_id)
            .with_address(args.address)
            .with_layout_id(args.layout_id)
            .with_nodes(FIRST_NODE, NODE_COUNT)
            .with_eapd_nodes(eapd),
    );
    let residency = Residency::load(BootArgs::default());

    println!();
    println!("{}", "🔌 Probe init".cyan().bold());
    match ProbeInit::run(&residency, codec.as_ref(), &profiles) {
        Ok(report) => println!(
            "  {} command group(s), {} pin config(s)",
            report.command_groups, report.pin_configs
        ),
        Err(err) => println!("  {}", format!("skipped: {err}").yellow()),
    }
    print_events(&codec);

    println!("{}", "🔌 Engine attach".cyan().bold());
    let timers = ManualTimerFactory::new();
    let role = EngineRole::attach(
        &residency,
        Arc::clone(&codec) as Arc<dyn CommandPort>,
        &profiles,
        Arc::new(NoPeers) as Arc<dyn PeerLocator>,
        &timers,
    )
    .context("Engine did not attach")?;
    println!("  EAPD nodes: {:02x?}", role.engine().nodes().as_slice());
    print_events(&codec);

    let mut steps = vec![PowerOrdinal::Normal];
    for _ in 0..cycles {
        steps.extend([PowerOrdinal::Sleep, PowerOrdinal::Normal]);
    }
    for ordinal in steps {
        println!("{}", format!("⚡ {ordinal:?}").cyan().bold());
        role.set_power_state(ordinal);
        print_events(&codec);
    }

    role.detach();
    println!("{}", "✓ Simulation complete".green().bold());
    println!();
    Ok(())
}

fn print_events(codec: &MockCodec) {
    for event in codec.events() {
        match event {
            MockEvent::Command(command) => {
                let verb = DecodedVerb::decode(command);
                let label = match verb.verb {
                    hda::VERB_SET_EAPD_BTL => "set EAPD",
                    hda::VERB_GET_PARAM => "get param",
                    v if hda::VERB_SET_CONFIG_DEFAULT_BYTES.contains(&v) => "config default",
                    _ => "",
                };
                println!(
                    "    {command:08x}  node {:02x} verb {:03x} payload {:02x}  {}",
                    verb.node,
                    verb.verb,
                    verb.payload,
                    label.dimmed()
                );
            }
            MockEvent::Reset => println!("    {}", "codec reset".magenta()),
            MockEvent::TimingCompensation => println!("    {}", "timing compensation".dimmed()),
        }
    }
    codec.clear_events();
}
