use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use profile::command::{decode_pin_pair, KEY_PIN_CONFIGS};
use profile::resolved::{KEY_CUSTOM_COMMANDS, KEY_PIN_CONFIG_DEFAULT};
use profile::{value, CommandGroup, EntryError, PinConfigGroup, ProfileSet, ResolvedConfiguration, Role};
use serde_json::Value;

/// Identity of the codec to resolve for.
#[derive(Args, Debug, Clone)]
pub struct CodecArgs {
    /// Codec vendor/device id, e.g. 0x10ec0269
    #[arg(long, value_parser = parse_u32)]
    pub vendor_id: u32,
    /// HDA subsystem id
    #[arg(long, value_parser = parse_u32, default_value = "0")]
    pub subsystem_id: u32,
    /// Codec address on the link
    #[arg(long, value_parser = parse_u8, default_value = "0")]
    pub address: u8,
    /// Platform layout id (omit for "unavailable")
    #[arg(long, value_parser = parse_u32)]
    pub layout_id: Option<u32>,
}

pub fn parse_u32(text: &str) -> Result<u32, String> {
    value::parse_integer(text)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| format!("'{text}' is not a 32-bit number"))
}

pub fn parse_u8(text: &str) -> Result<u8, String> {
    value::parse_integer(text)
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| format!("'{text}' is not an 8-bit number"))
}

/// Accepts a profile override key (`PowerHook`) or its kebab-case form (`power-hook`).
pub fn parse_role(text: &str) -> Result<Role> {
    if let Some(role) = Role::from_key(text) {
        return Ok(role);
    }
    let wanted = text.to_ascii_lowercase().replace(['-', '_'], "");
    Role::ALL
        .into_iter()
        .find(|role| role.key().to_ascii_lowercase() == wanted)
        .ok_or_else(|| anyhow::anyhow!("unknown role '{text}' (expected engine, power-hook or probe-init)"))
}

pub fn load(path: &Path) -> Result<ProfileSet> {
    tracing::debug!(path = %path.display(), "loading profiles");
    ProfileSet::from_path(path).with_context(|| format!("Failed to load {}", path.display()))
}

pub fn resolve(path: &Path, codec: &CodecArgs, role: &str) -> Result<()> {
    let role = parse_role(role)?;
    let profiles = load(path)?;
    let config = ResolvedConfiguration::from_profiles(
        &profiles,
        codec.vendor_id,
        codec.subsystem_id,
        role,
        codec.layout_id,
    )
    .context("Failed to resolve configuration")?;

    let matched = config.matched();
    eprintln!(
        "{} vendor {}, subsystem {}, role override {}",
        "matched".cyan().bold(),
        matched.vendor,
        matched.subsystem.as_deref().unwrap_or("-"),
        if matched.role_override { "yes" } else { "no" }
    );
    if config.disabled() {
        eprintln!("{}", "  ⚠ profile sets Disable; the role would not attach".yellow());
    } else if !config.address_enabled(codec.address) {
        eprintln!(
            "{}",
            format!(
                "  ⚠ address {} is masked out by {:#06x}; the role would not attach",
                codec.address,
                config.codec_address_mask()
            )
            .yellow()
        );
    }

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// A profile entry that resolution would skip.
#[derive(Debug)]
pub struct Finding {
    pub location: String,
    pub error: EntryError,
}

/// Walk every object in the document and decode its command and pin lists.
pub fn findings(document: &Value) -> Vec<Finding> {
    let mut found = Vec::new();
    walk(document, String::new(), &mut found);
    found
}

fn walk(node: &Value, path: String, found: &mut Vec<Finding>) {
    let Some(object) = node.as_object() else {
        return;
    };
    for (key, child) in object {
        let here = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}/{key}")
        };
        match key.as_str() {
            KEY_CUSTOM_COMMANDS => check_list(child, &here, CommandGroup::decode, found),
            KEY_PIN_CONFIG_DEFAULT => {
                check_list(child, &here, PinConfigGroup::decode, found);
                check_pin_pairs(child, &here, found);
            }
            _ => walk(child, here, found),
        }
    }
}

fn check_list<T>(
    list: &Value,
    path: &str,
    decode: impl Fn(&Value) -> Result<T, EntryError>,
    found: &mut Vec<Finding>,
) {
    let Some(entries) = list.as_array() else {
        found.push(Finding {
            location: path.to_owned(),
            error: EntryError::NotAnObject,
        });
        return;
    };
    for (index, entry) in entries.iter().enumerate() {
        if let Err(error) = decode(entry) {
            found.push(Finding {
                location: format!("{path}[{index}]"),
                error,
            });
        }
    }
}

// Pairs inside an otherwise valid pin entry are skipped one by one.
fn check_pin_pairs(list: &Value, path: &str, found: &mut Vec<Finding>) {
    let entries = list.as_array().map(Vec::as_slice).unwrap_or_default();
    for (index, entry) in entries.iter().enumerate() {
        let Some(pins) = entry.get(KEY_PIN_CONFIGS).and_then(Value::as_array) else {
            continue;
        };
        if pins.len() % 2 != 0 {
            continue;
        }
        for (pair_index, pair) in pins.chunks_exact(2).enumerate() {
            if let Err(error) = decode_pin_pair(pair_index * 2, pair) {
                found.push(Finding {
                    location: format!("{path}[{index}]/{KEY_PIN_CONFIGS}[{}]", pair_index * 2),
                    error,
                });
            }
        }
    }
}

pub fn lint(path: &Path) -> Result<()> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let document: Value = serde_json::from_str(&text).context("Profile is not valid JSON")?;
    ProfileSet::from_value(document.clone()).context("Profile root is not an object")?;

    let found = findings(&document);
    if found.is_empty() {
        println!("{}", "✓ No skipped entries".green());
        return Ok(());
    }
    for finding in &found {
        println!("  {} {}: {}", "⚠".yellow(), finding.location, finding.error);
    }
    bail!("{} profile entries would be skipped", found.len())
}
