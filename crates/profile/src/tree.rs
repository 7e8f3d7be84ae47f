//! Profile tree lookup and merge.
//!
//! A profile document is a two-level tree keyed by codec identity:
//!
//! ```text
//! {
//!   "Default":   { <fields>, "Default": { <fields> }, ... },   // wildcard vendor
//!   "10ec_0269": {                                              // vendor_device
//!     <fields>,
//!     "17aa2233": { <fields> },                                 // subsystem id
//!     "Default":  { <fields> },                                 // wildcard subsystem
//!     "Engine":   { <fields> }                                  // role override
//!   }
//! }
//! ```
//!
//! Merging is a shallow per-key replace: a key at a more specific level
//! replaces the same key at a less specific one, lists included. Precedence,
//! lowest to highest: wildcard vendor, vendor, subsystem, role override.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::ProfileError;
use crate::role::Role;

/// Key of the wildcard entry at both vendor and subsystem level.
pub const WILDCARD_KEY: &str = "Default";

/// Vendor-level key for a codec vendor id: `vvvv_dddd` in lower-case hex.
pub fn vendor_key(vendor_id: u32) -> String {
    format!("{:04x}_{:04x}", vendor_id >> 16, vendor_id & 0xFFFF)
}

/// Subsystem-level key for an HDA subsystem id: `ssssssss` in lower-case hex.
pub fn subsystem_key(subsystem_id: u32) -> String {
    format!("{subsystem_id:08x}")
}

/// Which entries a merge drew from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedKeys {
    /// The vendor-level key that matched (the codec's own key or the wildcard).
    pub vendor: String,
    /// The subsystem-level key that matched, if any.
    pub subsystem: Option<String>,
    /// Whether a role override was applied.
    pub role_override: bool,
}

/// A fully merged profile for one codec and one role.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedProfile {
    /// The merged key/value map.
    pub fields: Map<String, Value>,
    /// Where the fields came from.
    pub matched: MatchedKeys,
}

/// A loaded profile document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSet {
    root: Map<String, Value>,
}

impl ProfileSet {
    /// A document with no profiles; every lookup fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap an already-parsed document.
    pub fn from_value(value: Value) -> Result<Self, ProfileError> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(ProfileError::RootNotObject),
        }
    }

    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ProfileError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON document from disk.
    pub fn from_path(path: &Path) -> Result<Self, ProfileError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Number of vendor-level entries, wildcard included.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Returns `true` if the document holds no entries.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Select and merge the profile for a codec and role.
    ///
    /// Fails only when neither the codec's vendor key nor the wildcard key
    /// is present.
    pub fn merged(
        &self,
        vendor_id: u32,
        subsystem_id: u32,
        role: Role,
    ) -> Result<MergedProfile, ProfileError> {
        let own_key = vendor_key(vendor_id);
        let wildcard = object(&self.root, WILDCARD_KEY);

        let (vendor_name, vendor) = match object(&self.root, &own_key) {
            Some(entry) => (own_key, entry),
            None => match wildcard {
                Some(entry) => (WILDCARD_KEY.to_owned(), entry),
                None => return Err(ProfileError::NoProfile { vendor_id }),
            },
        };

        let mut fields = Map::new();
        if vendor_name != WILDCARD_KEY {
            if let Some(base) = wildcard {
                overlay(&mut fields, base);
            }
        }
        overlay(&mut fields, vendor);

        let own_subsystem = subsystem_key(subsystem_id);
        let subsystem = match object(vendor, &own_subsystem) {
            Some(entry) => Some((own_subsystem, entry)),
            None => object(vendor, WILDCARD_KEY).map(|entry| (WILDCARD_KEY.to_owned(), entry)),
        };
        if let Some((_, entry)) = subsystem {
            overlay(&mut fields, entry);
        }

        let role_override = object(&fields, role.key()).cloned();
        if let Some(entry) = &role_override {
            overlay(&mut fields, entry);
        }

        tracing::debug!(
            vendor = %vendor_name,
            subsystem = subsystem.as_ref().map_or("-", |(key, _)| key.as_str()),
            role = role.key(),
            "merged codec profile"
        );

        Ok(MergedProfile {
            fields,
            matched: MatchedKeys {
                vendor: vendor_name,
                subsystem: subsystem.map(|(key, _)| key),
                role_override: role_override.is_some(),
            },
        })
    }
}

fn object<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

fn overlay(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}
